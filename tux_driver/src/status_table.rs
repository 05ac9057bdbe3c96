//! Runtime status table.
//!
//! One entry per catalogue status, holding the current value and the time of
//! its last update. Writes go through [`StatusTable::set`], which applies the
//! entry's event threshold and returns the state line to publish when an
//! event fires. Publishing is left to the caller so that no callback runs
//! while the table is locked.

use std::fmt::Write;
use tux_common::error::{TuxError, TuxResult};
use tux_common::status::{CATALOGUE, STATUS_COUNT, StatusId, StatusSpec, StatusValue};

/// One runtime status entry.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    spec: &'static StatusSpec,
    value: StatusValue,
    lu_time: f64,
}

impl StatusEntry {
    /// Catalogue entry.
    pub fn spec(&self) -> &'static StatusSpec {
        self.spec
    }

    /// Current value.
    pub fn value(&self) -> &StatusValue {
        &self.value
    }

    /// Time of the last update, in seconds.
    pub fn last_update(&self) -> f64 {
        self.lu_time
    }

    fn state_line(&self, now: f64) -> String {
        format!(
            "{}:{}:{}:{:.3}",
            self.spec.name,
            self.spec.kind().name(),
            self.value,
            now - self.lu_time
        )
    }

    fn passes_threshold(&self, value: &StatusValue) -> bool {
        let threshold = self.spec.threshold;
        match (&self.value, value) {
            (StatusValue::Float(old), StatusValue::Float(new)) => {
                f64::from((old - new).abs()) * 1000.0 >= f64::from(threshold)
            }
            (StatusValue::Str(old), StatusValue::Str(new)) => threshold != 0 && old != new,
            (old, new) => match (old.as_int(), new.as_int()) {
                (Some(a), Some(b)) => (a - b).unsigned_abs() >= u64::from(threshold),
                _ => true,
            },
        }
    }
}

/// Table of every status, indexed by [`StatusId`].
#[derive(Debug, Clone)]
pub struct StatusTable {
    entries: Vec<StatusEntry>,
}

impl StatusTable {
    /// Table holding the catalogue's initial values, stamped at `now`.
    pub fn new(now: f64) -> Self {
        Self {
            entries: CATALOGUE
                .iter()
                .map(|spec| StatusEntry {
                    spec,
                    value: spec.initial.to_value(),
                    lu_time: now,
                })
                .collect(),
        }
    }

    /// Restore the initial values.
    pub fn reset(&mut self, now: f64) {
        *self = Self::new(now);
    }

    /// Entry of a status.
    #[inline]
    pub fn entry(&self, id: StatusId) -> &StatusEntry {
        &self.entries[id.index()]
    }

    /// Current value of a status.
    #[inline]
    pub fn get(&self, id: StatusId) -> &StatusValue {
        &self.entries[id.index()].value
    }

    /// Write a status.
    ///
    /// Without `event` the value is stored unconditionally. With `event` it
    /// is stored only when it passes the entry's threshold, and the state
    /// line to publish is returned. The update time is refreshed in both
    /// cases, after the state line was rendered.
    pub fn set(
        &mut self,
        id: StatusId,
        value: StatusValue,
        now: f64,
        event: bool,
    ) -> Option<String> {
        let entry = &mut self.entries[id.index()];
        debug_assert_eq!(entry.spec.kind(), value.kind(), "{}", entry.spec.name);
        let line = if event {
            entry.passes_threshold(&value).then(|| {
                entry.value = value;
                entry.state_line(now)
            })
        } else {
            entry.value = value;
            None
        };
        entry.lu_time = now;
        line
    }

    /// State line `name:type:value:age` of a status.
    pub fn state_line(&self, id: StatusId, now: f64) -> String {
        self.entry(id).state_line(now)
    }

    /// State lines of every status, newline-terminated.
    pub fn all_states(&self, now: f64) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.state_line(now));
            out.push('\n');
        }
        out
    }
}

/// Resolve a raw status identifier.
pub fn status_id(raw: i32) -> TuxResult<StatusId> {
    usize::try_from(raw)
        .ok()
        .and_then(StatusId::from_index)
        .ok_or(TuxError::InvalidIdentifier)
}

/// Resolve a status name.
pub fn status_id_by_name(name: &str) -> TuxResult<StatusId> {
    StatusId::from_name(name).ok_or(TuxError::InvalidName)
}

/// Documentation of every status.
pub fn status_doc() -> String {
    let table = StatusTable::new(0.0);
    let mut out = String::from("Tux status documentation :\n--------------------------\n\n");
    for i in 0..STATUS_COUNT {
        let entry = &table.entries[i];
        let spec = entry.spec;
        let _ = write!(
            out,
            "Status {i:02}:\n    ID : {i}\n    Name : {}\n    Value type : {}\n    \
             Possible values : {}\n    Event threshold : {}\n    Default state : [{}]\n\n",
            spec.name,
            spec.kind().name(),
            spec.doc,
            spec.threshold,
            entry.state_line(0.0),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Thresholds ─────────────────────────────────────────────────

    #[test]
    fn int_event_needs_threshold_delta() {
        let mut table = StatusTable::new(0.0);
        assert!(
            table
                .set(StatusId::BatteryLevel, StatusValue::Int(0), 1.0, true)
                .is_none()
        );
        let line = table
            .set(StatusId::BatteryLevel, StatusValue::Int(4900), 2.5, true)
            .unwrap();
        assert_eq!(line, "battery_level:int:4900:1.500");
        assert_eq!(table.get(StatusId::BatteryLevel), &StatusValue::Int(4900));
        assert_eq!(table.entry(StatusId::BatteryLevel).last_update(), 2.5);
    }

    #[test]
    fn float_threshold_in_thousandths() {
        let mut table = StatusTable::new(0.0);
        // light_level threshold is 1000: one unit
        assert!(
            table
                .set(StatusId::LightLevel, StatusValue::Float(0.5), 0.0, true)
                .is_none()
        );
        assert_eq!(table.get(StatusId::LightLevel), &StatusValue::Float(0.0));
        assert!(
            table
                .set(StatusId::LightLevel, StatusValue::Float(1.0), 0.0, true)
                .is_some()
        );
    }

    #[test]
    fn string_events_on_change_only() {
        let mut table = StatusTable::new(0.0);
        let s = |v: &str| StatusValue::Str(v.to_string());
        assert!(table.set(StatusId::EyesPosition, s("CLOSE"), 0.0, true).is_none());
        let line = table.set(StatusId::EyesPosition, s("OPEN"), 0.0, true).unwrap();
        assert_eq!(line, "eyes_position:string:OPEN:0.000");
    }

    #[test]
    fn silent_set_always_stores() {
        let mut table = StatusTable::new(0.0);
        assert!(
            table
                .set(StatusId::DescriptorComplete, StatusValue::Bool(true), 3.0, false)
                .is_none()
        );
        assert_eq!(table.get(StatusId::DescriptorComplete), &StatusValue::Bool(true));
        assert_eq!(
            table.state_line(StatusId::DescriptorComplete, 4.0),
            "descriptor_complete:bool:True:1.000"
        );
    }

    // ─── Lookup ─────────────────────────────────────────────────────

    #[test]
    fn id_resolution() {
        assert_eq!(status_id(16), Ok(StatusId::BatteryLevel));
        assert_eq!(status_id(-1), Err(TuxError::InvalidIdentifier));
        assert_eq!(status_id(STATUS_COUNT as i32), Err(TuxError::InvalidIdentifier));
        assert_eq!(status_id_by_name("head_button"), Ok(StatusId::HeadButton));
        assert_eq!(status_id_by_name("tail_button"), Err(TuxError::InvalidName));
    }

    #[test]
    fn all_states_lists_every_entry() {
        let table = StatusTable::new(0.0);
        let all = table.all_states(0.0);
        assert_eq!(all.lines().count(), STATUS_COUNT);
        assert!(all.ends_with('\n'));
        assert!(all.starts_with("flippers_position:string:DOWN:0.000\n"));
    }

    #[test]
    fn doc_describes_entries() {
        let doc = status_doc();
        assert!(doc.starts_with("Tux status documentation :\n"));
        assert!(doc.contains("Status 16:\n    ID : 16\n    Name : battery_level\n"));
        assert!(doc.contains("Possible values : range[4000..6500] (mV)"));
    }
}
