//! Delayed command stacks.
//!
//! Two fixed-capacity stacks hold commands waiting for their fire time: the
//! user stack for commands scheduled by the host, the system stack for stop
//! commands the driver injects after timed movements. A system command is
//! paired with the user command that caused it through their common
//! insertion time, truncated to 10 ms.
//!
//! The stacks only store and select commands; executing them is the
//! caller's job, outside the stack lock. A sweep runs the due user
//! commands before the due system commands, each in slot order, and runs
//! every command before taking the next one, so a command can still drop
//! later ones.

use tux_common::consts::COMMAND_STACK_CAPACITY;
use tux_common::error::{TuxError, TuxResult};
use tux_common::protocol::command::{Command, CommandCategory};

/// A command waiting for its fire time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayedCommand {
    /// Command to execute.
    pub command: Command,
    /// Absolute fire time in seconds.
    pub timeout: f64,
    /// Insertion time truncated to 10 ms.
    pub inserted_at: f64,
}

/// Truncate a time to 10 ms.
#[inline]
pub fn truncate_10ms(time: f64) -> f64 {
    (time * 100.0).trunc() / 100.0
}

/// Fixed-capacity stack of delayed commands.
///
/// Insertion takes the first free slot; slots are never compacted.
#[derive(Debug, Clone)]
pub struct CommandStack {
    slots: Vec<Option<DelayedCommand>>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    /// Empty stack of [`COMMAND_STACK_CAPACITY`] slots.
    pub fn new() -> Self {
        Self {
            slots: vec![None; COMMAND_STACK_CAPACITY],
        }
    }

    /// Schedule `command` to fire `delay` seconds after `now`.
    ///
    /// Returns the truncated insertion time.
    ///
    /// # Errors
    /// [`TuxError::StackOverflow`] when every slot is taken.
    pub fn insert(&mut self, command: Command, delay: f64, now: f64) -> TuxResult<f64> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(TuxError::StackOverflow)?;
        let inserted_at = truncate_10ms(now);
        *slot = Some(DelayedCommand {
            command,
            timeout: now + delay,
            inserted_at,
        });
        Ok(inserted_at)
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no command is pending.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        COMMAND_STACK_CAPACITY - self.len()
    }

    /// Free every slot.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Pending commands in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &DelayedCommand> {
        self.slots.iter().flatten()
    }

    /// Take the command in slot `index` if it is due at `now`.
    pub fn take_expired_at(&mut self, index: usize, now: f64) -> Option<Command> {
        let slot = &mut self.slots[index];
        if slot.as_ref().is_some_and(|cmd| now >= cmd.timeout) {
            slot.take().map(|cmd| cmd.command)
        } else {
            None
        }
    }
}

/// The user and system stacks.
#[derive(Debug, Clone, Default)]
pub struct CommandStacks {
    /// Commands scheduled by the host.
    pub user: CommandStack,
    /// Commands injected by the driver.
    pub sys: CommandStack,
}

impl CommandStacks {
    /// Empty stacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove system commands of `category` whose user command is gone.
    ///
    /// A system command keeps its slot only while a user command of the same
    /// category with the same truncated insertion time is pending.
    pub fn clean_sys(&mut self, category: CommandCategory) {
        let user = &self.user;
        for slot in &mut self.sys.slots {
            let orphan = slot.as_ref().is_some_and(|sys| {
                sys.command.category() == Some(category)
                    && !user.iter().any(|u| {
                        u.command.category() == Some(category) && u.inserted_at == sys.inserted_at
                    })
            });
            if orphan {
                *slot = None;
            }
        }
    }

    /// Wipe both stacks, returning the pending system commands in slot order.
    pub fn drain_for_clear(&mut self) -> Vec<Command> {
        self.user.clear();
        let pending = self.sys.iter().map(|c| c.command).collect();
        self.sys.clear();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tux_common::protocol::command::{ActuatorCommand, FinalState, TuxCommand};

    fn eyes(cmd: ActuatorCommand) -> Command {
        Command::Tux(TuxCommand::Eyes(cmd))
    }

    fn mouth_off() -> Command {
        Command::Tux(TuxCommand::Mouth(ActuatorCommand::Off))
    }

    fn take_all(stacks: &mut CommandStacks, now: f64) -> Vec<Command> {
        let mut expired = Vec::new();
        for index in 0..COMMAND_STACK_CAPACITY {
            expired.extend(stacks.user.take_expired_at(index, now));
        }
        for index in 0..COMMAND_STACK_CAPACITY {
            expired.extend(stacks.sys.take_expired_at(index, now));
        }
        expired
    }

    // ─── Capacity ───────────────────────────────────────────────────

    #[test]
    fn capacity_is_512() {
        let mut stack = CommandStack::new();
        for i in 0..COMMAND_STACK_CAPACITY {
            stack.insert(eyes(ActuatorCommand::Open), i as f64, 0.0).unwrap();
        }
        assert_eq!(
            stack.insert(eyes(ActuatorCommand::Open), 1.0, 0.0),
            Err(TuxError::StackOverflow)
        );
        stack.clear();
        assert_eq!(stack.available(), COMMAND_STACK_CAPACITY);
    }

    #[test]
    fn insertion_reuses_first_free_slot() {
        let mut stacks = CommandStacks::new();
        stacks.user.insert(eyes(ActuatorCommand::Open), 0.0, 0.0).unwrap();
        stacks.user.insert(eyes(ActuatorCommand::Close), 5.0, 0.0).unwrap();
        assert_eq!(take_all(&mut stacks, 0.0).len(), 1);
        stacks.user.insert(eyes(ActuatorCommand::Off), 0.0, 0.0).unwrap();
        let pending: Vec<_> = stacks.user.iter().map(|c| c.command).collect();
        assert_eq!(pending, vec![eyes(ActuatorCommand::Off), eyes(ActuatorCommand::Close)]);
    }

    // ─── Expiry ─────────────────────────────────────────────────────

    #[test]
    fn command_fires_at_deadline_not_before() {
        let mut stacks = CommandStacks::new();
        stacks.user.insert(eyes(ActuatorCommand::Open), 1.5, 10.0).unwrap();
        assert!(take_all(&mut stacks, 11.49).is_empty());
        assert_eq!(take_all(&mut stacks, 11.5), vec![eyes(ActuatorCommand::Open)]);
        assert!(stacks.user.is_empty());
    }

    #[test]
    fn user_commands_run_before_system_commands() {
        let mut stacks = CommandStacks::new();
        stacks.sys.insert(mouth_off(), 0.0, 0.0).unwrap();
        stacks.user.insert(eyes(ActuatorCommand::Close), 9.0, 0.0).unwrap();
        stacks.user.insert(eyes(ActuatorCommand::Open), 0.0, 0.0).unwrap();
        assert_eq!(
            take_all(&mut stacks, 0.0),
            vec![eyes(ActuatorCommand::Open), mouth_off()]
        );
        assert_eq!(stacks.user.len(), 1);
    }

    // ─── Orphans ────────────────────────────────────────────────────

    #[test]
    fn orphan_system_command_is_removed() {
        let mut stacks = CommandStacks::new();
        let user_at = stacks
            .user
            .insert(
                eyes(ActuatorCommand::OnDuring {
                    duration: 2.0,
                    final_state: FinalState::OpenUp,
                }),
                1.0,
                3.004,
            )
            .unwrap();
        let sys_at = stacks.sys.insert(eyes(ActuatorCommand::Open), 3.0, 3.009).unwrap();
        assert_eq!(user_at, sys_at);

        stacks.clean_sys(CommandCategory::Eyes);
        assert_eq!(stacks.sys.len(), 1);

        stacks.user.clear();
        stacks.clean_sys(CommandCategory::Mouth);
        assert_eq!(stacks.sys.len(), 1);
        stacks.clean_sys(CommandCategory::Eyes);
        assert!(stacks.sys.is_empty());
    }

    #[test]
    fn different_timestamp_is_not_a_parent() {
        let mut stacks = CommandStacks::new();
        stacks.user.insert(eyes(ActuatorCommand::Open), 1.0, 1.00).unwrap();
        stacks.sys.insert(eyes(ActuatorCommand::Close), 1.0, 1.02).unwrap();
        stacks.clean_sys(CommandCategory::Eyes);
        assert!(stacks.sys.is_empty());
    }

    #[test]
    fn drain_returns_system_commands() {
        let mut stacks = CommandStacks::new();
        stacks.user.insert(eyes(ActuatorCommand::Open), 9.0, 0.0).unwrap();
        stacks.sys.insert(mouth_off(), 9.0, 0.0).unwrap();
        assert_eq!(stacks.drain_for_clear(), vec![mouth_off()]);
        assert!(stacks.user.is_empty() && stacks.sys.is_empty());
    }
}
