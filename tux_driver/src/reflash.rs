//! Sound flash reflash.
//!
//! Replaces the whole sound bank of the robot with a list of WAV files. The
//! bank is erased, then each track is announced with a store command,
//! played through the dongle's sound card and confirmed.
//!
//! # State machine
//!
//! ```text
//! STANDBY ──start──▶ INIT ──▶ ERASE ──wait──▶ STORE ──wait──▶ PLAY ──wait──▶ CONFIRM
//!    ▲                                          ▲                              │
//!    │                                          └──────── next track ◀──wait───┘
//!    └──────────────────────── FINISH ◀── last track, RF lost or any failure
//! ```
//!
//! Waits are deadlines checked on later ticks. Playback is the only blocking
//! step. Each side effect is returned as a [`ReflashAction`] and executed by
//! the driver context with no lock held; the outcome comes back through
//! [`ReflashMachine::complete`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command as Process, Stdio};
use tracing::{debug, info, warn};
use tux_common::config::ReflashConfig;
use tux_common::consts::{MAX_SOUND_BLOCKS, SOUND_BLOCK_SIZE, WAV_HEADER_LEN};
use tux_common::error::{TuxError, TuxResult};
use tux_common::protocol::command::{EffectType, LedEffect, Leds};
use tux_common::protocol::opcodes::{SOUND_CONFIRM, SOUND_ERASE, SOUND_STORE};
use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;

/// Maximum number of files in one reflash list.
pub const MAX_TRACKS: usize = 256;

/// Plays a WAV file on the dongle's sound card.
pub trait AudioPlayer: Send + Sync {
    /// Play `path` to completion. Returns whether playback succeeded.
    fn play(&self, path: &Path) -> bool;
}

/// Plays through `aplay` on an ALSA device.
#[derive(Debug, Clone)]
pub struct AplayPlayer {
    device: String,
}

impl AplayPlayer {
    /// Player on `device`, e.g. `plughw:TuxDroid`.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl AudioPlayer for AplayPlayer {
    fn play(&self, path: &Path) -> bool {
        debug!("aplay -D {} {}", self.device, path.display());
        match Process::new("aplay")
            .arg("-D")
            .arg(&self.device)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                warn!("Failed to run aplay: {}", e);
                false
            }
        }
    }
}

/// Outcome of a reflash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflashError {
    /// Completed.
    None,
    /// The dongle or the radio link went away.
    RfOffline,
    /// A track could not be played.
    Wav,
    /// A command could not be written.
    Usb,
}

impl ReflashError {
    /// Value published on `sound_reflash_end`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NO_ERROR",
            Self::RfOffline => "ERROR_RF_OFFLINE",
            Self::Wav => "ERROR_WAV",
            Self::Usb => "ERROR_USB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Standby,
    Init,
    Erase,
    Erasing { until: f64 },
    Store { track: usize },
    Storing { track: usize, until: f64 },
    Play { track: usize },
    ConfirmFailed,
    Confirm { track: usize },
    Confirming { track: usize, until: f64 },
    Finish,
}

/// Side effect requested by one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflashAction {
    /// Nothing to do this tick.
    None,
    /// Disable the parser and announce the estimated duration.
    Begin {
        /// Estimated duration in seconds.
        duration: f32,
    },
    /// Show the erase pattern and send the erase command.
    Erase,
    /// Announce a track.
    Store {
        /// Zero-based track index.
        track: usize,
    },
    /// Play a track.
    Play {
        /// WAV file.
        path: PathBuf,
    },
    /// Confirm or discard the stored track.
    Confirm {
        /// Keep the track.
        keep: bool,
    },
    /// Restore the robot and publish the outcome.
    Finish {
        /// Outcome.
        error: ReflashError,
    },
}

/// Sound bank reflash machine.
#[derive(Debug, Clone)]
pub struct ReflashMachine {
    config: ReflashConfig,
    phase: Phase,
    tracks: Vec<PathBuf>,
    full_size: u64,
    error: ReflashError,
}

/// Payload size of a WAV file and the flash blocks it needs.
fn wav_blocks(path: &Path) -> TuxResult<(u64, u64)> {
    let len = File::open(path)
        .and_then(|file| file.metadata())
        .map_err(|_| TuxError::BadWavFile)?
        .len();
    let size = len.saturating_sub(WAV_HEADER_LEN);
    Ok((size, size.div_ceil(SOUND_BLOCK_SIZE)))
}

/// Split a `|`-separated list of paths.
pub fn parse_track_list(list: &str) -> Vec<PathBuf> {
    list.split('|')
        .filter(|s| !s.is_empty())
        .take(MAX_TRACKS)
        .map(PathBuf::from)
        .collect()
}

impl ReflashMachine {
    /// Idle machine.
    pub fn new(config: ReflashConfig) -> Self {
        Self {
            config,
            phase: Phase::Standby,
            tracks: Vec::new(),
            full_size: 0,
            error: ReflashError::None,
        }
    }

    /// Whether a reflash is running.
    pub fn is_running(&self) -> bool {
        self.phase != Phase::Standby
    }

    /// Validate `tracks` and start.
    ///
    /// # Errors
    /// - [`TuxError::Busy`] while a reflash runs.
    /// - [`TuxError::BadWavFile`] for an empty list or an unreadable file.
    /// - [`TuxError::WavSizeExceeded`] when the tracks need more than 127
    ///   blocks.
    pub fn start(&mut self, tracks: Vec<PathBuf>) -> TuxResult<()> {
        if self.is_running() {
            return Err(TuxError::Busy);
        }
        if tracks.is_empty() {
            return Err(TuxError::BadWavFile);
        }
        let mut full_size = 0;
        let mut blocks = 0;
        for path in &tracks {
            let (size, needed) = wav_blocks(path)?;
            full_size += size;
            blocks += needed;
        }
        if blocks > MAX_SOUND_BLOCKS {
            return Err(TuxError::WavSizeExceeded);
        }
        self.tracks = tracks;
        self.full_size = full_size;
        self.error = ReflashError::None;
        self.phase = Phase::Init;
        Ok(())
    }

    /// Estimated reflash duration in seconds.
    pub fn estimated_duration(&self) -> f32 {
        10.0 + self.full_size as f32 / 8000.0 + self.tracks.len() as f32 * 0.97
    }

    fn fail(&mut self, error: ReflashError) {
        self.error = error;
        self.phase = Phase::Finish;
    }

    /// Advance to the next side effect. `online` is false when the dongle
    /// or the radio link is down.
    pub fn poll(&mut self, now: f64, online: bool) -> ReflashAction {
        if !online && !matches!(self.phase, Phase::Standby | Phase::Finish) {
            warn!("Sound reflash: radio link lost");
            self.fail(ReflashError::RfOffline);
        }
        loop {
            match self.phase {
                Phase::Standby => return ReflashAction::None,
                Phase::Init => {
                    info!("Sound reflash: Init ({} tracks)", self.tracks.len());
                    self.phase = Phase::Erase;
                    return ReflashAction::Begin {
                        duration: self.estimated_duration(),
                    };
                }
                Phase::Erase => return ReflashAction::Erase,
                Phase::Erasing { until } | Phase::Storing { until, .. } if now < until => {
                    return ReflashAction::None;
                }
                Phase::Confirming { until, .. } if now < until => return ReflashAction::None,
                Phase::Erasing { .. } => self.phase = Phase::Store { track: 0 },
                Phase::Store { track } => return ReflashAction::Store { track },
                Phase::Storing { track, .. } => self.phase = Phase::Play { track },
                Phase::Play { track } => {
                    return ReflashAction::Play {
                        path: self.tracks[track].clone(),
                    };
                }
                Phase::ConfirmFailed => return ReflashAction::Confirm { keep: false },
                Phase::Confirm { .. } => return ReflashAction::Confirm { keep: true },
                Phase::Confirming { track, .. } => {
                    self.phase = if track + 1 < self.tracks.len() {
                        Phase::Store { track: track + 1 }
                    } else {
                        Phase::Finish
                    };
                }
                Phase::Finish => {
                    let error = self.error;
                    info!("Sound reflash: Finish ({})", error.name());
                    self.phase = Phase::Standby;
                    self.tracks.clear();
                    return ReflashAction::Finish { error };
                }
            }
        }
    }

    /// Outcome of the last action returned by [`poll`](Self::poll).
    pub fn complete(&mut self, ok: bool, now: f64) {
        match self.phase {
            Phase::Erase if ok => {
                self.phase = Phase::Erasing {
                    until: now + self.config.erase_wait_s,
                };
            }
            Phase::Store { track } if ok => {
                self.phase = Phase::Storing {
                    track,
                    until: now + self.config.store_settle_s,
                };
            }
            Phase::Play { track } if ok => {
                self.phase = Phase::Confirm { track };
            }
            Phase::Play { .. } => {
                self.error = ReflashError::Wav;
                self.phase = Phase::ConfirmFailed;
            }
            Phase::ConfirmFailed if ok => self.phase = Phase::Finish,
            Phase::Confirm { track } if ok => {
                self.phase = Phase::Confirming {
                    track,
                    until: now + self.config.confirm_settle_s + self.config.next_track_settle_s,
                };
            }
            Phase::Erase | Phase::Store { .. } | Phase::ConfirmFailed | Phase::Confirm { .. } => {
                self.fail(ReflashError::Usb);
            }
            _ => {}
        }
    }
}

impl DriverContext {
    /// Start a reflash from a `|`-separated list of WAV files.
    pub fn start_reflash(&self, list: &str) -> TuxResult<()> {
        self.reflash.lock().start(parse_track_list(list))?;
        self.clear_delayed_commands();
        Ok(())
    }

    pub(crate) fn reflash_tick(&self) {
        loop {
            let online = self.link.is_connected() && self.link.rf_online();
            let now = self.now();
            let action = self.reflash.lock().poll(now, online);
            let ok = match action {
                ReflashAction::None => return,
                ReflashAction::Begin { duration } => {
                    self.parser_enabled
                        .store(false, std::sync::atomic::Ordering::SeqCst);
                    self.publish(StatusId::SoundReflashBegin, StatusValue::Float(duration));
                    self.publish_str(StatusId::SoundReflashEnd, "NDEF");
                    continue;
                }
                ReflashAction::Erase => {
                    info!("Sound reflash: Erase");
                    let pulse = LedEffect {
                        kind: EffectType::FadeDuration,
                        speed: 0.5,
                        step: 0,
                    };
                    self.led_set(Leds::LEFT, 0.0, &LedEffect::NONE);
                    self.led_set(Leds::RIGHT, 1.0, &LedEffect::NONE);
                    self.led_pulse(Leds::BOTH, 0.0, 1.0, 255, 1.0, &pulse);
                    self.send_to_tux(&[SOUND_ERASE, 0, 0, 0])
                }
                ReflashAction::Store { track } => {
                    info!("Sound reflash: Store track {}", track + 1);
                    let sent = self.send_to_tux(&[SOUND_STORE, 0, 0, 0]);
                    if sent {
                        let number = u8::try_from(track + 1).unwrap_or(u8::MAX);
                        self.publish_u8(StatusId::SoundReflashCurrentTrack, number);
                    }
                    sent
                }
                ReflashAction::Play { path } => self.player.play(&path),
                ReflashAction::Confirm { keep } => {
                    self.send_to_tux(&[SOUND_CONFIRM, u8::from(keep), 0, 0])
                }
                ReflashAction::Finish { error } => {
                    self.parser_enabled
                        .store(true, std::sync::atomic::Ordering::SeqCst);
                    self.led_set(Leds::BOTH, 1.0, &LedEffect::NONE);
                    self.store(StatusId::SoundReflashBegin, StatusValue::Float(0.0));
                    self.publish_str(StatusId::SoundReflashEnd, error.name());
                    if error == ReflashError::None {
                        self.sound_flash_play(1, 100.0);
                    }
                    return;
                }
            };
            let now = self.now();
            self.reflash.lock().complete(ok, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn wav(payload: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; WAV_HEADER_LEN as usize + payload]).unwrap();
        file
    }

    fn machine() -> ReflashMachine {
        ReflashMachine::new(ReflashConfig::default())
    }

    // ─── Validation ─────────────────────────────────────────────────

    #[test]
    fn track_list_parsing() {
        assert_eq!(parse_track_list("a.wav|b.wav||"), vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")]);
        assert!(parse_track_list("").is_empty());
    }

    #[test]
    fn start_rejects_bad_input() {
        let mut m = machine();
        assert_eq!(m.start(Vec::new()), Err(TuxError::BadWavFile));
        assert_eq!(
            m.start(vec![PathBuf::from("/nonexistent/track.wav")]),
            Err(TuxError::BadWavFile)
        );
        assert!(!m.is_running());
    }

    #[test]
    fn start_rejects_oversized_selection() {
        let big = wav(128 * 4000);
        let mut m = machine();
        assert_eq!(
            m.start(vec![big.path().to_path_buf()]),
            Err(TuxError::WavSizeExceeded)
        );
        let fits = wav(127 * 4000);
        assert_eq!(m.start(vec![fits.path().to_path_buf()]), Ok(()));
        assert_eq!(m.start(vec![fits.path().to_path_buf()]), Err(TuxError::Busy));
    }

    #[test]
    fn estimated_duration() {
        let a = wav(8000);
        let mut m = machine();
        m.start(vec![a.path().to_path_buf()]).unwrap();
        assert!((m.estimated_duration() - 11.97).abs() < 1e-4);
    }

    // ─── Sequencing ─────────────────────────────────────────────────

    #[test]
    fn two_tracks_complete_sequence() {
        let a = wav(100);
        let b = wav(100);
        let mut m = machine();
        m.start(vec![a.path().to_path_buf(), b.path().to_path_buf()]).unwrap();

        assert!(matches!(m.poll(0.0, true), ReflashAction::Begin { .. }));
        assert_eq!(m.poll(0.0, true), ReflashAction::Erase);
        m.complete(true, 0.0);
        assert_eq!(m.poll(5.0, true), ReflashAction::None);

        let mut now = 10.0;
        for track in 0..2 {
            assert_eq!(m.poll(now, true), ReflashAction::Store { track });
            m.complete(true, now);
            assert_eq!(m.poll(now, true), ReflashAction::None);
            now += 0.2;
            assert!(matches!(m.poll(now, true), ReflashAction::Play { .. }));
            m.complete(true, now);
            assert_eq!(m.poll(now, true), ReflashAction::Confirm { keep: true });
            m.complete(true, now);
            now += 0.3;
        }
        assert_eq!(
            m.poll(now, true),
            ReflashAction::Finish {
                error: ReflashError::None
            }
        );
        assert!(!m.is_running());
    }

    #[test]
    fn failed_playback_discards_track() {
        let a = wav(100);
        let mut m = machine();
        m.start(vec![a.path().to_path_buf()]).unwrap();
        m.poll(0.0, true);
        m.poll(0.0, true);
        m.complete(true, 0.0);
        m.poll(10.0, true);
        m.complete(true, 10.0);
        assert!(matches!(m.poll(11.0, true), ReflashAction::Play { .. }));
        m.complete(false, 11.0);
        assert_eq!(m.poll(11.0, true), ReflashAction::Confirm { keep: false });
        m.complete(true, 11.0);
        assert_eq!(
            m.poll(11.0, true),
            ReflashAction::Finish {
                error: ReflashError::Wav
            }
        );
    }

    #[test]
    fn write_failure_is_usb_error() {
        let a = wav(100);
        let mut m = machine();
        m.start(vec![a.path().to_path_buf()]).unwrap();
        m.poll(0.0, true);
        m.poll(0.0, true);
        m.complete(false, 0.0);
        assert_eq!(
            m.poll(0.0, true),
            ReflashAction::Finish {
                error: ReflashError::Usb
            }
        );
    }

    #[test]
    fn radio_loss_finishes() {
        let a = wav(100);
        let mut m = machine();
        m.start(vec![a.path().to_path_buf()]).unwrap();
        m.poll(0.0, true);
        assert_eq!(
            m.poll(0.0, false),
            ReflashAction::Finish {
                error: ReflashError::RfOffline
            }
        );
        assert_eq!(m.poll(0.0, false), ReflashAction::None);
    }
}
