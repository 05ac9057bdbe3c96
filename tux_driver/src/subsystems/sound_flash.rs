//! Sound flash: stored tracks, playback and programming progress.

use tux_common::descriptor::SoundFlashDescriptor;
use tux_common::protocol::command::SoundFlashCommand;
use tux_common::protocol::opcodes::SOUND_PLAY;
use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;
use crate::hw_status::{HwStatus, SoundVarBody};

/// Flash blocks of the sound bank, including the table of contents.
const FLASH_BLOCKS: u32 = 128;

/// Seconds of audio per flash block.
const SECONDS_PER_BLOCK: f32 = 0.5;

/// Attenuation byte of a `0.0..=100.0` volume. 0 is loudest, 7 is mute.
pub fn attenuation(volume: f32) -> u8 {
    if volume < 0.0 {
        7
    } else if volume > 100.0 {
        0
    } else {
        7 - (volume * 7.0 / 100.0) as u8
    }
}

/// Sound bank descriptor of a SOUND_VAR frame.
pub fn sound_flash_descriptor(body: &SoundVarBody) -> SoundFlashDescriptor {
    let usage = u32::from(body.flash_usage);
    SoundFlashDescriptor {
        number_of_sounds: u32::from(body.number_of_sounds),
        flash_usage: usage,
        available_record_time: (FLASH_BLOCKS.saturating_sub(usage) as f32 * SECONDS_PER_BLOCK)
            as u32,
    }
}

/// `audio_flash_play` value of a played track number.
pub fn flash_play_name(track: u8) -> String {
    if track == 0 {
        "STOP".to_string()
    } else {
        format!("TRACK_{track:03}")
    }
}

impl DriverContext {
    pub(crate) fn update_sound_flash(&self, hw: &HwStatus) {
        let body = hw.sound_var();
        *self.sound_flash.lock() = sound_flash_descriptor(&body);
        self.publish_u8(StatusId::SoundFlashCount, body.number_of_sounds);
    }

    pub(crate) fn update_flash_play(&self, hw: &HwStatus) {
        let track = hw.audio().sound_track_played;
        self.publish(StatusId::AudioFlashPlay, StatusValue::Str(flash_play_name(track)));
    }

    pub(crate) fn update_general_play(&self, hw: &HwStatus) {
        let sensors1 = hw.sensors1();
        self.publish_bool(
            StatusId::AudioGeneralPlay,
            sensors1.play_general_sound != 0 || sensors1.play_internal_sound != 0,
        );
    }

    pub(crate) fn update_flash_programming(&self, hw: &HwStatus) {
        let prog = hw.flash_prog();
        self.publish_u8(StatusId::FlashProgrammingCurrentTrack, prog.current_state);
        self.publish(
            StatusId::FlashProgrammingLastTrackSize,
            StatusValue::Int(i32::from(prog.last_sound_size)),
        );
    }

    /// Play a stored track.
    pub(crate) fn sound_flash_play(&self, track: u8, volume: f32) -> bool {
        self.send_to_tux(&[SOUND_PLAY, track, attenuation(volume), 0])
    }

    pub(crate) fn execute_sound_flash(&self, command: &SoundFlashCommand) -> bool {
        match *command {
            SoundFlashCommand::Play { track, volume } => self.sound_flash_play(track, volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_maps_to_attenuation() {
        assert_eq!(attenuation(-1.0), 7);
        assert_eq!(attenuation(0.0), 7);
        assert_eq!(attenuation(50.0), 4);
        assert_eq!(attenuation(100.0), 0);
        assert_eq!(attenuation(150.0), 0);
    }

    #[test]
    fn record_time_from_usage() {
        let d = sound_flash_descriptor(&SoundVarBody {
            number_of_sounds: 3,
            flash_usage: 28,
        });
        assert_eq!(d.number_of_sounds, 3);
        assert_eq!(d.available_record_time, 50);
        let full = sound_flash_descriptor(&SoundVarBody {
            number_of_sounds: 20,
            flash_usage: 200,
        });
        assert_eq!(full.available_record_time, 0);
    }

    #[test]
    fn play_names() {
        assert_eq!(flash_play_name(0), "STOP");
        assert_eq!(flash_play_name(7), "TRACK_007");
        assert_eq!(flash_play_name(120), "TRACK_120");
    }
}
