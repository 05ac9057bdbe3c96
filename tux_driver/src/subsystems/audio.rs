//! Audio routing on the dongle and amplifier mute on the robot.

use tux_common::protocol::command::AudioCommand;
use tux_common::protocol::opcodes::{AUDIO_MUTE, DONGLE_AUDIO};

use crate::context::DriverContext;

/// Dongle audio channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioChannel {
    /// General purpose sound.
    General = 0,
    /// Text-to-speech.
    Tts = 1,
}

impl DriverContext {
    pub(crate) fn audio_channel(&self, channel: AudioChannel) -> bool {
        self.send_to_dongle(&[DONGLE_AUDIO, channel as u8, 0, 0])
    }

    pub(crate) fn audio_mute(&self, muted: bool) -> bool {
        self.send_to_tux(&[AUDIO_MUTE, u8::from(muted), 0, 0])
    }

    pub(crate) fn execute_audio(&self, command: &AudioCommand) -> bool {
        match *command {
            AudioCommand::ChannelGeneral => self.audio_channel(AudioChannel::General),
            AudioCommand::ChannelTts => self.audio_channel(AudioChannel::Tts),
            AudioCommand::Mute(muted) => self.audio_mute(muted),
        }
    }
}
