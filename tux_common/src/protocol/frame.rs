//! Status frame headers.
//!
//! A status frame is four bytes: one header selecting the category and up to
//! three payload bytes. The number of significant payload bytes depends on
//! the category.

use crate::consts::{FRAME_CATEGORY_COUNT, FRAME_LEN};

/// One 4-byte status or command frame.
pub type Frame = [u8; FRAME_LEN];

/// Status frame category, selected by the first byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameHeader {
    /// Port B, C and D raw values.
    Ports = 0xC0,
    /// Switch sensors and sound flags.
    Sensors1 = 0xC1,
    /// Light sensor measure.
    Light = 0xC2,
    /// Remaining movements of eyes, mouth and flippers.
    Position1 = 0xC3,
    /// Spin remaining movements, flippers position and motor states.
    Position2 = 0xC4,
    /// Received RC5 code.
    Ir = 0xC5,
    /// Connection identifier.
    Id = 0xC6,
    /// Battery measure.
    Battery = 0xC7,
    /// CPU version.
    Version = 0xC8,
    /// CPU revision.
    Revision = 0xC9,
    /// CPU author.
    Author = 0xCA,
    /// Sound flash content.
    SoundVar = 0xCB,
    /// Audio playback and programming state.
    Audio = 0xCC,
    /// Flash programming progress.
    FlashProg = 0xCD,
    /// LED intensities and effect state.
    Led = 0xCE,
    /// Connection quality answer.
    Pong = 0xFF,
}

impl FrameHeader {
    /// All categories in index order.
    pub const ALL: [FrameHeader; FRAME_CATEGORY_COUNT] = [
        Self::Ports,
        Self::Sensors1,
        Self::Light,
        Self::Position1,
        Self::Position2,
        Self::Ir,
        Self::Id,
        Self::Battery,
        Self::Version,
        Self::Revision,
        Self::Author,
        Self::SoundVar,
        Self::Audio,
        Self::FlashProg,
        Self::Led,
        Self::Pong,
    ];

    /// Convert from a raw header byte. Returns `None` for unknown headers.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0xC0 => Some(Self::Ports),
            0xC1 => Some(Self::Sensors1),
            0xC2 => Some(Self::Light),
            0xC3 => Some(Self::Position1),
            0xC4 => Some(Self::Position2),
            0xC5 => Some(Self::Ir),
            0xC6 => Some(Self::Id),
            0xC7 => Some(Self::Battery),
            0xC8 => Some(Self::Version),
            0xC9 => Some(Self::Revision),
            0xCA => Some(Self::Author),
            0xCB => Some(Self::SoundVar),
            0xCC => Some(Self::Audio),
            0xCD => Some(Self::FlashProg),
            0xCE => Some(Self::Led),
            0xFF => Some(Self::Pong),
            _ => None,
        }
    }

    /// Dense index in `0..FRAME_CATEGORY_COUNT`.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Ports => 0,
            Self::Sensors1 => 1,
            Self::Light => 2,
            Self::Position1 => 3,
            Self::Position2 => 4,
            Self::Ir => 5,
            Self::Id => 6,
            Self::Battery => 7,
            Self::Version => 8,
            Self::Revision => 9,
            Self::Author => 10,
            Self::SoundVar => 11,
            Self::Audio => 12,
            Self::FlashProg => 13,
            Self::Led => 14,
            Self::Pong => 15,
        }
    }

    /// Number of significant payload bytes.
    #[inline]
    pub const fn payload_len(self) -> usize {
        match self {
            Self::Ir => 1,
            Self::Id | Self::SoundVar | Self::FlashProg => 2,
            _ => 3,
        }
    }

    /// Short name used in frame counter dumps.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ports => "PORTS",
            Self::Sensors1 => "SENSORS1",
            Self::Light => "LIGHT",
            Self::Position1 => "POSITION1",
            Self::Position2 => "POSITION2",
            Self::Ir => "IR",
            Self::Id => "ID",
            Self::Battery => "BATTERY",
            Self::Version => "VERSION",
            Self::Revision => "REVISION",
            Self::Author => "AUTHOR",
            Self::SoundVar => "SOUND_VAR",
            Self::Audio => "AUDIO",
            Self::FlashProg => "FLASH_PROG",
            Self::Led => "LED",
            Self::Pong => "PONG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_index_matches_all_order() {
        for (i, header) in FrameHeader::ALL.iter().enumerate() {
            assert_eq!(header.index(), i);
            assert_eq!(FrameHeader::from_u8(*header as u8), Some(*header));
        }
    }

    #[test]
    fn unknown_headers_are_rejected() {
        assert_eq!(FrameHeader::from_u8(0x00), None);
        assert_eq!(FrameHeader::from_u8(0xCF), None);
        assert_eq!(FrameHeader::from_u8(0xB6), None);
    }

    #[test]
    fn payload_lengths() {
        assert_eq!(FrameHeader::Ir.payload_len(), 1);
        assert_eq!(FrameHeader::Id.payload_len(), 2);
        assert_eq!(FrameHeader::SoundVar.payload_len(), 2);
        assert_eq!(FrameHeader::FlashProg.payload_len(), 2);
        assert_eq!(FrameHeader::Battery.payload_len(), 3);
        assert_eq!(FrameHeader::Pong.payload_len(), 3);
    }
}
