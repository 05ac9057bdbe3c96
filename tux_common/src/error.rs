//! Caller-visible error codes.
//!
//! Every public driver operation reports failures through [`TuxError`]. The
//! integer surface is kept stable for hosts that exchange codes rather than
//! typed values: success is `0`, errors are numbered from [`ERROR_OFFSET`].

use thiserror::Error;

/// First integer code used by [`TuxError`].
pub const ERROR_OFFSET: i32 = 256;

/// Integer code of a successful operation.
pub const NO_ERROR: i32 = 0;

/// Errors returned to driver callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(i32)]
pub enum TuxError {
    /// The command parser is disabled (a reflash is running).
    #[error("The parser of command is disabled")]
    ParserDisabled = ERROR_OFFSET,

    /// The command text could not be parsed.
    #[error("Invalid command")]
    InvalidCommand = ERROR_OFFSET + 1,

    /// The delayed command stack has no free slot.
    #[error("The stack of commands is full")]
    StackOverflow = ERROR_OFFSET + 2,

    /// A file could not be opened.
    #[error("File error")]
    FileError = ERROR_OFFSET + 3,

    /// An audio file is missing or unreadable.
    #[error("Wave file error")]
    BadWavFile = ERROR_OFFSET + 4,

    /// Unknown status identifier.
    #[error("The identifier is unknown")]
    InvalidIdentifier = ERROR_OFFSET + 5,

    /// Unknown status name.
    #[error("The name is unknown")]
    InvalidName = ERROR_OFFSET + 6,

    /// One or more parameters are out of range.
    #[error("One or more parameters are invalid")]
    InvalidParameter = ERROR_OFFSET + 7,

    /// Another long-running operation is already in progress.
    #[error("The system is busy")]
    Busy = ERROR_OFFSET + 8,

    /// The selected audio files do not fit in the sound flash.
    #[error("The size of the selection exceeds 127 blocks")]
    WavSizeExceeded = ERROR_OFFSET + 9,
}

impl TuxError {
    /// Integer code of this error.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Convert from an integer code. Returns `None` for `NO_ERROR` and unknown codes.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code.wrapping_sub(ERROR_OFFSET) {
            0 => Some(Self::ParserDisabled),
            1 => Some(Self::InvalidCommand),
            2 => Some(Self::StackOverflow),
            3 => Some(Self::FileError),
            4 => Some(Self::BadWavFile),
            5 => Some(Self::InvalidIdentifier),
            6 => Some(Self::InvalidName),
            7 => Some(Self::InvalidParameter),
            8 => Some(Self::Busy),
            9 => Some(Self::WavSizeExceeded),
            _ => None,
        }
    }
}

/// Result alias for driver operations.
pub type TuxResult<T> = Result<T, TuxError>;

/// Integer code of an operation result.
pub fn result_code<T>(result: &TuxResult<T>) -> i32 {
    match result {
        Ok(_) => NO_ERROR,
        Err(e) => e.code(),
    }
}

/// Human-readable message for an integer error code.
pub fn strerror(code: i32) -> String {
    if code == NO_ERROR {
        return "No error".to_string();
    }
    match TuxError::from_code(code) {
        Some(e) => e.to_string(),
        None => "Unknown error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dense_from_offset() {
        assert_eq!(TuxError::ParserDisabled.code(), 256);
        assert_eq!(TuxError::InvalidCommand.code(), 257);
        assert_eq!(TuxError::StackOverflow.code(), 258);
        assert_eq!(TuxError::WavSizeExceeded.code(), 265);
    }

    #[test]
    fn from_code_round_trips() {
        for code in 256..=265 {
            let err = TuxError::from_code(code).unwrap();
            assert_eq!(err.code(), code);
        }
        assert!(TuxError::from_code(0).is_none());
        assert!(TuxError::from_code(266).is_none());
        assert!(TuxError::from_code(-1).is_none());
    }

    #[test]
    fn strerror_messages() {
        assert_eq!(strerror(0), "No error");
        assert_eq!(strerror(257), "Invalid command");
        assert_eq!(strerror(265), "The size of the selection exceeds 127 blocks");
        assert_eq!(strerror(999), "Unknown error");
    }

    #[test]
    fn result_code_maps_ok_to_zero() {
        let ok: TuxResult<()> = Ok(());
        let err: TuxResult<()> = Err(TuxError::Busy);
        assert_eq!(result_code(&ok), NO_ERROR);
        assert_eq!(result_code(&err), 264);
    }
}
