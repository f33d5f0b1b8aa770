//! Error types for pkflash-core

use std::fmt;
use std::io;

use thiserror::Error;

use crate::chip::ChipDbError;
use crate::programmer::TransportError;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Memory category compared by verify and blank check
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Program memory words
    Program,
    /// Software checksum over program memory and the masked CONFIG word
    Checksum,
    /// CONFIG word under the chip's configuration mask
    ConfigWord,
    /// User ID words (low 7 bits)
    UserId,
    /// EEPROM data memory
    Eeprom,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Program => "program memory",
            Category::Checksum => "program memory checksum",
            Category::ConfigWord => "CONFIG word",
            Category::UserId => "config IDs",
            Category::Eeprom => "EE data memory",
        };
        f.write_str(name)
    }
}

/// What was wrong with a malformed hex record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A character other than whitespace appeared before the next ':'
    #[error("unexpected character {0:?} between records")]
    UnexpectedCharacter(char),
    /// A field contained something other than two hex digits
    #[error("invalid hex digit")]
    InvalidDigit,
    /// The input ended inside a record
    #[error("record is truncated")]
    Truncated,
    /// The length field exceeds what a record may carry
    #[error("data length {0} exceeds 64 bytes")]
    TooLong(u8),
    /// Record type other than 00, 01, 02 or 04
    #[error("unrecognized record type 0x{0:02X}")]
    UnsupportedType(u8),
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, reading or writing a hex file failed
    #[error("File error: {0}")]
    File(#[from] io::Error),

    /// Malformed hex record
    #[error("Malformed hex record on line {line}: {kind}")]
    Format {
        /// 1-based line of the offending record
        line: usize,
        /// What was wrong with it
        kind: RecordError,
    },

    /// Hex record checksum did not sum to zero
    #[error("Checksum mismatch on line {line}: record sums to 0x{sum:02X}")]
    Checksum {
        /// 1-based line of the offending record
        line: usize,
        /// Sum of all bytes including the trailing checksum byte
        sum: u8,
    },

    /// USB transfer failed; the session cannot continue
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device ID read from the chip is not in the registry
    #[error("No PIC or unsupported PIC found (device ID 0x{id:04X}, revision {revision})")]
    UnsupportedDevice {
        /// Device ID with the revision bits masked off
        id: u16,
        /// Revision bits
        revision: u8,
    },

    /// The chip lacks the capability this operation needs
    #[error("{operation} is not supported on PIC{chip}")]
    UnsupportedOperation {
        /// Chip display name
        chip: String,
        /// Operation that was refused
        operation: &'static str,
    },

    /// Device contents differ from the file
    #[error("{0} does not match with .hex file")]
    VerifyMismatch(Category),

    /// Device is not erased
    #[error("{0} is not blank")]
    NotBlank(Category),

    /// Bandgap level outside 0..=3
    #[error("Bandgap must be between 0 and 3, got {0}")]
    InvalidBandgap(u8),

    /// A memory command was about to be sent outside programming mode
    #[error("Command '{opcode}' requires programming mode")]
    ProtocolViolation {
        /// Opcode of the rejected command
        opcode: char,
    },

    /// Loading a chip definition file failed
    #[error("Chip database error: {0}")]
    ChipDb(#[from] ChipDbError),
}

impl Error {
    /// Check if this error leaves the programmer in an unknown state
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
