//! PICkit 1 command protocol
//!
//! The programmer accepts 8-byte frames, each holding one or more
//! single-letter commands followed by their argument bytes. Unused bytes are
//! padded with the no-op command 'Z'. Responses come back as 8-byte reports.
//!
//! Commands that touch chip memory are only valid while the chip is held in
//! programming mode ('P' ... 'p').

mod command;
mod frame;
pub mod frames;

pub use command::{Command, FrameError, PowerState};
pub use frame::{pack_data, pack_words, Frame, FrameBuilder};

/// Last firmware major version known to work
pub const LAST_KNOWN_GOOD_MAJOR: u8 = 2;

/// Command opcodes
pub mod opcodes {
    /// Enter programming mode (Vpp on, PC reset to 0)
    pub const ENTER_PROGRAMMING: u8 = b'P';
    /// Exit programming mode
    pub const EXIT_PROGRAMMING: u8 = b'p';
    /// Bulk erase program memory (and configuration memory when PC >= 0x2000)
    pub const ERASE_PROGRAM: u8 = b'E';
    /// Bulk erase EEPROM data memory
    pub const ERASE_DATA: u8 = b'e';
    /// Write one program word (lo, hi) and increment the PC
    pub const WRITE_WORD: u8 = b'W';
    /// Write one EEPROM byte and increment the PC
    pub const WRITE_DATA: u8 = b'D';
    /// Load configuration: move the PC to 0x2000
    pub const JUMP_TO_CONFIG: u8 = b'C';
    /// Increment the PC by a 16-bit count (lo, hi)
    pub const INCREMENT: u8 = b'I';
    /// Read four program words
    pub const READ_PROGRAM: u8 = b'R';
    /// Read eight EEPROM bytes
    pub const READ_DATA: u8 = b'r';
    /// Set chip power and the 2.5 kHz oscillator
    pub const POWER: u8 = b'V';
    /// Report the firmware version
    pub const VERSION: u8 = b'v';
    /// Compute program and EEPROM checksums (plen lo, hi, elen lo, hi)
    pub const CHECKSUM: u8 = b'S';
    /// No operation
    pub const NOP: u8 = b'Z';
}
