//! Programmable state of a 14-bit PIC
//!
//! A [`MemoryState`] holds everything that can be written to or read from a
//! chip: program words, EEPROM bytes, and the configuration block (OSCCAL,
//! user IDs, CONFIG word). Hex files address all of these in one word
//! address space; [`Span`]s describe where each region lives in it.

mod hexfile;
mod span;
mod state;

pub use span::{Region, Span};
pub use state::{ConfigBlock, MemoryState};

/// Largest program memory of any 14-bit PIC, in words
pub const MAX_PROGRAM_WORDS: usize = 0x2000;

/// Largest EEPROM of any 14-bit PIC, in bytes
pub const MAX_EEPROM_BYTES: usize = 256;

/// Value of an erased program word (14 bits set)
pub const ERASED_WORD: u16 = 0x3FFF;

/// Value of an erased EEPROM byte
pub const ERASED_BYTE: u8 = 0xFF;

/// Number of user ID words
pub const USER_ID_WORDS: usize = 4;

/// Usable bits of each user ID word
pub const USER_ID_MASK: u16 = 0x007F;

/// Bandgap calibration bits of the CONFIG word
pub const BANDGAP_MASK: u16 = 0x3000;

/// Shift of the bandgap bits within the CONFIG word
pub const BANDGAP_SHIFT: u16 = 12;

/// Word address of the first user ID (also where 'C' moves the PC)
pub const USER_ID_ADDR: u32 = 0x2000;

/// Word address of the device ID word
pub const DEVICE_ID_ADDR: u32 = 0x2006;

/// Word address of the CONFIG word
pub const CONFIG_ADDR: u32 = 0x2007;

/// Word address of EEPROM data in hex files
pub const EEPROM_ADDR: u32 = 0x2100;

/// Word address of the factory OSCCAL word
pub const CALIBRATION_ADDR: u32 = 0x03FF;

/// CONFIG word assumed when a hex file does not supply one
///
/// Disables the watchdog and code protection and selects INTOSCIO on the
/// 12F parts.
pub const DEFAULT_CONFIG: u16 = 0x0184;

/// OSCCAL word assumed before the chip is read
pub const DEFAULT_CALIBRATION: u16 = 0x2000;

/// High byte turning a calibration value into a RETLW instruction
pub const RETLW: u16 = 0x3400;
