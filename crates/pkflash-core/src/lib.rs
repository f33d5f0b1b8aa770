//! pkflash-core - Core library for programming 14-bit PIC microcontrollers
//!
//! This crate contains everything needed to drive a Microchip PICkit 1
//! programmer, independent of how the programmer is attached:
//!
//! - [`chip`]: registry of supported devices, keyed by device ID
//! - [`hex`]: streaming reader/writer for Intel hex files
//! - [`memory`]: the programmable state of a chip and the span router that
//!   maps hex file addresses onto it
//! - [`protocol`]: the PICkit 1 command alphabet and 8-byte frame builder
//! - [`programmer`]: the [`Transport`](programmer::Transport) trait that
//!   USB and emulated programmers implement
//! - [`device`]: the programming session and every high-level operation
//!   (read, write, erase, verify, blank check, bandgap, OSCCAL regeneration)
//!
//! # Example
//!
//! ```ignore
//! use pkflash_core::chip::Registry;
//! use pkflash_core::device::{self, Session};
//! use pkflash_core::memory::MemoryState;
//!
//! let registry = Registry::builtin();
//! let mut session = Session::open(transport)?;
//! let mut chip = device::resolve_chip(&mut session, &registry)?;
//! chip.state.load_hex(std::fs::File::open("blink.hex")?)?;
//! device::write(&mut session, &mut chip.state, true, &mut device::NoProgress)?;
//! ```

pub mod chip;
pub mod device;
pub mod error;
pub mod hex;
pub mod memory;
pub mod programmer;
pub mod protocol;

pub use error::{Error, Result};
