//! Programmer abstraction
//!
//! A programmer is anything that can carry PICkit 1 command frames to a chip
//! and hand back the response bytes: the real USB device, or an emulator.

mod traits;

pub use traits::{Transport, TransportError, FRAME_LEN};
