//! pkflash-usb - PICkit 1 USB programmer support
//!
//! This crate talks to a Microchip PICkit 1 FLASH Starter Kit over USB and
//! implements [`Transport`](pkflash_core::programmer::Transport) for it.
//!
//! # Protocol Overview
//!
//! The PICkit 1 runs its vendor-specific configuration 2 with a single
//! interface carrying one interrupt endpoint in each direction. Every
//! transfer is exactly 8 bytes: command frames go out, response reports come
//! in. A short or timed-out transfer leaves the firmware's frame parser in
//! an unknown state, so it is always reported as an error.
//!
//! # Example
//!
//! ```no_run
//! use pkflash_core::device::Session;
//! use pkflash_usb::PickitUsb;
//!
//! let pickit = PickitUsb::open()?;
//! let session = Session::open(pickit)?;
//! println!("firmware {}", session.firmware());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod device;
mod error;
mod protocol;

pub use device::{PickitDeviceInfo, PickitUsb};
pub use error::{Result, UsbError};
pub use protocol::{PICKIT_USB_PRODUCT, PICKIT_USB_VENDOR};
