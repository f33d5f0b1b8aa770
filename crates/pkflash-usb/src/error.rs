//! Error types for the PICkit 1 USB programmer

use std::fmt;

use pkflash_core::programmer::TransportError;

/// Result type for USB setup
pub type Result<T> = std::result::Result<T, UsbError>;

/// Errors that can occur while opening the programmer
///
/// Failures after the programmer is open are reported as
/// [`TransportError`]s through the `Transport` trait.
#[derive(Debug)]
pub enum UsbError {
    /// No PICkit 1 on the bus
    DeviceNotFound,
    /// Failed to open the device or select its configuration
    OpenFailed(String),
    /// Failed to claim the interface or its endpoints
    ClaimFailed(String),
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbError::DeviceNotFound => {
                write!(f, "PICkit 1 not found (VID:04d8 PID:0032)")
            }
            UsbError::OpenFailed(msg) => write!(f, "Failed to open PICkit 1: {}", msg),
            UsbError::ClaimFailed(msg) => write!(f, "Failed to claim interface: {}", msg),
        }
    }
}

impl std::error::Error for UsbError {}

pub(crate) fn transfer_error(e: nusb::transfer::TransferError) -> TransportError {
    TransportError::Usb(e.to_string())
}
