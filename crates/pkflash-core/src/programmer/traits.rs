//! Transport trait

use std::time::Duration;

use thiserror::Error;

/// Size of every command frame and every response report
pub const FRAME_LEN: usize = 8;

/// A failed exchange with the programmer
///
/// The frame protocol has no way to resynchronize, so every variant is
/// fatal for the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transfer did not complete within the programmer timeout
    #[error("USB transfer timed out")]
    Timeout,
    /// The transfer moved fewer bytes than requested
    #[error("Short USB transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        /// Bytes requested
        expected: usize,
        /// Bytes actually transferred
        actual: usize,
    },
    /// Any other USB failure
    #[error("USB transfer failed: {0}")]
    Usb(String),
}

/// Carries 8-byte command frames to the programmer
///
/// Implementations must treat any incomplete transfer as an error; partial
/// frames are never retried.
pub trait Transport {
    /// Send one command frame
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), TransportError>;

    /// Receive exactly `buf.len()` response bytes
    ///
    /// `buf.len()` is always a multiple of [`FRAME_LEN`]; longer reads are
    /// satisfied by consecutive reports.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Wait while the chip runs on its own
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), TransportError> {
        (**self).write_frame(frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read(buf)
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), TransportError> {
        (**self).write_frame(frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read(buf)
    }

    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration)
    }
}
