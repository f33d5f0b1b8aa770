//! PICkit 1 USB constants

use std::time::Duration;

/// Microchip Technology
pub const PICKIT_USB_VENDOR: u16 = 0x04D8;
/// PICkit 1 FLASH Starter Kit
pub const PICKIT_USB_PRODUCT: u16 = 0x0032;

/// Vendor-specific configuration (1 is the HID configuration)
pub const PICKIT_CONFIGURATION: u8 = 2;
pub const PICKIT_INTERFACE: u8 = 0;

/// Interrupt OUT endpoint
pub const WRITE_EP: u8 = 0x01;
/// Interrupt IN endpoint
pub const READ_EP: u8 = 0x81;

/// Timeout of every transfer
pub const USB_TIMEOUT: Duration = Duration::from_millis(1000);
