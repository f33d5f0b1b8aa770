//! PICkit 1 device implementation
//!
//! The programmer is a low-speed device, so frames travel over interrupt
//! endpoints: one 8-byte OUT transfer per frame, one 8-byte IN transfer per
//! response report.

use nusb::transfer::{Buffer, In, Interrupt, Out};
use nusb::{Endpoint, MaybeFuture};
use pkflash_core::programmer::{Transport, TransportError, FRAME_LEN};

use crate::error::{transfer_error, Result, UsbError};
use crate::protocol::*;

/// PICkit 1 USB programmer
pub struct PickitUsb {
    /// Interrupt OUT endpoint for command frames
    out_ep: Endpoint<Interrupt, Out>,
    /// Interrupt IN endpoint for response reports
    in_ep: Endpoint<Interrupt, In>,
}

impl PickitUsb {
    /// Open the first PICkit 1 on the bus
    pub fn open() -> Result<Self> {
        Self::open_nth(0)
    }

    /// Open the nth PICkit 1 (0-indexed)
    pub fn open_nth(index: usize) -> Result<Self> {
        log::info!(
            "Locating USB Microchip PICkit 1 (vendor 0x{:04x}/product 0x{:04x})",
            PICKIT_USB_VENDOR,
            PICKIT_USB_PRODUCT
        );

        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == PICKIT_USB_VENDOR && d.product_id() == PICKIT_USB_PRODUCT)
            .collect();

        let device_info = devices.get(index).ok_or(UsbError::DeviceNotFound)?;

        log::info!(
            "Found PICkit 1 at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?;

        let active = device
            .active_configuration()
            .map(|c| c.configuration_value())
            .ok();
        if active != Some(PICKIT_CONFIGURATION) {
            log::debug!("Selecting configuration {}", PICKIT_CONFIGURATION);
            device
                .set_configuration(PICKIT_CONFIGURATION)
                .wait()
                .map_err(|e| UsbError::OpenFailed(e.to_string()))?;
        }

        // The HID driver likes to grab the interface
        let interface = device
            .detach_and_claim_interface(PICKIT_INTERFACE)
            .wait()
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Interrupt, Out>(WRITE_EP)
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;
        let in_ep = interface
            .endpoint::<Interrupt, In>(READ_EP)
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        Ok(Self { out_ep, in_ep })
    }

    /// List all connected PICkit 1 programmers
    pub fn list_devices() -> Result<Vec<PickitDeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == PICKIT_USB_VENDOR && d.product_id() == PICKIT_USB_PRODUCT)
            .map(|d| PickitDeviceInfo {
                bus: d.busnum(),
                address: d.device_address(),
            })
            .collect();

        Ok(devices)
    }

    /// Read one 8-byte report
    fn read_report(&mut self, report: &mut [u8]) -> std::result::Result<(), TransportError> {
        self.in_ep.submit(Buffer::new(FRAME_LEN));

        let Some(completion) = self.in_ep.wait_next_complete(USB_TIMEOUT) else {
            self.drain_in();
            return Err(TransportError::Timeout);
        };
        completion.status.map_err(transfer_error)?;

        if completion.actual_len != report.len() {
            return Err(TransportError::ShortTransfer {
                expected: report.len(),
                actual: completion.actual_len,
            });
        }
        report.copy_from_slice(&completion.buffer[..report.len()]);
        Ok(())
    }

    fn drain_in(&mut self) {
        self.in_ep.cancel_all();
        while self.in_ep.pending() > 0 {
            let _ = self.in_ep.wait_next_complete(USB_TIMEOUT);
        }
    }

    fn drain_out(&mut self) {
        self.out_ep.cancel_all();
        while self.out_ep.pending() > 0 {
            let _ = self.out_ep.wait_next_complete(USB_TIMEOUT);
        }
    }
}

impl Transport for PickitUsb {
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> std::result::Result<(), TransportError> {
        self.out_ep.submit(Buffer::from(frame.to_vec()));

        let Some(completion) = self.out_ep.wait_next_complete(USB_TIMEOUT) else {
            self.drain_out();
            return Err(TransportError::Timeout);
        };
        completion.status.map_err(transfer_error)?;

        if completion.actual_len != FRAME_LEN {
            return Err(TransportError::ShortTransfer {
                expected: FRAME_LEN,
                actual: completion.actual_len,
            });
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<(), TransportError> {
        for report in buf.chunks_mut(FRAME_LEN) {
            self.read_report(report)?;
        }
        Ok(())
    }
}

impl Drop for PickitUsb {
    fn drop(&mut self) {
        // Pending transfers must be reaped before the interface goes away
        self.drain_out();
        self.drain_in();
        log::debug!("PICkit 1 released");
    }
}

/// Information about a connected PICkit 1
#[derive(Debug, Clone)]
pub struct PickitDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
}

impl std::fmt::Display for PickitDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PICkit 1 at bus {} address {}", self.bus, self.address)
    }
}
