//! Configuration memory report

use pkflash_core::chip::Registry;
use pkflash_core::device::{self, ConfigReport};
use pkflash_core::memory::{CALIBRATION_ADDR, USER_ID_ADDR, USER_ID_MASK, USER_ID_WORDS};

use super::{CmdResult, PicSession};

const WORD_LABELS: [&str; 8] = [
    "User ID 0",
    "User ID 1",
    "User ID 2",
    "User ID 3",
    "Reserved",
    "Reserved",
    "Device ID",
    "CONFIG",
];

/// Render a configuration report
pub fn format_config_report(report: &ConfigReport) -> String {
    let mut out = String::new();

    if let Some(calibration) = report.calibration {
        out.push_str(&format!(
            "{:<18}[0x{:04X}] 0x{:04X}\n",
            "OSCCAL:", CALIBRATION_ADDR, calibration
        ));
    }

    for (i, (label, word)) in WORD_LABELS.iter().zip(report.words).enumerate() {
        let address = USER_ID_ADDR + i as u32;
        let label = format!("{}:", label);
        if i < USER_ID_WORDS {
            out.push_str(&format!(
                "{:<18}[0x{:04X}] 0x{:02X}\n",
                label,
                address,
                word & USER_ID_MASK
            ));
        } else {
            out.push_str(&format!("{:<18}[0x{:04X}] 0x{:04X}\n", label, address, word));
        }
    }

    out.push_str(&format!("{:<18}0x{:04X}\n", "Masked CONFIG:", report.masked_config()));
    if let Some(bandgap) = report.bandgap() {
        out.push_str(&format!("{:<18}{}\n", "Bandgap:", bandgap));
    }

    out.push('\n');
    out.push_str(&format!("{:<18}0x{:04X}\n", "Program checksum:", report.device_checksum));
    out.push_str(&format!("{:<18}0x{:04X}\n", "Total checksum:", report.total_checksum()));
    out.push_str(&format!("{:<18}0x{:02X}\n", "EEPROM checksum:", report.device_ee_checksum));
    out
}

/// Read and print configuration memory and the programmer checksums
pub fn run_config(session: &mut PicSession, registry: &Registry) -> CmdResult {
    let mut chip = device::resolve_chip(session, registry)?;
    let report = device::read_config_report(session, &mut chip.state)?;

    println!("PIC{} Rev {}", chip.chip.name, chip.revision);
    println!();
    print!("{}", format_config_report(&report));
    Ok(())
}
