//! Erase, bandgap programming and OSCCAL regeneration
//!
//! All three bulk erase the chip. OSCCAL is restored afterwards on chips
//! that carry one.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pkflash_core::chip::Registry;
use pkflash_core::device;
use pkflash_core::Error;

use super::{load_hex_file, BarProgress, CmdResult, PicSession};

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Erase the chip
pub fn run_erase(session: &mut PicSession, registry: &Registry) -> CmdResult {
    let chip = device::resolve_chip(session, registry)?;

    let pb = spinner("Erasing...")?;
    let result = device::erase(session, &chip.state);
    pb.finish_and_clear();
    result?;

    println!("PIC{} erased", chip.chip.name);
    Ok(())
}

/// Erase the chip and program new bandgap bits
pub fn run_bandgap(session: &mut PicSession, registry: &Registry, level: u8) -> CmdResult {
    let chip = device::resolve_chip(session, registry)?;
    device::set_bandgap(session, &chip, level)?;

    println!("Bandgap {} programmed into PIC{}", level, chip.chip.name);
    Ok(())
}

/// Run the calibration firmware and program the OSCCAL value it measures
///
/// `autocal` is programmed first, keeping the current OSCCAL and bandgap
/// bits, then the session is reopened before the measurement.
pub fn run_osccal_regen(session: &mut PicSession, registry: &Registry, autocal: &Path) -> CmdResult {
    let chip = device::resolve_chip(session, registry)?;
    if !chip.chip.preserves_calibration() {
        return Err(Error::UnsupportedOperation {
            chip: chip.chip.name.to_string(),
            operation: "OSCCAL regeneration",
        }
        .into());
    }

    let mut firmware = chip.blank_state();
    load_hex_file(&mut firmware, autocal)?;
    device::write(session, &mut firmware, true, &mut BarProgress::new())?;

    session.reopen()?;

    let pb = spinner("Measuring reference oscillator...")?;
    let result = device::regenerate_calibration(session, &chip);
    pb.finish_and_clear();
    let recal = result?;

    println!("OSCCAL 0x{:04X} programmed", recal.calibration);
    println!("CONFIG 0x{:04X} programmed", recal.config);
    Ok(())
}
