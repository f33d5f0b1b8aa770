//! Verify and blank check

use std::path::Path;

use pkflash_core::chip::Registry;
use pkflash_core::device;
use pkflash_core::error::Category;

use super::{load_hex_file, BarProgress, CmdResult, PicSession};

fn report_failures(failed: &[Category], what: &str) -> CmdResult {
    for category in failed {
        eprintln!("Error: {} {}", category, what);
    }
    Err(format!("{} memory areas failed", failed.len()).into())
}

/// Compare the chip with a hex file
///
/// With `all`, every memory area is checked and each mismatch reported;
/// otherwise the first mismatch is the error.
pub fn run_verify(
    session: &mut PicSession,
    registry: &Registry,
    path: &Path,
    all: bool,
) -> CmdResult {
    let mut chip = device::resolve_chip(session, registry)?;

    let mut file = chip.blank_state();
    load_hex_file(&mut file, path)?;
    file.compute_checksum();

    device::read(session, &mut chip.state, &mut BarProgress::new())?;
    log::info!(
        "Checksum: file 0x{:04X}, device 0x{:04X}",
        file.checksum,
        chip.state.checksum
    );

    if all {
        let failed = device::compare(&file, &chip.state);
        if !failed.is_empty() {
            return report_failures(&failed, "does not match with .hex file");
        }
    } else {
        device::verify(&file, &chip.state)?;
    }

    println!("Device successfully verified with {}", path.display());
    Ok(())
}

/// Check that the chip is erased
pub fn run_blank_check(session: &mut PicSession, registry: &Registry, all: bool) -> CmdResult {
    let mut chip = device::resolve_chip(session, registry)?;
    device::read(session, &mut chip.state, &mut BarProgress::new())?;

    if all {
        let failed = device::check_blank(&chip.state);
        if !failed.is_empty() {
            return report_failures(&failed, "is not blank");
        }
    } else {
        device::blank_check(&chip.state)?;
    }

    println!("Device is blank");
    Ok(())
}
