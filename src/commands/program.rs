//! Program and extract

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use pkflash_core::chip::Registry;
use pkflash_core::device;

use super::{load_hex_file, BarProgress, CmdResult, PicSession};

/// Write a hex file to the chip
///
/// With `keep_old`, OSCCAL and the bandgap bits already on the chip survive;
/// otherwise the values from the file (or their defaults) are written.
pub fn run_program(
    session: &mut PicSession,
    registry: &Registry,
    path: &Path,
    keep_old: bool,
) -> CmdResult {
    let chip = device::resolve_chip(session, registry)?;
    let mut state = chip.state;
    load_hex_file(&mut state, path)?;

    if !keep_old && chip.chip.preserves_calibration() {
        log::warn!("Overwriting OSCCAL and bandgap bits of PIC{}", chip.chip.name);
    }

    device::write(session, &mut state, keep_old, &mut BarProgress::new())?;

    println!(
        "Wrote {} program words and {} EEPROM bytes (checksum 0x{:04X})",
        state.max_prog, state.max_ee, state.checksum
    );
    Ok(())
}

/// Read the chip into a hex file
pub fn run_extract(session: &mut PicSession, registry: &Registry, path: &Path) -> CmdResult {
    let file = File::create(path)
        .map_err(|e| format!("Could not create {}: {}", path.display(), e))?;

    let mut chip = device::resolve_chip(session, registry)?;
    device::read(session, &mut chip.state, &mut BarProgress::new())?;

    chip.state.store_hex(BufWriter::new(file))?;

    println!(
        "Read PIC{} into {} (checksum 0x{:04X})",
        chip.chip.name,
        path.display(),
        chip.state.checksum
    );
    Ok(())
}
