//! Program and EEPROM memory dumps

use pkflash_core::chip::Registry;
use pkflash_core::device;
use pkflash_core::memory::MemoryState;

use super::{BarProgress, CmdResult, PicSession};

const WORDS_PER_LINE: usize = 8;

/// Program memory, eight words per line
///
/// On chips that keep their calibration there, OSCCAL is shown as the word
/// after the last program word.
pub fn format_program_map(state: &MemoryState) -> String {
    let mut words = state.program.clone();
    if state.config.preserve_calibration {
        words.push(state.config.calibration);
    }

    let mut out = String::from("Program memory:\n");
    for (i, line) in words.chunks(WORDS_PER_LINE).enumerate() {
        let cells: Vec<String> = line.iter().map(|w| format!("0x{:04X}", w)).collect();
        out.push_str(&format!("0x{:04X}: {}\n", i * WORDS_PER_LINE, cells.join(" ")));
    }
    out
}

/// EEPROM data memory, eight bytes per line
pub fn format_eeprom_map(state: &MemoryState) -> String {
    let mut out = String::from("EEPROM data memory:\n");
    if state.eeprom.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, line) in state.eeprom.chunks(WORDS_PER_LINE).enumerate() {
        let cells: Vec<String> = line.iter().map(|b| format!("0x{:02X}", b)).collect();
        out.push_str(&format!("0x{:02X}: {}\n", i * WORDS_PER_LINE, cells.join(" ")));
    }
    out
}

/// Read the chip and print both memory maps
pub fn run_memory_map(session: &mut PicSession, registry: &Registry) -> CmdResult {
    let mut chip = device::resolve_chip(session, registry)?;
    device::read(session, &mut chip.state, &mut BarProgress::new())?;

    println!("{}", format_program_map(&chip.state));
    print!("{}", format_eeprom_map(&chip.state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_map_includes_calibration() {
        let registry = Registry::builtin();
        let mut state = MemoryState::for_chip(registry.find_by_name("12F675").unwrap());
        state.program[0] = 0x2805;
        state.config.calibration = 0x3480;

        let map = format_program_map(&state);
        let lines: Vec<&str> = map.lines().collect();
        // 0x3FF program words plus OSCCAL, eight per line
        assert_eq!(lines.len(), 1 + 0x400 / 8);
        assert!(lines[1].starts_with("0x0000: 0x2805 0x3FFF"));
        assert!(lines.last().unwrap().ends_with("0x3FFF 0x3480"));
    }

    #[test]
    fn test_program_map_without_calibration() {
        let registry = Registry::builtin();
        let state = MemoryState::for_chip(registry.find_by_name("16F689").unwrap());
        let map = format_program_map(&state);
        assert_eq!(map.lines().count(), 1 + 0x1000 / 8);
        assert!(map.lines().last().unwrap().starts_with("0x0FF8: "));
    }

    #[test]
    fn test_eeprom_map() {
        let mut state = MemoryState::with_lengths(8, 16);
        state.eeprom[9] = 0x42;
        assert_eq!(
            format_eeprom_map(&state),
            "EEPROM data memory:\n\
             0x00: 0xFF 0xFF 0xFF 0xFF 0xFF 0xFF 0xFF 0xFF\n\
             0x08: 0xFF 0x42 0xFF 0xFF 0xFF 0xFF 0xFF 0xFF\n"
        );
    }

    #[test]
    fn test_eeprom_map_empty() {
        let state = MemoryState::with_lengths(8, 0);
        assert_eq!(format_eeprom_map(&state), "EEPROM data memory:\n  (none)\n");
    }
}
