//! Chip state container

use super::{
    BANDGAP_MASK, BANDGAP_SHIFT, DEFAULT_CALIBRATION, DEFAULT_CONFIG, ERASED_BYTE, ERASED_WORD,
    MAX_EEPROM_BYTES, MAX_PROGRAM_WORDS, USER_ID_WORDS,
};
use crate::chip::ChipDescriptor;

/// Configuration memory of a chip plus the checksums the programmer reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    /// OSCCAL word at 0x3FF
    pub calibration: u16,
    /// User ID words at 0x2000..0x2004
    pub user_id: [u16; USER_ID_WORDS],
    /// CONFIG word at 0x2007
    pub config: u16,
    /// OSCCAL and bandgap bits must survive an erase
    pub preserve_calibration: bool,
    /// Writable bits of the CONFIG word
    pub config_mask: u16,
    /// Program checksum reported by the programmer's 'S' command
    pub device_checksum: u16,
    /// Low byte of the EEPROM checksum reported by 'S'
    pub device_ee_checksum: u8,
    /// The source hex file supplied a CONFIG word
    pub explicit_config: bool,
}

impl Default for ConfigBlock {
    fn default() -> Self {
        Self {
            calibration: DEFAULT_CALIBRATION,
            user_id: [ERASED_WORD; USER_ID_WORDS],
            config: DEFAULT_CONFIG,
            preserve_calibration: false,
            config_mask: 0,
            device_checksum: 0,
            device_ee_checksum: 0,
            explicit_config: false,
        }
    }
}

impl ConfigBlock {
    /// CONFIG word restricted to its writable bits
    pub fn masked_config(&self) -> u16 {
        self.config & self.config_mask
    }

    /// Bandgap level (0..=3) encoded in the CONFIG word
    pub fn bandgap(&self) -> u8 {
        ((self.config & BANDGAP_MASK) >> BANDGAP_SHIFT) as u8
    }

    /// This block with OSCCAL and bandgap bits taken from `old`
    pub fn merged_with(&self, old: &ConfigBlock) -> ConfigBlock {
        let mut merged = self.clone();
        merged.calibration = old.calibration;
        merged.config = (old.config & BANDGAP_MASK) | (self.config & !BANDGAP_MASK);
        merged
    }

    /// Programmer checksum combined with the masked CONFIG word
    ///
    /// This is the figure the PICkit Windows software shows, and matches
    /// [`MemoryState::software_checksum`] for an unprotected chip.
    pub fn device_total_checksum(&self) -> u16 {
        self.device_checksum.wrapping_add(self.masked_config())
    }
}

/// Everything that can be programmed into a 14-bit PIC
///
/// Every field starts at its erased value, so a state that was only
/// partially filled is still a valid chip image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryState {
    /// Program memory words
    pub program: Vec<u16>,
    /// EEPROM data bytes
    pub eeprom: Vec<u8>,
    /// Number of leading program words that were written
    pub max_prog: usize,
    /// Number of leading EEPROM bytes that were written
    pub max_ee: usize,
    /// Software checksum, see [`MemoryState::compute_checksum`]
    pub checksum: u16,
    /// Configuration memory
    pub config: ConfigBlock,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::with_lengths(MAX_PROGRAM_WORDS, MAX_EEPROM_BYTES)
    }
}

impl MemoryState {
    /// Create an erased state with the given memory sizes
    ///
    /// Sizes are clamped to the largest 14-bit part.
    pub fn with_lengths(program_words: usize, eeprom_bytes: usize) -> Self {
        let program_words = program_words.min(MAX_PROGRAM_WORDS);
        let eeprom_bytes = eeprom_bytes.min(MAX_EEPROM_BYTES);
        Self {
            program: vec![ERASED_WORD; program_words],
            eeprom: vec![ERASED_BYTE; eeprom_bytes],
            max_prog: 0,
            max_ee: 0,
            checksum: 0,
            config: ConfigBlock::default(),
        }
    }

    /// Create an erased state sized and configured for `chip`
    pub fn for_chip(chip: &ChipDescriptor) -> Self {
        let mut state = Self::with_lengths(chip.program_words, chip.eeprom_bytes);
        state.config.preserve_calibration = chip.preserves_calibration();
        state.config.config_mask = chip.config_mask;
        state
    }

    /// Number of program words on the chip
    pub fn program_len(&self) -> usize {
        self.program.len()
    }

    /// Number of EEPROM bytes on the chip
    pub fn eeprom_len(&self) -> usize {
        self.eeprom.len()
    }

    /// Sum of all program words plus the masked CONFIG word, modulo 2^16
    ///
    /// Code protection is not taken into account.
    pub fn software_checksum(&self) -> u16 {
        self.program
            .iter()
            .fold(self.config.masked_config(), |sum, &w| sum.wrapping_add(w))
    }

    /// Compute the software checksum and store it in [`MemoryState::checksum`]
    pub fn compute_checksum(&mut self) -> u16 {
        self.checksum = self.software_checksum();
        self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Registry;

    #[test]
    fn test_default_is_erased() {
        let state = MemoryState::default();
        assert_eq!(state.program_len(), MAX_PROGRAM_WORDS);
        assert_eq!(state.eeprom_len(), MAX_EEPROM_BYTES);
        assert!(state.program.iter().all(|&w| w == 0x3FFF));
        assert!(state.eeprom.iter().all(|&b| b == 0xFF));
        assert_eq!(state.max_prog, 0);
        assert_eq!(state.max_ee, 0);
        assert_eq!(state.config.calibration, 0x2000);
        assert_eq!(state.config.user_id, [0x3FFF; 4]);
        assert_eq!(state.config.config, 0x184);
        assert!(!state.config.preserve_calibration);
        assert_eq!(state.config.config_mask, 0);
    }

    #[test]
    fn test_for_chip_sizes_buffers() {
        let registry = Registry::builtin();
        let chip = registry.lookup(0x0FC0).unwrap();
        let state = MemoryState::for_chip(chip);

        assert_eq!(state.program_len(), 0x3FF);
        assert_eq!(state.eeprom_len(), 128);
        assert!(state.config.preserve_calibration);
        assert_eq!(state.config.config_mask, 0x1FF);
    }

    #[test]
    fn test_lengths_are_clamped() {
        let state = MemoryState::with_lengths(0x10000, 1024);
        assert_eq!(state.program_len(), MAX_PROGRAM_WORDS);
        assert_eq!(state.eeprom_len(), MAX_EEPROM_BYTES);
    }

    #[test]
    fn test_checksum() {
        let mut state = MemoryState::with_lengths(4, 0);
        state.program.copy_from_slice(&[0x0001, 0x0002, 0x3FFF, 0x2800]);
        state.config.config = 0x31C4;
        state.config.config_mask = 0x01FF;

        let expected = 0x0001u16 + 0x0002 + 0x3FFF + 0x2800 + (0x31C4 & 0x01FF);
        assert_eq!(state.compute_checksum(), expected);
        assert_eq!(state.checksum, expected);
    }

    #[test]
    fn test_checksum_wraps() {
        let mut state = MemoryState::with_lengths(8, 0);
        state.program.fill(0x3FFF);
        state.config.config_mask = 0;
        assert_eq!(state.compute_checksum(), 0x3FFFu16.wrapping_mul(8));
    }

    #[test]
    fn test_merge_keeps_calibration_and_bandgap() {
        let old = ConfigBlock {
            calibration: 0x3480,
            config: 0x2000 | 0x01FF,
            ..ConfigBlock::default()
        };
        let new = ConfigBlock {
            calibration: 0x3400,
            user_id: [1, 2, 3, 4],
            config: 0x1000 | 0x0184,
            ..ConfigBlock::default()
        };

        let merged = new.merged_with(&old);
        assert_eq!(merged.calibration, 0x3480);
        assert_eq!(merged.config, 0x2184);
        assert_eq!(merged.bandgap(), 2);
        assert_eq!(merged.user_id, [1, 2, 3, 4]);
    }
}
