//! Verify and blank check
//!
//! Both come in two forms: [`verify`] and [`blank_check`] stop at the first
//! failing category and return it as an error, while [`compare`] and
//! [`check_blank`] test every category and list all that failed.

use crate::error::{Category, Error, Result};
use crate::memory::{MemoryState, ERASED_BYTE, ERASED_WORD, USER_ID_MASK};

/// Categories checked by verify, in order
const VERIFY_ORDER: [Category; 5] = [
    Category::Program,
    Category::Checksum,
    Category::ConfigWord,
    Category::UserId,
    Category::Eeprom,
];

/// Categories checked by blank check, in order
const BLANK_ORDER: [Category; 4] = [
    Category::Program,
    Category::ConfigWord,
    Category::UserId,
    Category::Eeprom,
];

fn matches(category: Category, file: &MemoryState, device: &MemoryState) -> bool {
    let mask = device.config.config_mask;
    match category {
        Category::Program => {
            (0..device.program_len()).all(|i| file.program.get(i) == device.program.get(i))
        }
        Category::Checksum => file.software_checksum() == device.software_checksum(),
        Category::ConfigWord => file.config.config & mask == device.config.config & mask,
        Category::UserId => file
            .config
            .user_id
            .iter()
            .zip(&device.config.user_id)
            .all(|(a, b)| a & USER_ID_MASK == b & USER_ID_MASK),
        Category::Eeprom => {
            (0..device.eeprom_len()).all(|i| file.eeprom.get(i) == device.eeprom.get(i))
        }
    }
}

fn is_blank(category: Category, state: &MemoryState) -> bool {
    let mask = state.config.config_mask;
    match category {
        Category::Program => state.program.iter().all(|&w| w == ERASED_WORD),
        Category::ConfigWord => state.config.config & mask == ERASED_WORD & mask,
        Category::UserId => state
            .config
            .user_id
            .iter()
            .all(|&id| id & USER_ID_MASK == USER_ID_MASK),
        Category::Eeprom => state.eeprom.iter().all(|&b| b == ERASED_BYTE),
        Category::Checksum => true,
    }
}

/// Compare a hex file image with what was read from the device
///
/// Lengths and the configuration mask are taken from `device`.
pub fn verify(file: &MemoryState, device: &MemoryState) -> Result<()> {
    match VERIFY_ORDER.into_iter().find(|&c| !matches(c, file, device)) {
        Some(category) => Err(Error::VerifyMismatch(category)),
        None => Ok(()),
    }
}

/// Every category in which `file` and `device` differ
pub fn compare(file: &MemoryState, device: &MemoryState) -> Vec<Category> {
    VERIFY_ORDER
        .into_iter()
        .filter(|&c| !matches(c, file, device))
        .collect()
}

/// Check that a state read from the device is erased
pub fn blank_check(state: &MemoryState) -> Result<()> {
    match BLANK_ORDER.into_iter().find(|&c| !is_blank(c, state)) {
        Some(category) => Err(Error::NotBlank(category)),
        None => Ok(()),
    }
}

/// Every category that is not erased
pub fn check_blank(state: &MemoryState) -> Vec<Category> {
    BLANK_ORDER
        .into_iter()
        .filter(|&c| !is_blank(c, state))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Registry;

    fn chip_state(id: u16) -> MemoryState {
        let registry = Registry::builtin();
        MemoryState::for_chip(registry.lookup(id).unwrap())
    }

    /// State as read back from a bulk-erased chip
    fn erased_state(id: u16) -> MemoryState {
        let mut state = chip_state(id);
        state.config.config = ERASED_WORD;
        state
    }

    #[test]
    fn test_erased_state_is_blank() {
        assert!(blank_check(&MemoryState::default()).is_ok());
        for chip in Registry::builtin().iter() {
            let mut state = MemoryState::for_chip(chip);
            state.config.config = ERASED_WORD;
            assert!(blank_check(&state).is_ok(), "PIC{}", chip.name);
            assert!(check_blank(&state).is_empty());
        }
    }

    #[test]
    fn test_default_config_is_not_blank() {
        // 0x0184 is the programming default, not the erased value
        let state = chip_state(0x0FC0);
        assert!(matches!(
            blank_check(&state),
            Err(Error::NotBlank(Category::ConfigWord))
        ));
        assert_eq!(check_blank(&state), vec![Category::ConfigWord]);
    }

    #[test]
    fn test_blank_check_first_failure() {
        let mut state = erased_state(0x0FC0);
        state.config.user_id[2] = 0x3F00;
        state.eeprom[5] = 0x00;
        assert!(matches!(
            blank_check(&state),
            Err(Error::NotBlank(Category::UserId))
        ));
        assert_eq!(check_blank(&state), vec![Category::UserId, Category::Eeprom]);
    }

    #[test]
    fn test_blank_config_uses_mask() {
        let mut state = chip_state(0x0FC0);
        // bandgap bits are outside the 12F675 mask
        state.config.config = 0x01FF;
        assert!(blank_check(&state).is_ok());

        state.config.config = 0x3FFE;
        assert!(matches!(
            blank_check(&state),
            Err(Error::NotBlank(Category::ConfigWord))
        ));
    }

    #[test]
    fn test_user_id_high_bits_ignored() {
        let mut state = erased_state(0x1340);
        state.config.user_id = [0x007F, 0x3F7F, 0x00FF, 0x017F];
        assert!(blank_check(&state).is_ok());
    }

    #[test]
    fn test_verify_identical() {
        let mut file = chip_state(0x1340);
        file.program[10] = 0x1234;
        file.eeprom[3] = 0x56;
        let device = file.clone();
        assert!(verify(&file, &device).is_ok());
        assert!(compare(&file, &device).is_empty());
    }

    #[test]
    fn test_swapped_eeprom_bytes_report_eeprom() {
        let mut file = chip_state(0x1340);
        file.eeprom[0] = 0x11;
        file.eeprom[1] = 0x22;
        let mut device = file.clone();
        device.eeprom.swap(0, 1);

        assert!(matches!(
            verify(&file, &device),
            Err(Error::VerifyMismatch(Category::Eeprom))
        ));
    }

    #[test]
    fn test_program_mismatch_reported_first() {
        let file = chip_state(0x1340);
        let mut device = file.clone();
        device.program[0] = 0x0000;
        device.eeprom[0] = 0x00;

        assert!(matches!(
            verify(&file, &device),
            Err(Error::VerifyMismatch(Category::Program))
        ));
        assert_eq!(
            compare(&file, &device),
            vec![Category::Program, Category::Checksum, Category::Eeprom]
        );
    }

    #[test]
    fn test_config_compared_under_device_mask() {
        let mut file = chip_state(0x0FC0);
        let mut device = file.clone();
        file.config.config = 0x3184;
        device.config.config = 0x0184;
        assert!(verify(&file, &device).is_ok());

        device.config.config = 0x0185;
        assert_eq!(
            compare(&file, &device),
            vec![Category::Checksum, Category::ConfigWord]
        );
    }

    #[test]
    fn test_user_ids_compared_on_low_bits() {
        let mut file = chip_state(0x1340);
        let mut device = file.clone();
        file.config.user_id = [0x0001, 0x0002, 0x0003, 0x0004];
        device.config.user_id = [0x3F81, 0x0002, 0x0003, 0x0004];
        assert!(verify(&file, &device).is_ok());

        device.config.user_id[3] = 0x0005;
        assert!(matches!(
            verify(&file, &device),
            Err(Error::VerifyMismatch(Category::UserId))
        ));
    }
}
