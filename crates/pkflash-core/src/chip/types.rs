//! Chip descriptor type

use std::borrow::Cow;

use super::Features;

/// Bits of the device ID word that carry the silicon revision
pub const REVISION_MASK: u16 = 0x001F;

/// Bits of the device ID word that identify the part
pub const ID_MASK: u16 = !REVISION_MASK;

/// Device ID marking the end of a chip table
pub const SENTINEL_ID: u16 = 0xFFFF;

/// Static description of one supported PIC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipDescriptor {
    /// Device ID with the revision bits cleared
    pub id: u16,
    /// Part name without the "PIC" prefix (e.g. "12F675")
    pub name: Cow<'static, str>,
    /// Number of program memory words
    pub program_words: usize,
    /// Number of EEPROM data bytes
    pub eeprom_bytes: usize,
    /// Capability flags
    pub features: Features,
    /// Writable bits of the CONFIG word
    pub config_mask: u16,
}

impl ChipDescriptor {
    /// Create a descriptor for a compiled-in table
    pub const fn new(
        id: u16,
        name: &'static str,
        program_words: usize,
        eeprom_bytes: usize,
        features: Features,
        config_mask: u16,
    ) -> Self {
        Self {
            id,
            name: Cow::Borrowed(name),
            program_words,
            eeprom_bytes,
            features,
            config_mask,
        }
    }

    /// Table terminator
    pub const fn sentinel() -> Self {
        Self::new(SENTINEL_ID, "Last Device Entry", 0, 0, Features::empty(), 0)
    }

    /// Check if this entry terminates a chip table
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }

    /// Check if OSCCAL and bandgap bits must survive an erase
    pub fn preserves_calibration(&self) -> bool {
        self.features.contains(Features::OSCCAL)
    }

    /// Split a raw device ID word into (lookup key, revision)
    pub fn split_id(raw: u16) -> (u16, u8) {
        (raw & ID_MASK, (raw & REVISION_MASK) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_id() {
        assert_eq!(ChipDescriptor::split_id(0x0FC3), (0x0FC0, 3));
        assert_eq!(ChipDescriptor::split_id(0x1340), (0x1340, 0));
        assert_eq!(ChipDescriptor::split_id(0x135F), (0x1340, 0x1F));
    }
}
