//! Chip registry with runtime loading
//!
//! The registry starts from the compiled-in table and can be extended with
//! chip definitions from RON files. A file entry whose ID is already known
//! replaces the existing descriptor.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::builtin::CHIPS;
use super::types::{ChipDescriptor, REVISION_MASK, SENTINEL_ID};
use super::Features;
use crate::memory::{CALIBRATION_ADDR, MAX_EEPROM_BYTES, MAX_PROGRAM_WORDS};

/// Error type for chip database operations
#[derive(Debug, Error)]
pub enum ChipDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    id: u16,
    name: String,
    #[serde(default)]
    program_words: usize,
    #[serde(default)]
    eeprom_bytes: usize,
    #[serde(default)]
    osccal: bool,
    #[serde(default)]
    adapter: bool,
    #[serde(default)]
    config_mask: u16,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ChipTableDef {
    chips: Vec<ChipDef>,
}

impl ChipDef {
    fn into_descriptor(self) -> Result<ChipDescriptor, ChipDbError> {
        if self.id & REVISION_MASK != 0 {
            return Err(ChipDbError::Validation(format!(
                "{}: device ID 0x{:04X} has revision bits set",
                self.name, self.id
            )));
        }
        if self.program_words == 0 || self.program_words > MAX_PROGRAM_WORDS {
            return Err(ChipDbError::Validation(format!(
                "{}: program_words must be between 1 and 0x{:X}",
                self.name, MAX_PROGRAM_WORDS
            )));
        }
        if self.eeprom_bytes > MAX_EEPROM_BYTES {
            return Err(ChipDbError::Validation(format!(
                "{}: eeprom_bytes must not exceed {}",
                self.name, MAX_EEPROM_BYTES
            )));
        }
        if self.osccal && self.program_words > CALIBRATION_ADDR as usize {
            return Err(ChipDbError::Validation(format!(
                "{}: program memory overlaps the OSCCAL word at 0x{:04X}",
                self.name, CALIBRATION_ADDR
            )));
        }

        let mut features = Features::empty();
        features.set(Features::OSCCAL, self.osccal);
        features.set(Features::ADAPTER, self.adapter);

        Ok(ChipDescriptor {
            id: self.id,
            name: self.name.into(),
            program_words: self.program_words,
            eeprom_bytes: self.eeprom_bytes,
            features,
            config_mask: self.config_mask,
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Lookup table of supported chips
#[derive(Debug, Clone, Default)]
pub struct Registry {
    chips: Vec<ChipDescriptor>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { chips: Vec::new() }
    }

    /// Registry holding the compiled-in chip table
    pub fn builtin() -> Self {
        Self::from_table(&CHIPS)
    }

    /// Build a registry from a table, stopping at the sentinel entry
    pub fn from_table(table: &[ChipDescriptor]) -> Self {
        let chips = table
            .iter()
            .take_while(|c| !c.is_sentinel())
            .cloned()
            .collect();
        Self { chips }
    }

    /// Look up a chip by the device ID word read from the chip
    ///
    /// The revision bits are masked off before matching.
    pub fn lookup(&self, id: u16) -> Option<&ChipDescriptor> {
        let (key, _) = ChipDescriptor::split_id(id);
        self.chips.iter().find(|c| c.id == key)
    }

    /// Find a chip by name (case-insensitive, optional "PIC" prefix)
    pub fn find_by_name(&self, name: &str) -> Option<&ChipDescriptor> {
        let upper = name.to_ascii_uppercase();
        let name = upper.strip_prefix("PIC").unwrap_or(&upper);
        self.chips.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Load chip definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    ///
    /// Entries after a sentinel ID (0xFFFF) are ignored. Returns the number
    /// of definitions added or replaced.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
        let table: ChipTableDef = ron::from_str(content)?;
        let mut count = 0;

        for def in table.chips {
            if def.id == SENTINEL_ID {
                break;
            }
            let chip = def.into_descriptor()?;
            match self.chips.iter_mut().find(|c| c.id == chip.id) {
                Some(existing) => {
                    log::debug!("Replacing chip definition for PIC{}", existing.name);
                    *existing = chip;
                }
                None => self.chips.push(chip),
            }
            count += 1;
        }

        Ok(count)
    }

    /// Get the number of chips in the registry
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Iterate over all chips
    pub fn iter(&self) -> impl Iterator<Item = &ChipDescriptor> {
        self.chips.iter()
    }
}
