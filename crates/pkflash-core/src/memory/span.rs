//! Address spans and the word router

use std::fmt;

use super::{
    MemoryState, CALIBRATION_ADDR, CONFIG_ADDR, EEPROM_ADDR, USER_ID_ADDR, USER_ID_WORDS,
};

/// Memory region a span refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// 14-bit program words
    Program,
    /// 8-bit EEPROM data
    Eeprom,
    /// CONFIG word
    Config,
    /// User ID words
    UserId,
    /// OSCCAL word
    Calibration,
}

impl Region {
    /// All regions, in routing order
    pub const ALL: [Region; 5] = [
        Region::Program,
        Region::Eeprom,
        Region::Config,
        Region::UserId,
        Region::Calibration,
    ];

    /// Human-readable description
    pub fn label(self) -> &'static str {
        match self {
            Region::Program => "Program (14-bit instruction words)",
            Region::Eeprom => "EEPROM (8-bit data)",
            Region::Config => "Configuration word",
            Region::UserId => "User ID words",
            Region::Calibration => "OSCCAL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A window of the hex file word address space mapped onto one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Region this span views
    pub region: Region,
    /// First word address
    pub base: u32,
    /// Number of words
    pub len: u32,
}

impl Span {
    /// Check if `address` falls inside this span (half-open)
    pub fn contains(&self, address: u32) -> bool {
        address >= self.base && address - self.base < self.len
    }

    /// One past the last word address
    pub fn end(&self) -> u32 {
        self.base + self.len
    }

    /// Check if this span covers no addresses
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl MemoryState {
    /// The five spans of this state, in routing order
    ///
    /// The OSCCAL span is empty on chips that do not preserve calibration,
    /// which keeps it clear of program memory on larger parts.
    pub fn spans(&self) -> [Span; 5] {
        Region::ALL.map(|region| self.span(region))
    }

    /// Span of a single region
    pub fn span(&self, region: Region) -> Span {
        let (base, len) = match region {
            Region::Program => (0, self.program.len()),
            Region::Eeprom => (EEPROM_ADDR, self.eeprom.len()),
            Region::Config => (CONFIG_ADDR, 1),
            Region::UserId => (USER_ID_ADDR, USER_ID_WORDS),
            Region::Calibration => (CALIBRATION_ADDR, self.config.preserve_calibration as usize),
        };
        Span {
            region,
            base,
            len: len as u32,
        }
    }

    /// Store `value` at word `address`, wherever it belongs
    ///
    /// Returns the region that took the word, or `None` if no span covers
    /// the address. Hex files routinely reference addresses outside the
    /// chip, so those are dropped without error.
    pub fn route_word(&mut self, address: u32, value: u16) -> Option<Region> {
        let span = self.spans().into_iter().find(|s| s.contains(address))?;
        let offset = (address - span.base) as usize;

        match span.region {
            Region::Program => {
                self.program[offset] = value;
                self.max_prog = self.max_prog.max(offset + 1);
            }
            Region::Eeprom => {
                self.eeprom[offset] = value as u8;
                self.max_ee = self.max_ee.max(offset + 1);
            }
            Region::Config => {
                log::info!(".hex file contains a configuration word");
                self.config.config = value;
                self.config.explicit_config = true;
            }
            Region::UserId => self.config.user_id[offset] = value,
            Region::Calibration => self.config.calibration = value,
        }

        Some(span.region)
    }

    /// Word stored at `offset` within `region`
    ///
    /// EEPROM bytes read back as words with a zero high byte.
    pub fn word_at(&self, region: Region, offset: usize) -> Option<u16> {
        match region {
            Region::Program => self.program.get(offset).copied(),
            Region::Eeprom => self.eeprom.get(offset).map(|&b| b as u16),
            Region::Config => (offset == 0).then_some(self.config.config),
            Region::UserId => self.config.user_id.get(offset).copied(),
            Region::Calibration => {
                (offset == 0 && self.config.preserve_calibration).then_some(self.config.calibration)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Registry;

    fn assert_disjoint(state: &MemoryState) {
        let spans = state.spans();
        for address in 0..0x2200 {
            let claims = spans.iter().filter(|s| s.contains(address)).count();
            assert!(claims <= 1, "address 0x{:04X} claimed {} times", address, claims);
        }
    }

    #[test]
    fn test_spans_disjoint_default() {
        assert_disjoint(&MemoryState::default());
    }

    #[test]
    fn test_spans_disjoint_every_chip() {
        for chip in Registry::builtin().iter() {
            assert_disjoint(&MemoryState::for_chip(chip));
        }
    }

    #[test]
    fn test_route_then_read_back() {
        for chip in Registry::builtin().iter() {
            let mut state = MemoryState::for_chip(chip);
            for span in state.spans() {
                for address in span.base..span.end() {
                    let value = (address as u16 ^ 0x1555) & 0x00FF;
                    assert_eq!(state.route_word(address, value), Some(span.region));
                    let offset = (address - span.base) as usize;
                    assert_eq!(state.word_at(span.region, offset), Some(value));
                }
            }
        }
    }

    #[test]
    fn test_uncovered_address_ignored() {
        let registry = Registry::builtin();
        let mut state = MemoryState::for_chip(registry.lookup(0x1340).unwrap());
        let before = state.clone();

        assert_eq!(state.route_word(0x1800, 0x1234), None);
        assert_eq!(state.route_word(0x2004, 0x1234), None);
        assert_eq!(state.route_word(0x2300, 0x1234), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_high_water_marks() {
        let mut state = MemoryState::default();
        assert_eq!(state.max_prog, 0);

        for index in [0, 1, 5] {
            state.route_word(index, 0x0000);
        }
        assert_eq!(state.max_prog, 6);

        state.route_word(2, 0x0000);
        assert_eq!(state.max_prog, 6);
        assert_eq!(state.max_ee, 0);

        state.route_word(EEPROM_ADDR + 3, 0x00AB);
        assert_eq!(state.max_ee, 4);
        assert_eq!(state.eeprom[3], 0xAB);
    }

    #[test]
    fn test_config_word_flagged() {
        let mut state = MemoryState::default();
        assert!(!state.config.explicit_config);

        assert_eq!(state.route_word(CONFIG_ADDR, 0x31C4), Some(Region::Config));
        assert_eq!(state.config.config, 0x31C4);
        assert!(state.config.explicit_config);
        assert_eq!(state.max_prog, 0);
    }

    #[test]
    fn test_calibration_span_only_when_preserving() {
        let registry = Registry::builtin();

        let mut plain = MemoryState::for_chip(registry.lookup(0x1080).unwrap());
        assert!(plain.span(Region::Calibration).is_empty());
        assert_eq!(plain.route_word(CALIBRATION_ADDR, 0x3480), Some(Region::Program));
        assert_eq!(plain.config.calibration, 0x2000);

        let mut osccal = MemoryState::for_chip(registry.lookup(0x0FC0).unwrap());
        assert_eq!(osccal.route_word(CALIBRATION_ADDR, 0x3480), Some(Region::Calibration));
        assert_eq!(osccal.config.calibration, 0x3480);
        assert_eq!(osccal.max_prog, 0);
    }
}
