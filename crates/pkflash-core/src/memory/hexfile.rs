//! Hex file bridging
//!
//! Hex files are byte addressed; chip memory is word addressed. Each word is
//! stored as a little-endian byte pair at twice its word address.

use std::io::{Read, Write};

use super::MemoryState;
use crate::error::Result;
use crate::hex::{self, HexWriter};

impl MemoryState {
    /// Load a hex file into this state, routing every word to its span
    pub fn load_hex<R: Read>(&mut self, src: R) -> Result<()> {
        hex::read(src, |address, data| {
            let base = address / 2;
            for (i, pair) in data.chunks_exact(2).enumerate() {
                let word = u16::from_le_bytes([pair[0], pair[1]]);
                self.route_word(base + i as u32, word);
            }
        })
    }

    /// Write this state as a hex file
    ///
    /// Every span is written in full, not just up to its high-water mark.
    pub fn store_hex<W: Write>(&self, dest: W) -> Result<()> {
        let mut writer = HexWriter::new(dest);

        for span in self.spans() {
            let bytes: Vec<u8> = (0..span.len as usize)
                .filter_map(|offset| self.word_at(span.region, offset))
                .flat_map(u16::to_le_bytes)
                .collect();
            writer.write_data(span.base * 2, &bytes)?;
        }

        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Registry;
    use crate::memory::{Region, EEPROM_ADDR};

    #[test]
    fn test_three_words_one_byte() {
        let mut source = MemoryState::with_lengths(3, 1);
        source.program.copy_from_slice(&[0x3FFF, 0x3FFF, 0x1234]);
        source.eeprom[0] = 0xAB;

        let mut text = Vec::new();
        source.store_hex(&mut text).unwrap();

        let mut decoded = MemoryState::default();
        decoded.load_hex(text.as_slice()).unwrap();

        assert_eq!(decoded.max_prog, 3);
        assert_eq!(decoded.program[2], 0x1234);
        assert_eq!(decoded.max_ee, 1);
        assert_eq!(decoded.eeprom[0], 0xAB);
    }

    #[test]
    fn test_exact_text() {
        let mut state = MemoryState::with_lengths(2, 1);
        state.program.copy_from_slice(&[0x2805, 0x3FFF]);
        state.eeprom[0] = 0x42;
        state.config.config = 0x3FF4;

        let mut text = Vec::new();
        state.store_hex(&mut text).unwrap();

        let expected = "\
:040000000528FF3F91\n\
:0242000042007A\n\
:02400E00F43F7D\n\
:08400000FF3FFF3FFF3FFF3FC0\n\
:00000001FF\n";
        assert_eq!(String::from_utf8(text).unwrap(), expected);
    }

    #[test]
    fn test_round_trip_every_chip() {
        for chip in Registry::builtin().iter() {
            let mut source = MemoryState::for_chip(chip);
            for (i, word) in source.program.iter_mut().enumerate() {
                *word = (i as u16).wrapping_mul(0x0123) & 0x3FFF;
            }
            for (i, byte) in source.eeprom.iter_mut().enumerate() {
                *byte = (i as u8).wrapping_mul(7);
            }
            source.config.user_id = [0x0011, 0x0022, 0x0033, 0x0044];
            source.config.config = 0x3184;
            source.config.calibration = 0x3480;

            let mut text = Vec::new();
            source.store_hex(&mut text).unwrap();

            let mut decoded = MemoryState::for_chip(chip);
            decoded.load_hex(text.as_slice()).unwrap();

            assert_eq!(decoded.program, source.program, "PIC{}", chip.name);
            assert_eq!(decoded.eeprom, source.eeprom, "PIC{}", chip.name);
            assert_eq!(decoded.config.user_id, source.config.user_id);
            assert_eq!(decoded.config.config, source.config.config);
            if chip.preserves_calibration() {
                assert_eq!(decoded.config.calibration, 0x3480);
            } else {
                assert_eq!(decoded.config.calibration, 0x2000);
            }
            assert_eq!(decoded.max_prog, chip.program_words);
            assert_eq!(decoded.max_ee, chip.eeprom_bytes);
        }
    }

    #[test]
    fn test_eeprom_high_byte_dropped() {
        let text = b":04420000AB12CD34FC\n:00000001FF\n";
        let mut state = MemoryState::default();
        state.load_hex(&text[..]).unwrap();

        assert_eq!(state.eeprom[0], 0xAB);
        assert_eq!(state.eeprom[1], 0xCD);
        assert_eq!(state.word_at(Region::Eeprom, 1), Some(0x00CD));
        assert_eq!(state.max_ee, 2);
        assert_eq!(state.span(Region::Eeprom).base, EEPROM_ADDR);
    }

    #[test]
    fn test_odd_trailing_byte_ignored() {
        let text = b":03000000010203F7\n";
        let mut state = MemoryState::default();
        state.load_hex(&text[..]).unwrap();

        assert_eq!(state.program[0], 0x0201);
        assert_eq!(state.program[1], 0x3FFF);
        assert_eq!(state.max_prog, 1);
    }
}
