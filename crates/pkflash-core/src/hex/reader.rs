//! Hex file reader

use std::io::{self, BufReader, Read};

use super::{record, MAX_READ_RECORD};
use crate::error::{Error, RecordError, Result};

/// Read a hex file, calling `on_data(address, bytes)` for every data record
///
/// The address passed to `on_data` already includes the extended address
/// offsets. Reading stops at an end-of-file record, or successfully at the
/// end of input if that record is missing.
///
/// Extended address records latch their 16-bit address field: type 02 as
/// `address << 8` and type 04 as `address << 16`.
pub fn read<R, F>(src: R, mut on_data: F) -> Result<()>
where
    R: Read,
    F: FnMut(u32, &[u8]),
{
    let mut decoder = Decoder::new(src);
    let mut low_offset = 0u32;
    let mut high_offset = 0u32;
    let mut buf = [0u8; MAX_READ_RECORD];

    while decoder.seek_record()? {
        let len = decoder.byte()?;
        let addr_hi = decoder.byte()?;
        let addr_lo = decoder.byte()?;
        let kind = decoder.byte()?;

        if len as usize > MAX_READ_RECORD {
            return Err(decoder.format_error(RecordError::TooLong(len)));
        }

        let mut sum = len
            .wrapping_add(addr_hi)
            .wrapping_add(addr_lo)
            .wrapping_add(kind);

        let data = &mut buf[..len as usize];
        for byte in data.iter_mut() {
            *byte = decoder.byte()?;
            sum = sum.wrapping_add(*byte);
        }

        let sum = sum.wrapping_add(decoder.byte()?);
        if sum != 0 {
            return Err(Error::Checksum {
                line: decoder.line,
                sum,
            });
        }

        let address = u16::from_be_bytes([addr_hi, addr_lo]) as u32;
        match kind {
            record::DATA => {
                let absolute = address
                    .wrapping_add(low_offset)
                    .wrapping_add(high_offset);
                on_data(absolute, data);
            }
            record::EOF => return Ok(()),
            record::SEGMENT => low_offset = address << 8,
            record::LINEAR => high_offset = address << 16,
            other => return Err(decoder.format_error(RecordError::UnsupportedType(other))),
        }
    }

    Ok(())
}

/// Character-level state of the reader
struct Decoder<R: Read> {
    bytes: io::Bytes<BufReader<R>>,
    line: usize,
}

impl<R: Read> Decoder<R> {
    fn new(src: R) -> Self {
        Self {
            bytes: BufReader::new(src).bytes(),
            line: 1,
        }
    }

    fn next(&mut self) -> Result<Option<u8>> {
        Ok(self.bytes.next().transpose()?)
    }

    /// Skip whitespace up to the next ':'. Returns false at end of input.
    fn seek_record(&mut self) -> Result<bool> {
        while let Some(c) = self.next()? {
            match c {
                b':' => return Ok(true),
                b'\n' => self.line += 1,
                c if c.is_ascii_whitespace() => {}
                c => return Err(self.format_error(RecordError::UnexpectedCharacter(c as char))),
            }
        }
        Ok(false)
    }

    /// Read one byte written as two hex digits
    fn byte(&mut self) -> Result<u8> {
        let hi = self.digit()?;
        let lo = self.digit()?;
        Ok((hi << 4) | lo)
    }

    fn digit(&mut self) -> Result<u8> {
        match self.next()? {
            Some(c) => (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| self.format_error(RecordError::InvalidDigit)),
            None => Err(self.format_error(RecordError::Truncated)),
        }
    }

    fn format_error(&self, kind: RecordError) -> Error {
        Error::Format {
            line: self.line,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Result<Vec<(u32, Vec<u8>)>> {
        let mut records = Vec::new();
        read(text.as_bytes(), |address, data| {
            records.push((address, data.to_vec()))
        })?;
        Ok(records)
    }

    #[test]
    fn test_data_and_eof() {
        let records = collect(":040000000528FF3F91\n:00000001FF\n").unwrap();
        assert_eq!(records, vec![(0, vec![0x05, 0x28, 0xFF, 0x3F])]);
    }

    #[test]
    fn test_stops_at_eof_record() {
        let records = collect(":00000001FF\n:040000000528FF3F91\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_eof_is_success() {
        let records = collect("\n  :040000000528FF3F91\r\n\r\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").unwrap().is_empty());
    }

    #[test]
    fn test_lowercase_digits() {
        let records = collect(":0200100034aa10\n").unwrap();
        assert_eq!(records, vec![(0x0010, vec![0x34, 0xAA])]);
    }

    #[test]
    fn test_extended_address_records() {
        // type 04 latches its address field << 16, type 02 latches << 8
        let text = ":020001040000F9\n:020010000102EB\n:020001020000FB\n:020010000304E7\n";
        let records = collect(text).unwrap();
        assert_eq!(records[0], (0x0001_0010, vec![0x01, 0x02]));
        assert_eq!(records[1], (0x0001_0110, vec![0x03, 0x04]));
    }

    #[test]
    fn test_garbage_between_records() {
        assert!(collect(":00000001FF").unwrap().is_empty());

        let err = collect("x:00000001FF\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                line: 1,
                kind: RecordError::UnexpectedCharacter('x')
            }
        ));
    }

    #[test]
    fn test_line_numbers() {
        let err = collect(":040000000528FF3F91\n\n:0400000005\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                line: 3,
                kind: RecordError::InvalidDigit
            }
        ));
    }

    #[test]
    fn test_truncated_record() {
        let err = collect(":0400000005").unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                kind: RecordError::Truncated,
                ..
            }
        ));
    }

    #[test]
    fn test_too_long() {
        let err = collect(":41000000").unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                kind: RecordError::TooLong(0x41),
                ..
            }
        ));
    }

    #[test]
    fn test_accepts_sixty_four_bytes() {
        let mut line = String::from(":40000000");
        let mut sum = 0x40u8;
        for i in 0..64u8 {
            line.push_str(&format!("{:02X}", i));
            sum = sum.wrapping_add(i);
        }
        line.push_str(&format!("{:02X}\n", sum.wrapping_neg()));

        let records = collect(&line).unwrap();
        assert_eq!(records[0].1.len(), 64);
    }

    #[test]
    fn test_unsupported_type() {
        let err = collect(":00000003FD\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                kind: RecordError::UnsupportedType(0x03),
                ..
            }
        ));
    }

    #[test]
    fn test_checksum_error() {
        let err = collect(":040000000528FF3F92\n").unwrap_err();
        assert!(matches!(err, Error::Checksum { line: 1, sum: 0x01 }));
    }

    #[test]
    fn test_any_flipped_digit_fails_checksum() {
        let valid = ":100010000C309600831607309900003083120B30A5";
        assert!(collect(valid).is_ok());

        // every digit after the length field
        for pos in 3..valid.len() {
            let original = valid.as_bytes()[pos] as char;
            let value = original.to_digit(16).unwrap();
            for flipped in (0..16).filter(|&v| v != value) {
                let mut text = valid.to_string();
                let digit = std::char::from_digit(flipped, 16).unwrap().to_ascii_uppercase();
                text.replace_range(pos..pos + 1, &digit.to_string());

                assert!(
                    matches!(collect(&text), Err(Error::Checksum { .. })),
                    "digit {} flipped to {} was accepted",
                    pos,
                    digit
                );
            }
        }
    }
}
