//! Hex file writer

use std::io::{self, Write};

use super::{record, MAX_WRITE_RECORD};

/// Streaming hex file writer
///
/// Call [`HexWriter::finish`] to append the end-of-file record.
pub struct HexWriter<W: Write> {
    out: W,
}

impl<W: Write> HexWriter<W> {
    /// Create a writer on top of `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write `data` starting at byte `address`
    ///
    /// Data is split into records of at most 16 bytes. Empty data writes
    /// nothing.
    pub fn write_data(&mut self, address: u32, data: &[u8]) -> io::Result<()> {
        for (i, chunk) in data.chunks(MAX_WRITE_RECORD).enumerate() {
            let offset = (i * MAX_WRITE_RECORD) as u32;
            self.write_record(address.wrapping_add(offset), record::DATA, chunk)?;
        }
        Ok(())
    }

    /// Write the end-of-file record and return the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.write_record(0, record::EOF, &[])?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_record(&mut self, address: u32, kind: u8, data: &[u8]) -> io::Result<()> {
        let address = (address & 0xFFFF) as u16;
        let [addr_hi, addr_lo] = address.to_be_bytes();

        let mut line = String::with_capacity(11 + 2 * data.len());
        let mut sum = 0u8;
        line.push(':');
        for byte in [data.len() as u8, addr_hi, addr_lo, kind]
            .into_iter()
            .chain(data.iter().copied())
        {
            push_byte(&mut line, byte);
            sum = sum.wrapping_add(byte);
        }
        push_byte(&mut line, sum.wrapping_neg());
        line.push('\n');

        self.out.write_all(line.as_bytes())
    }
}

fn push_byte(line: &mut String, byte: u8) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    line.push(DIGITS[(byte >> 4) as usize] as char);
    line.push(DIGITS[(byte & 0x0F) as usize] as char);
}
