//! Intel hex codec
//!
//! Records have the form `:LLAAAATT[DD...]CC`: a data length, a 16-bit
//! address, a record type, the data, and a checksum that makes all bytes of
//! the record sum to zero.
//!
//! Both directions stream: the reader hands out one record's data at a
//! time and the writer emits records as data is given to it.

mod reader;
mod writer;

pub use reader::read;
pub use writer::HexWriter;

/// Most data bytes the writer puts in one record
pub const MAX_WRITE_RECORD: usize = 16;

/// Most data bytes the reader accepts in one record
pub const MAX_READ_RECORD: usize = 64;

/// Record types
pub mod record {
    /// Data record
    pub const DATA: u8 = 0x00;
    /// End of file
    pub const EOF: u8 = 0x01;
    /// Extended segment address
    pub const SEGMENT: u8 = 0x02;
    /// Extended linear address
    pub const LINEAR: u8 = 0x04;
}
