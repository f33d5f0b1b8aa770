//! Progress reporting

use crate::memory::Region;

/// Callback for progress reporting during reads and writes
///
/// Counts are in elements of the region: words for program memory, bytes
/// for EEPROM.
pub trait Progress {
    /// Called when starting to read a region
    fn reading(&mut self, region: Region, total: usize);

    /// Called to update read progress
    fn read_progress(&mut self, done: usize);

    /// Called before the bulk erase
    fn erasing(&mut self);

    /// Called when starting to write a region
    fn writing(&mut self, region: Region, total: usize);

    /// Called to update write progress
    fn write_progress(&mut self, done: usize);

    /// Called when the current region is finished
    fn finished(&mut self);
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn reading(&mut self, _region: Region, _total: usize) {}
    fn read_progress(&mut self, _done: usize) {}
    fn erasing(&mut self) {}
    fn writing(&mut self, _region: Region, _total: usize) {}
    fn write_progress(&mut self, _done: usize) {}
    fn finished(&mut self) {}
}
