//! Chip capability flags

use bitflags::bitflags;

bitflags! {
    /// Capability flags for 14-bit PICs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u8 {
        /// Factory OSCCAL word at 0x3FF and bandgap bits in the CONFIG
        /// word, both wiped by a bulk erase and restored afterwards
        const OSCCAL  = 1 << 0;
        /// Needs a 14-to-18 pin socket adapter on the PICkit 1 board
        const ADAPTER = 1 << 1;
    }
}
