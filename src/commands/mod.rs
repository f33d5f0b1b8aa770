//! CLI command implementations
//!
//! Every command works on a [`PicSession`], which wraps whichever programmer
//! backend was selected. Commands that touch memory identify the chip first
//! and size their buffers from the registry entry.

pub mod config;
pub mod erase;
mod list;
pub mod memory_map;
pub mod power;
mod progress;
pub mod program;
pub mod verify;

pub use list::{list_chips, list_programmers};
pub use progress::BarProgress;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pkflash_core::device::Session;
use pkflash_core::memory::MemoryState;
use pkflash_core::programmer::Transport;

/// Session over any programmer backend
pub type PicSession = Session<Box<dyn Transport>>;

/// Result type shared by the commands
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load a hex file into `state`
fn load_hex_file(state: &mut MemoryState, path: &Path) -> CmdResult {
    let file = File::open(path)
        .map_err(|e| format!("Could not open {}: {}", path.display(), e))?;
    state
        .load_hex(BufReader::new(file))
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    log::debug!(
        "Loaded {} program words and {} EEPROM bytes from {}",
        state.max_prog,
        state.max_ee,
        path.display()
    );
    Ok(())
}
