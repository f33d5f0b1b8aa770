//! pkflash - Microchip PICkit 1 programmer
//!
//! Reads, writes, verifies and erases 14-bit PIC microcontrollers through a
//! PICkit 1 FLASH Starter Kit, using Intel hex files on disk.
//!
//! # Architecture
//!
//! All protocol logic lives in `pkflash-core`, which talks to the programmer
//! through the `Transport` trait. Two backends implement it:
//! - **usb**: the real PICkit 1, through `nusb`
//! - **dummy**: an in-memory emulation of the programmer and a chip
//!
//! Commands open a session on the selected backend, identify the chip in
//! the socket through the chip registry, then run one operation.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use commands::power::PowerAction;
use commands::{CmdResult, PicSession};
use pkflash_core::chip::Registry;
use pkflash_core::device::Session;
use std::path::Path;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // The session must be gone before exiting, so it can leave programming mode
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CmdResult {
    let registry = load_chip_database(cli.chip_db.as_deref())?;
    log::debug!("Loaded {} chip definitions", registry.len());

    // Commands that don't need the programmer
    match cli.command {
        Commands::ListChips => {
            commands::list_chips(&registry);
            return Ok(());
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            return Ok(());
        }
        _ => {}
    }

    let transport = programmers::open_programmer(&cli.programmer, &registry)?;
    let mut session: PicSession = Session::open(transport)?;

    match cli.command {
        Commands::Program {
            file,
            overwrite_calibration,
        } => commands::program::run_program(&mut session, &registry, &file, !overwrite_calibration),
        Commands::Extract { file } => commands::program::run_extract(&mut session, &registry, &file),
        Commands::Verify { file, all } => {
            commands::verify::run_verify(&mut session, &registry, &file, all)
        }
        Commands::BlankCheck { all } => {
            commands::verify::run_blank_check(&mut session, &registry, all)
        }
        Commands::Erase => commands::erase::run_erase(&mut session, &registry),
        Commands::MemoryMap => commands::memory_map::run_memory_map(&mut session, &registry),
        Commands::Config => commands::config::run_config(&mut session, &registry),
        Commands::Reset => commands::power::run_power(&mut session, PowerAction::Reset),
        Commands::On => commands::power::run_power(&mut session, PowerAction::On),
        Commands::Off => commands::power::run_power(&mut session, PowerAction::Off),
        Commands::OscOn => commands::power::run_power(&mut session, PowerAction::OscillatorOn),
        Commands::OscOff => commands::power::run_power(&mut session, PowerAction::OscillatorOff),
        Commands::Bandgap { level } => commands::erase::run_bandgap(&mut session, &registry, level),
        Commands::OsccalRegen { autocal } => {
            commands::erase::run_osccal_regen(&mut session, &registry, &autocal)
        }
        Commands::ListChips | Commands::ListProgrammers => Ok(()),
    }
}

/// Built-in chip table, extended or overridden by a RON file if given
fn load_chip_database(path: Option<&Path>) -> Result<Registry, Box<dyn std::error::Error>> {
    let mut registry = Registry::builtin();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(format!("Chip database not found: {}", path.display()).into());
        }
        let count = registry.load_file(path)?;
        log::info!("Loaded {} chip definitions from {}", count, path.display());
    }

    Ok(registry)
}
