//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a bandgap level, rejecting anything outside 0..=3
fn parse_bandgap(s: &str) -> Result<u8, String> {
    let level: u8 = s.parse().map_err(|e| format!("Invalid number: {}", e))?;
    if level > 3 {
        return Err(format!("Bandgap must be between 0 and 3, got {}", level));
    }
    Ok(level)
}

#[derive(Parser)]
#[command(name = "pkflash")]
#[command(author, version, about = "Microchip PICkit 1 USB programmer for 14-bit PICs", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Additional chip definitions (RON file), replacing built-in entries
    /// with the same device ID
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// Programmer to use: "usb" (optionally "usb:index=N") or "dummy"
    /// (optionally "dummy:chip=<name>")
    #[arg(short, long, global = true, default_value = "usb")]
    pub programmer: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a .hex file to the chip, preserving OSCCAL and bandgap bits
    Program {
        /// Input .hex file
        file: PathBuf,

        /// Also overwrite OSCCAL and bandgap bits from the file (dangerous!)
        #[arg(long)]
        overwrite_calibration: bool,
    },

    /// Read the chip into a .hex file
    Extract {
        /// Output .hex file
        file: PathBuf,
    },

    /// Read the chip and compare it with a .hex file
    Verify {
        /// .hex file to compare against
        file: PathBuf,

        /// Report every mismatching area instead of stopping at the first
        #[arg(long)]
        all: bool,
    },

    /// Read the chip and check that every location is erased
    BlankCheck {
        /// Report every area that is not blank instead of stopping at the first
        #[arg(long)]
        all: bool,
    },

    /// Erase the chip, preserving OSCCAL and bandgap bits where present
    Erase,

    /// Show program and EEPROM data memory
    MemoryMap,

    /// Show configuration memory and the programmer checksums
    Config,

    /// Power cycle the chip
    Reset,

    /// Turn chip power on
    On,

    /// Turn chip power off
    Off,

    /// Turn the 2.5 kHz reference oscillator on, with the chip powered
    OscOn,

    /// Turn the 2.5 kHz reference oscillator off, leaving the chip powered
    OscOff,

    /// Erase the chip, keep OSCCAL and program new bandgap bits
    Bandgap {
        /// Bandgap level (0-3)
        #[arg(value_parser = parse_bandgap)]
        level: u8,
    },

    /// Erase the chip and regenerate OSCCAL from the reference oscillator
    OsccalRegen {
        /// Calibration firmware to run on the chip
        #[arg(long, default_value = "autocal.hex")]
        autocal: PathBuf,
    },

    /// List supported chips
    ListChips,

    /// List programmer backends and connected PICkit 1 devices
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["pkflash", "erase", "-p", "dummy", "-vv"]).unwrap();
        assert_eq!(cli.programmer, "dummy");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Erase));
    }

    #[test]
    fn test_bandgap_range() {
        assert!(Cli::try_parse_from(["pkflash", "bandgap", "3"]).is_ok());
        assert!(Cli::try_parse_from(["pkflash", "bandgap", "4"]).is_err());
    }

    #[test]
    fn test_autocal_default() {
        let cli = Cli::try_parse_from(["pkflash", "osccal-regen"]).unwrap();
        match cli.command {
            Commands::OsccalRegen { autocal } => assert_eq!(autocal, PathBuf::from("autocal.hex")),
            _ => panic!("expected osccal-regen"),
        }
    }
}
