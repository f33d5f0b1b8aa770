//! Programmer registration and dispatch
//!
//! Backends are feature-gated. Every backend hands out a boxed
//! [`Transport`], so the commands never know which one they talk to.

use pkflash_core::chip::Registry;
use pkflash_core::programmer::Transport;
use thiserror::Error;

/// Information about a programmer backend
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors selecting or opening a programmer
#[derive(Debug, Error)]
pub enum ProgrammerError {
    #[error("Unknown programmer: {name}\n\n{help}")]
    Unknown { name: String, help: String },

    #[error("Invalid value for {option}: {value}")]
    InvalidOption { option: &'static str, value: String },

    #[error("Unknown chip for the dummy programmer: {0}")]
    UnknownChip(String),
}

/// Get information about all programmers enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "usb")]
    programmers.push(ProgrammerInfo {
        name: "usb",
        aliases: &["pickit", "pickit1"],
        description: "Microchip PICkit 1 over USB (VID:04d8 PID:0032) (index=<n>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory PICkit 1 and chip emulator for testing (chip=<name>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
    }
    help
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

#[cfg(any(feature = "usb", feature = "dummy"))]
fn option<'a>(options: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    options.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Open the programmer named by `programmer`
///
/// The registry is only consulted by the dummy backend, to size the
/// emulated chip.
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
    registry: &Registry,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let unknown = || ProgrammerError::Unknown {
        name: name.to_string(),
        help: programmer_help(),
    };
    let canonical_name = find_programmer(name).ok_or_else(unknown)?;

    match canonical_name {
        #[cfg(feature = "usb")]
        "usb" => {
            let index = match option(&options, "index") {
                Some(v) => v.parse().map_err(|_| ProgrammerError::InvalidOption {
                    option: "index",
                    value: v.to_string(),
                })?,
                None => 0,
            };

            let pickit = pkflash_usb::PickitUsb::open_nth(index).map_err(|e| {
                format!(
                    "Failed to open PICkit 1: {}\n\
                     Make sure the device is connected and you have permissions.",
                    e
                )
            })?;
            Ok(Box::new(pickit))
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            use pkflash_dummy::{DummyConfig, DummyPickit};

            let config = match option(&options, "chip") {
                Some(chip) => {
                    let chip = registry
                        .find_by_name(chip)
                        .ok_or_else(|| ProgrammerError::UnknownChip(chip.to_string()))?;
                    DummyConfig::for_chip(chip)
                }
                None => DummyConfig::default(),
            };
            log::info!("Using emulated PICkit 1");
            Ok(Box::new(DummyPickit::new(config)))
        }

        _ => Err(unknown().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("usb"), ("usb", vec![]));
        assert_eq!(
            parse_programmer_string("usb:index=1"),
            ("usb", vec![("index", "1")])
        );
        assert_eq!(
            parse_programmer_string("dummy:chip=16F689,junk"),
            ("dummy", vec![("chip", "16F689")])
        );
    }

    #[cfg(feature = "usb")]
    #[test]
    fn test_find_usb_alias() {
        assert_eq!(find_programmer("pickit1"), Some("usb"));
    }

    #[test]
    fn test_unknown_programmer() {
        let registry = Registry::builtin();
        assert!(open_programmer("serprog", &registry).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_chip_option() {
        let registry = Registry::builtin();
        assert!(open_programmer("dummy:chip=PIC16F689", &registry).is_ok());
        assert!(open_programmer("dummy:chip=18F452", &registry).is_err());
    }
}
