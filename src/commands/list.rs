//! List commands implementation

use pkflash_core::chip::{ChipDescriptor, Features, Registry};

use crate::programmers;

fn feature_names(chip: &ChipDescriptor) -> String {
    let mut names = Vec::new();
    if chip.features.contains(Features::OSCCAL) {
        names.push("OSCCAL");
    }
    if chip.features.contains(Features::ADAPTER) {
        names.push("adapter");
    }
    names.join(", ")
}

/// List all supported chips
pub fn list_chips(registry: &Registry) {
    println!("Supported PIC microcontrollers:");
    println!();
    println!(
        "{:<12} {:>9} {:>9} {:>7} {:>6}  {}",
        "Name", "Device ID", "Program", "EEPROM", "Mask", "Features"
    );
    println!("{}", "-".repeat(64));

    for chip in registry.iter() {
        println!(
            "{:<12} {:>9} {:>9} {:>7} {:>6}  {}",
            format!("PIC{}", chip.name),
            format!("0x{:04X}", chip.id),
            chip.program_words,
            chip.eeprom_bytes,
            format!("0x{:04X}", chip.config_mask),
            feature_names(chip)
        );
    }
}

/// List programmer backends and, for USB, the devices attached
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    for p in programmers::available_programmers() {
        println!("  {:8} - {}", p.name, p.description);
        if !p.aliases.is_empty() {
            println!("  {:8}   aliases: {}", "", p.aliases.join(", "));
        }
    }

    #[cfg(feature = "usb")]
    {
        println!();
        match pkflash_usb::PickitUsb::list_devices() {
            Ok(devices) if devices.is_empty() => println!("No PICkit 1 connected"),
            Ok(devices) => {
                for (index, device) in devices.iter().enumerate() {
                    println!("  usb:index={}  {}", index, device);
                }
            }
            Err(e) => log::warn!("Could not enumerate USB devices: {}", e),
        }
    }
}
