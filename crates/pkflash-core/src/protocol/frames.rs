//! Fixed frames used by the device operations
//!
//! Each function returns one complete frame. The comments show the frame as
//! it goes over the wire, with argument bytes as `_` or `\xNN`.

use super::command::{Command, PowerState};
use super::frame::{Frame, FrameBuilder};
use crate::memory::{CALIBRATION_ADDR, CONFIG_ADDR, DEVICE_ID_ADDR, USER_ID_ADDR};

fn frame(commands: impl IntoIterator<Item = Command>) -> Frame {
    FrameBuilder::new().extend(commands).finish()
}

/// Distance from the configuration base to `address`
fn config_offset(address: u32) -> u16 {
    (address - USER_ID_ADDR) as u16
}

/// `PZZZZZZZ`
pub fn enter() -> Frame {
    frame([Command::EnterProgramming])
}

/// `pZZZZZZZ`
pub fn exit() -> Frame {
    frame([Command::ExitProgramming])
}

/// `pV1ZZZZZ`: leave programming mode with the chip powered
pub fn exit_powered() -> Frame {
    frame([Command::ExitProgramming, Command::Power(PowerState::On)])
}

/// `V0ZZZZZZ`, `V1ZZZZZZ` or `V3ZZZZZZ`
pub fn power(state: PowerState) -> Frame {
    frame([Command::Power(state)])
}

/// `vZZZZZZZ`
pub fn version() -> Frame {
    frame([Command::Version])
}

/// `RZZZZZZZ`: read the next four program words
pub fn read_words() -> Frame {
    frame([Command::ReadProgram])
}

/// `rrrrrrrr`: read the next 64 EEPROM bytes
pub fn read_data_block() -> Frame {
    frame([Command::ReadData; 8])
}

/// `V0V1PI\xff\x03`: power cycle into programming mode at the OSCCAL word
pub fn restart_at_calibration() -> Frame {
    frame([
        Command::Power(PowerState::Off),
        Command::Power(PowerState::On),
        Command::EnterProgramming,
        Command::Increment(CALIBRATION_ADDR as u16),
    ])
}

/// `PI\xff\x03ZZZZ`: enter programming mode at the OSCCAL word
pub fn enter_at_calibration() -> Frame {
    frame([
        Command::EnterProgramming,
        Command::Increment(CALIBRATION_ADDR as u16),
    ])
}

/// `pV0V1PCZ`: power cycle into programming mode at the user IDs
pub fn restart_at_user_id() -> Frame {
    frame([
        Command::ExitProgramming,
        Command::Power(PowerState::Off),
        Command::Power(PowerState::On),
        Command::EnterProgramming,
        Command::JumpToConfig,
    ])
}

fn reenter_config_at(address: u32) -> Frame {
    frame([
        Command::ExitProgramming,
        Command::EnterProgramming,
        Command::JumpToConfig,
        Command::Increment(config_offset(address)),
    ])
}

/// `pPCI\x06\x00ZZ`: re-enter programming mode at the device ID word
pub fn reenter_at_device_id() -> Frame {
    reenter_config_at(DEVICE_ID_ADDR)
}

/// `pPCI\x07\x00ZZ`: re-enter programming mode at the CONFIG word
pub fn reenter_at_config() -> Frame {
    reenter_config_at(CONFIG_ADDR)
}

/// `PCEpZZZZ` or `PCEepZZZ`: bulk erase including configuration memory
///
/// With the PC in configuration memory, 'E' also clears the CONFIG word and
/// user IDs. OSCCAL and the bandgap bits are lost.
pub fn bulk_erase(keep_eeprom: bool) -> Frame {
    let erase_data = (!keep_eeprom).then_some(Command::EraseData);
    frame(
        [Command::EnterProgramming, Command::JumpToConfig, Command::EraseProgram]
            .into_iter()
            .chain(erase_data)
            .chain([Command::ExitProgramming]),
    )
}

/// `S____V1Z`: ask the programmer for its checksums
pub fn checksum(program_len: u16, eeprom_len: u16) -> Frame {
    frame([
        Command::Checksum {
            program_len,
            eeprom_len,
        },
        Command::Power(PowerState::On),
    ])
}

/// `PI\x78\x00rpZZ`: read the last eight bytes of a 128-byte EEPROM
///
/// The calibration firmware leaves its result in the final byte.
pub fn read_calibration_result() -> Frame {
    frame([
        Command::EnterProgramming,
        Command::Increment(0x0078),
        Command::ReadData,
        Command::ExitProgramming,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_frames() {
        assert_eq!(enter().as_bytes(), b"PZZZZZZZ");
        assert_eq!(exit().as_bytes(), b"pZZZZZZZ");
        assert_eq!(exit_powered().as_bytes(), b"pV1ZZZZZ");
        assert_eq!(power(PowerState::Off).as_bytes(), b"V0ZZZZZZ");
        assert_eq!(power(PowerState::On).as_bytes(), b"V1ZZZZZZ");
        assert_eq!(power(PowerState::Oscillator).as_bytes(), b"V3ZZZZZZ");
        assert_eq!(version().as_bytes(), b"vZZZZZZZ");
        assert_eq!(read_words().as_bytes(), b"RZZZZZZZ");
        assert_eq!(read_data_block().as_bytes(), b"rrrrrrrr");
    }

    #[test]
    fn test_seek_frames() {
        assert_eq!(restart_at_calibration().as_bytes(), b"V0V1PI\xff\x03");
        assert_eq!(enter_at_calibration().as_bytes(), b"PI\xff\x03ZZZZ");
        assert_eq!(restart_at_user_id().as_bytes(), b"pV0V1PCZ");
        assert_eq!(reenter_at_device_id().as_bytes(), b"pPCI\x06\x00ZZ");
        assert_eq!(reenter_at_config().as_bytes(), b"pPCI\x07\x00ZZ");
        assert_eq!(read_calibration_result().as_bytes(), b"PI\x78\x00rpZZ");
    }

    #[test]
    fn test_bulk_erase() {
        assert_eq!(bulk_erase(true).as_bytes(), b"PCEpZZZZ");
        assert_eq!(bulk_erase(false).as_bytes(), b"PCEepZZZ");
    }

    #[test]
    fn test_checksum_frame() {
        assert_eq!(checksum(0x03FF, 0x0080).as_bytes(), b"S\xff\x03\x80\x00V1Z");
        assert_eq!(checksum(0x03FF, 0x0080).response_len(), 8);
    }
}
