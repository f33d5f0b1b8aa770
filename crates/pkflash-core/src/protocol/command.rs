//! Typed PICkit commands

use thiserror::Error;

use super::opcodes;

/// Chip supply and oscillator selection for the 'V' command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Vdd off
    Off,
    /// Vdd on
    On,
    /// Vdd on plus the 2.5 kHz reference on the RA4 pin
    Oscillator,
}

impl PowerState {
    /// Argument byte sent after 'V'
    pub fn arg(self) -> u8 {
        match self {
            PowerState::Off => b'0',
            PowerState::On => b'1',
            PowerState::Oscillator => b'3',
        }
    }

    fn from_arg(arg: u8) -> Option<Self> {
        match arg {
            b'0' => Some(PowerState::Off),
            b'1' => Some(PowerState::On),
            b'3' => Some(PowerState::Oscillator),
            _ => None,
        }
    }
}

/// A single command as it appears in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 'P'
    EnterProgramming,
    /// 'p'
    ExitProgramming,
    /// 'E'
    EraseProgram,
    /// 'e'
    EraseData,
    /// 'W' lo hi
    WriteWord(u16),
    /// 'D' byte
    WriteData(u8),
    /// 'C'
    JumpToConfig,
    /// 'I' lo hi
    Increment(u16),
    /// 'R', answered with four words
    ReadProgram,
    /// 'r', answered with eight bytes
    ReadData,
    /// 'V' state
    Power(PowerState),
    /// 'v', answered with the firmware version
    Version,
    /// 'S' plen eelen, answered with the checksums
    Checksum {
        /// Program words to sum
        program_len: u16,
        /// EEPROM bytes to sum
        eeprom_len: u16,
    },
    /// 'Z'
    Nop,
}

/// Frame contents that do not decode as commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Byte at the given offset is not a known opcode
    #[error("unknown opcode 0x{opcode:02X} at offset {offset}")]
    UnknownOpcode {
        /// Offset in the frame
        offset: usize,
        /// The offending byte
        opcode: u8,
    },
    /// A command's arguments run past the end of the frame
    #[error("arguments of '{opcode}' are cut off by the end of the frame")]
    Truncated {
        /// Opcode of the cut-off command
        opcode: char,
    },
}

impl Command {
    /// Opcode byte
    pub fn opcode(&self) -> u8 {
        match self {
            Command::EnterProgramming => opcodes::ENTER_PROGRAMMING,
            Command::ExitProgramming => opcodes::EXIT_PROGRAMMING,
            Command::EraseProgram => opcodes::ERASE_PROGRAM,
            Command::EraseData => opcodes::ERASE_DATA,
            Command::WriteWord(_) => opcodes::WRITE_WORD,
            Command::WriteData(_) => opcodes::WRITE_DATA,
            Command::JumpToConfig => opcodes::JUMP_TO_CONFIG,
            Command::Increment(_) => opcodes::INCREMENT,
            Command::ReadProgram => opcodes::READ_PROGRAM,
            Command::ReadData => opcodes::READ_DATA,
            Command::Power(_) => opcodes::POWER,
            Command::Version => opcodes::VERSION,
            Command::Checksum { .. } => opcodes::CHECKSUM,
            Command::Nop => opcodes::NOP,
        }
    }

    /// Bytes this command occupies in a frame, opcode included
    pub fn encoded_len(&self) -> usize {
        1 + arg_len(self.opcode()).unwrap_or(0)
    }

    /// Append the encoded command to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode());
        match *self {
            Command::WriteWord(word) | Command::Increment(word) => {
                out.extend_from_slice(&word.to_le_bytes())
            }
            Command::WriteData(byte) => out.push(byte),
            Command::Power(state) => out.push(state.arg()),
            Command::Checksum {
                program_len,
                eeprom_len,
            } => {
                out.extend_from_slice(&program_len.to_le_bytes());
                out.extend_from_slice(&eeprom_len.to_le_bytes());
            }
            _ => {}
        }
    }

    /// Check if the command is only valid while in programming mode
    pub fn requires_programming_mode(&self) -> bool {
        matches!(
            self,
            Command::EraseProgram
                | Command::EraseData
                | Command::WriteWord(_)
                | Command::WriteData(_)
                | Command::JumpToConfig
                | Command::Increment(_)
                | Command::ReadProgram
                | Command::ReadData
        )
    }

    /// Bytes the programmer answers with
    pub fn response_len(&self) -> usize {
        match self {
            Command::ReadProgram | Command::ReadData | Command::Version => 8,
            Command::Checksum { .. } => 8,
            _ => 0,
        }
    }

    /// Decode the command starting at `bytes[offset]`
    ///
    /// Returns the command and the number of bytes it used.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Command, usize), FrameError> {
        let opcode = bytes[offset];
        let args_len = arg_len(opcode).ok_or(FrameError::UnknownOpcode { offset, opcode })?;
        let args = bytes
            .get(offset + 1..offset + 1 + args_len)
            .ok_or(FrameError::Truncated {
                opcode: opcode as char,
            })?;
        let word = |i: usize| u16::from_le_bytes([args[i], args[i + 1]]);

        let command = match opcode {
            opcodes::ENTER_PROGRAMMING => Command::EnterProgramming,
            opcodes::EXIT_PROGRAMMING => Command::ExitProgramming,
            opcodes::ERASE_PROGRAM => Command::EraseProgram,
            opcodes::ERASE_DATA => Command::EraseData,
            opcodes::WRITE_WORD => Command::WriteWord(word(0)),
            opcodes::WRITE_DATA => Command::WriteData(args[0]),
            opcodes::JUMP_TO_CONFIG => Command::JumpToConfig,
            opcodes::INCREMENT => Command::Increment(word(0)),
            opcodes::READ_PROGRAM => Command::ReadProgram,
            opcodes::READ_DATA => Command::ReadData,
            opcodes::POWER => Command::Power(
                PowerState::from_arg(args[0])
                    .ok_or(FrameError::UnknownOpcode { offset: offset + 1, opcode: args[0] })?,
            ),
            opcodes::VERSION => Command::Version,
            opcodes::CHECKSUM => Command::Checksum {
                program_len: word(0),
                eeprom_len: word(2),
            },
            _ => Command::Nop,
        };

        Ok((command, 1 + args_len))
    }
}

/// Argument bytes following `opcode`, or `None` for an unknown opcode
fn arg_len(opcode: u8) -> Option<usize> {
    match opcode {
        opcodes::WRITE_WORD | opcodes::INCREMENT => Some(2),
        opcodes::WRITE_DATA | opcodes::POWER => Some(1),
        opcodes::CHECKSUM => Some(4),
        opcodes::ENTER_PROGRAMMING
        | opcodes::EXIT_PROGRAMMING
        | opcodes::ERASE_PROGRAM
        | opcodes::ERASE_DATA
        | opcodes::JUMP_TO_CONFIG
        | opcodes::READ_PROGRAM
        | opcodes::READ_DATA
        | opcodes::VERSION
        | opcodes::NOP => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(command: Command) -> Vec<u8> {
        let mut out = Vec::new();
        command.encode_into(&mut out);
        out
    }

    #[test]
    fn test_encoding() {
        assert_eq!(encode(Command::WriteWord(0x3FAB)), b"W\xAB\x3F");
        assert_eq!(encode(Command::WriteData(0x42)), b"D\x42");
        assert_eq!(encode(Command::Increment(0x03FF)), b"I\xFF\x03");
        assert_eq!(encode(Command::Power(PowerState::Oscillator)), b"V3");
        assert_eq!(
            encode(Command::Checksum {
                program_len: 0x03FF,
                eeprom_len: 0x0080
            }),
            b"S\xFF\x03\x80\x00"
        );
        assert_eq!(encode(Command::Nop), b"Z");
    }

    #[test]
    fn test_encoded_len_matches_encoding() {
        let commands = [
            Command::EnterProgramming,
            Command::WriteWord(1),
            Command::WriteData(1),
            Command::Increment(6),
            Command::Power(PowerState::On),
            Command::Checksum {
                program_len: 1,
                eeprom_len: 1,
            },
            Command::ReadData,
        ];
        for command in commands {
            assert_eq!(command.encoded_len(), encode(command).len(), "{:?}", command);
        }
    }

    #[test]
    fn test_programming_mode_commands() {
        assert!(Command::ReadProgram.requires_programming_mode());
        assert!(Command::WriteWord(0).requires_programming_mode());
        assert!(Command::JumpToConfig.requires_programming_mode());
        assert!(!Command::EnterProgramming.requires_programming_mode());
        assert!(!Command::Power(PowerState::Off).requires_programming_mode());
        assert!(!Command::Version.requires_programming_mode());
        assert!(!Command::Checksum {
            program_len: 0,
            eeprom_len: 0
        }
        .requires_programming_mode());
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            Command::decode(b"ZI\x06\x00", 1),
            Ok((Command::Increment(6), 3))
        );
        assert_eq!(
            Command::decode(b"V9", 0),
            Err(FrameError::UnknownOpcode {
                offset: 1,
                opcode: b'9'
            })
        );
        assert_eq!(
            Command::decode(b"x", 0),
            Err(FrameError::UnknownOpcode {
                offset: 0,
                opcode: b'x'
            })
        );
        assert_eq!(
            Command::decode(b"ZZZZZZZW", 7),
            Err(FrameError::Truncated { opcode: 'W' })
        );
    }
}
