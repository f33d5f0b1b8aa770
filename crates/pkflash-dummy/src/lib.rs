//! pkflash-dummy - Emulated PICkit 1 for testing
//!
//! This crate provides a programmer that runs the PICkit 1 command set
//! against a PIC held in memory. It's useful for testing and development
//! without real hardware.
//!
//! The emulated chip has one program counter shared by program, EEPROM and
//! configuration memory, like the real firmware: 'P' resets it to 0, 'C'
//! moves it to 0x2000, and every read or write advances it.

use std::collections::VecDeque;
use std::time::Duration;

use pkflash_core::chip::ChipDescriptor;
use pkflash_core::memory::{
    CALIBRATION_ADDR, CONFIG_ADDR, DEVICE_ID_ADDR, ERASED_BYTE, ERASED_WORD, USER_ID_ADDR,
    USER_ID_WORDS,
};
use pkflash_core::programmer::{Transport, TransportError, FRAME_LEN};
use pkflash_core::protocol::{Command, Frame, PowerState};

/// Words of configuration memory starting at 0x2000
const CONFIG_WORDS: usize = 8;

/// Configuration for the emulated chip and programmer
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Raw device ID word, revision bits included
    pub device_id: u16,
    /// Program memory size in words
    pub program_words: usize,
    /// EEPROM size in bytes
    pub eeprom_bytes: usize,
    /// Factory OSCCAL word at 0x3FF, on chips that have one
    pub calibration: Option<u16>,
    /// CONFIG word as shipped
    pub config: u16,
    /// Firmware version reported by 'v'
    pub firmware: [u8; 3],
    /// Value the calibration firmware measures against the 2.5 kHz reference
    pub calibration_result: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: 0x0FC0, // PIC12F675
            program_words: 0x03FF,
            eeprom_bytes: 128,
            calibration: Some(0x3480),
            config: 0x31FF,
            firmware: [2, 0, 2],
            calibration_result: 0x5C,
        }
    }
}

impl DummyConfig {
    /// Emulate a factory-fresh `chip`
    pub fn for_chip(chip: &ChipDescriptor) -> Self {
        Self {
            device_id: chip.id,
            program_words: chip.program_words,
            eeprom_bytes: chip.eeprom_bytes,
            calibration: chip.preserves_calibration().then_some(0x3480),
            config: if chip.preserves_calibration() { 0x31FF } else { ERASED_WORD },
            ..Self::default()
        }
    }
}

/// Something the emulated chip did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// 'W' stored a word
    WriteWord { address: u32, value: u16 },
    /// 'D' stored an EEPROM byte
    WriteData { address: usize, value: u8 },
    /// 'E' erased program memory, and configuration memory if the PC was there
    EraseProgram { config: bool },
    /// 'e' erased EEPROM
    EraseData,
    /// 'V' changed the supply
    Power(PowerState),
    /// The host waited while the chip ran
    Delay(Duration),
    /// A memory command arrived outside programming mode
    Violation(char),
}

/// Emulated PICkit 1 with a chip in the socket
pub struct DummyPickit {
    config: DummyConfig,
    program: Vec<u16>,
    eeprom: Vec<u8>,
    calibration: Option<u16>,
    config_mem: [u16; CONFIG_WORDS],
    pc: u32,
    programming: bool,
    power: PowerState,
    responses: VecDeque<u8>,
    frames: Vec<[u8; FRAME_LEN]>,
    journal: Vec<Event>,
    fail_after: Option<usize>,
}

impl DummyPickit {
    /// Create an emulated programmer with the given chip
    pub fn new(config: DummyConfig) -> Self {
        let mut config_mem = [ERASED_WORD; CONFIG_WORDS];
        config_mem[(DEVICE_ID_ADDR - USER_ID_ADDR) as usize] = config.device_id;
        config_mem[(CONFIG_ADDR - USER_ID_ADDR) as usize] = config.config;

        Self {
            program: vec![ERASED_WORD; config.program_words],
            eeprom: vec![ERASED_BYTE; config.eeprom_bytes],
            calibration: config.calibration,
            config_mem,
            pc: 0,
            programming: false,
            power: PowerState::Off,
            responses: VecDeque::new(),
            frames: Vec::new(),
            journal: Vec::new(),
            fail_after: None,
            config,
        }
    }

    /// Create an emulated programmer with a PIC12F675
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Program memory contents
    pub fn program(&self) -> &[u16] {
        &self.program
    }

    /// Mutable program memory contents
    pub fn program_mut(&mut self) -> &mut [u16] {
        &mut self.program
    }

    /// EEPROM contents
    pub fn eeprom(&self) -> &[u8] {
        &self.eeprom
    }

    /// Mutable EEPROM contents
    pub fn eeprom_mut(&mut self) -> &mut [u8] {
        &mut self.eeprom
    }

    /// OSCCAL word, on chips that have one
    pub fn calibration(&self) -> Option<u16> {
        self.calibration
    }

    /// CONFIG word
    pub fn config_word(&self) -> u16 {
        self.config_mem[(CONFIG_ADDR - USER_ID_ADDR) as usize]
    }

    /// Overwrite the CONFIG word
    pub fn set_config_word(&mut self, value: u16) {
        self.config_mem[(CONFIG_ADDR - USER_ID_ADDR) as usize] = value;
    }

    /// User ID words
    pub fn user_id(&self) -> [u16; USER_ID_WORDS] {
        let mut ids = [0; USER_ID_WORDS];
        ids.copy_from_slice(&self.config_mem[..USER_ID_WORDS]);
        ids
    }

    /// Current supply state
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Check if the chip is held in programming mode
    pub fn in_programming_mode(&self) -> bool {
        self.programming
    }

    /// Every frame received, in order
    pub fn frames(&self) -> &[[u8; FRAME_LEN]] {
        &self.frames
    }

    /// Everything the chip did, in order
    pub fn journal(&self) -> &[Event] {
        &self.journal
    }

    /// Forget recorded frames and events
    pub fn clear_journal(&mut self) {
        self.frames.clear();
        self.journal.clear();
    }

    /// Accept `frames` more frames, then refuse the next one with a short
    /// transfer
    ///
    /// The failure happens once; later frames are accepted again.
    pub fn fail_after(&mut self, frames: usize) {
        self.fail_after = Some(frames);
    }

    /// Number of memory commands received outside programming mode
    pub fn violations(&self) -> usize {
        self.journal
            .iter()
            .filter(|e| matches!(e, Event::Violation(_)))
            .count()
    }

    fn config_index(address: u32) -> Option<usize> {
        (USER_ID_ADDR..USER_ID_ADDR + CONFIG_WORDS as u32)
            .contains(&address)
            .then(|| (address - USER_ID_ADDR) as usize)
    }

    fn read_word(&self, address: u32) -> u16 {
        if let Some(i) = Self::config_index(address) {
            return self.config_mem[i];
        }
        match self.program.get(address as usize) {
            Some(&word) => word,
            None if address == CALIBRATION_ADDR => self.calibration.unwrap_or(ERASED_WORD),
            None => ERASED_WORD,
        }
    }

    fn write_word(&mut self, address: u32, value: u16) {
        let value = value & ERASED_WORD;
        if let Some(i) = Self::config_index(address) {
            // IDs and CONFIG are writable; reserved words and device ID are not
            if i < USER_ID_WORDS || address == CONFIG_ADDR {
                self.config_mem[i] = value;
            }
        } else if let Some(word) = self.program.get_mut(address as usize) {
            *word = value;
        } else if address == CALIBRATION_ADDR && self.calibration.is_some() {
            self.calibration = Some(value);
        }
    }

    fn eeprom_index(&self, address: u32) -> Option<usize> {
        (!self.eeprom.is_empty()).then(|| address as usize % self.eeprom.len())
    }

    fn respond(&mut self, bytes: &[u8]) {
        let mut report = [0u8; FRAME_LEN];
        report[..bytes.len()].copy_from_slice(bytes);
        self.responses.extend(report);
    }

    fn execute(&mut self, command: Command) {
        if command.requires_programming_mode() && !self.programming {
            log::warn!("'{}' outside programming mode", command.opcode() as char);
            self.journal.push(Event::Violation(command.opcode() as char));
            return;
        }

        match command {
            Command::EnterProgramming => {
                self.programming = true;
                self.pc = 0;
            }
            Command::ExitProgramming => self.programming = false,
            Command::EraseProgram => {
                let config = self.pc >= USER_ID_ADDR;
                self.program.fill(ERASED_WORD);
                if self.calibration.is_some() {
                    self.calibration = Some(ERASED_WORD);
                }
                if config {
                    self.config_mem[..USER_ID_WORDS].fill(ERASED_WORD);
                    self.set_config_word(ERASED_WORD);
                }
                self.journal.push(Event::EraseProgram { config });
            }
            Command::EraseData => {
                self.eeprom.fill(ERASED_BYTE);
                self.journal.push(Event::EraseData);
            }
            Command::WriteWord(value) => {
                self.write_word(self.pc, value);
                self.journal.push(Event::WriteWord {
                    address: self.pc,
                    value,
                });
                self.pc += 1;
            }
            Command::WriteData(value) => {
                if let Some(address) = self.eeprom_index(self.pc) {
                    self.eeprom[address] = value;
                    self.journal.push(Event::WriteData { address, value });
                }
                self.pc += 1;
            }
            Command::JumpToConfig => self.pc = USER_ID_ADDR,
            Command::Increment(count) => self.pc += count as u32,
            Command::ReadProgram => {
                let bytes: Vec<u8> = (0..4)
                    .flat_map(|i| self.read_word(self.pc + i).to_le_bytes())
                    .collect();
                self.respond(&bytes);
                self.pc += 4;
            }
            Command::ReadData => {
                let bytes: Vec<u8> = (0..8)
                    .map(|i| {
                        self.eeprom_index(self.pc + i)
                            .map_or(ERASED_BYTE, |a| self.eeprom[a])
                    })
                    .collect();
                self.respond(&bytes);
                self.pc += 8;
            }
            Command::Power(state) => {
                self.power = state;
                self.journal.push(Event::Power(state));
            }
            Command::Version => {
                let firmware = self.config.firmware;
                self.respond(&firmware);
            }
            Command::Checksum {
                program_len,
                eeprom_len,
            } => {
                let program = (0..program_len as u32)
                    .fold(0u16, |sum, a| sum.wrapping_add(self.read_word(a)));
                let eeprom = (0..eeprom_len as u32).fold(0u16, |sum, a| {
                    let byte = self.eeprom_index(a).map_or(ERASED_BYTE, |i| self.eeprom[i]);
                    sum.wrapping_add(byte as u16)
                });
                let [p_lo, p_hi] = program.to_le_bytes();
                let [e_lo, e_hi] = eeprom.to_le_bytes();
                self.respond(&[p_lo, p_hi, e_lo, e_hi]);
            }
            Command::Nop => {}
        }
    }

    /// The calibration firmware stores its measurement in the last EEPROM
    /// byte while it runs against the 2.5 kHz reference
    fn run_chip(&mut self) {
        let running = self.power == PowerState::Oscillator && !self.programming;
        let has_firmware = self.program.iter().any(|&w| w != ERASED_WORD);
        if running && has_firmware && self.calibration.is_some() {
            if let Some(last) = self.eeprom.last_mut() {
                *last = self.config.calibration_result;
                log::debug!(
                    "Calibration firmware measured 0x{:02X}",
                    self.config.calibration_result
                );
            }
        }
    }
}

impl Transport for DummyPickit {
    fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), TransportError> {
        match self.fail_after.take() {
            Some(0) => {
                log::debug!("Dropping frame {:02x?}", frame);
                return Err(TransportError::ShortTransfer {
                    expected: FRAME_LEN,
                    actual: 0,
                });
            }
            Some(remaining) => self.fail_after = Some(remaining - 1),
            None => {}
        }
        self.frames.push(*frame);
        let commands = Frame::from_bytes(*frame)
            .commands()
            .map_err(|e| TransportError::Usb(e.to_string()))?;
        for command in commands {
            self.execute(command);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let len = buf.len();
        if self.responses.len() < len {
            return Err(TransportError::Timeout);
        }
        for (dst, src) in buf.iter_mut().zip(self.responses.drain(..len)) {
            *dst = src;
        }
        Ok(())
    }

    fn delay(&mut self, duration: Duration) {
        self.journal.push(Event::Delay(duration));
        self.run_chip();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(pickit: &mut DummyPickit, frame: &[u8; FRAME_LEN]) {
        pickit.write_frame(frame).unwrap();
    }

    fn recv(pickit: &mut DummyPickit) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        pickit.read(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_version() {
        let mut pickit = DummyPickit::new_default();
        send(&mut pickit, b"vZZZZZZZ");
        assert_eq!(recv(&mut pickit), [2, 0, 2, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_read_without_request_times_out() {
        let mut pickit = DummyPickit::new_default();
        let mut buf = [0u8; FRAME_LEN];
        assert_eq!(pickit.read(&mut buf), Err(TransportError::Timeout));
    }

    #[test]
    fn test_failed_frame_is_not_executed() {
        let mut pickit = DummyPickit::new_default();
        pickit.fail_after(1);
        send(&mut pickit, b"PZZZZZZZ");
        assert_eq!(
            pickit.write_frame(b"W\x00\x00ZZZZZ"),
            Err(TransportError::ShortTransfer {
                expected: FRAME_LEN,
                actual: 0
            })
        );
        assert_eq!(pickit.program()[0], 0x3FFF);
        assert_eq!(pickit.frames().len(), 1);

        send(&mut pickit, b"W\x00\x00ZZZZZ");
        assert_eq!(pickit.program()[0], 0x0000);
    }

    #[test]
    fn test_device_id_read() {
        let mut pickit = DummyPickit::new_default();
        send(&mut pickit, b"pPCI\x06\x00ZZ");
        send(&mut pickit, b"RZZZZZZZ");
        assert_eq!(recv(&mut pickit), [0xC0, 0x0F, 0xFF, 0x31, 0xFF, 0x3F, 0xFF, 0x3F]);
    }

    #[test]
    fn test_write_words_advance_pc() {
        let mut pickit = DummyPickit::new_default();
        send(&mut pickit, b"PZZZZZZZ");
        send(&mut pickit, b"W\x05\x28W\xff\x3fZZ");
        send(&mut pickit, b"W\x23\x01ZZZZZ");
        send(&mut pickit, b"pZZZZZZZ");
        assert_eq!(&pickit.program()[..4], &[0x2805, 0x3FFF, 0x0123, 0x3FFF]);
    }

    #[test]
    fn test_calibration_word_addressable() {
        let mut pickit = DummyPickit::new_default();
        send(&mut pickit, b"V0V1PI\xff\x03");
        send(&mut pickit, b"RZZZZZZZ");
        assert_eq!(&recv(&mut pickit)[..2], &[0x80, 0x34]);
    }

    #[test]
    fn test_memory_commands_need_programming_mode() {
        let mut pickit = DummyPickit::new_default();
        send(&mut pickit, b"W\x00\x00ZZZZZ");
        assert_eq!(pickit.violations(), 1);
        assert_eq!(pickit.program()[0], 0x3FFF);
    }

    #[test]
    fn test_erase_in_config_space() {
        let mut pickit = DummyPickit::new_default();
        pickit.program_mut()[0] = 0x0000;
        send(&mut pickit, b"PEpZZZZZ");
        assert_eq!(pickit.program()[0], 0x3FFF);
        assert_eq!(pickit.config_word(), 0x31FF);
        assert_eq!(pickit.calibration(), Some(0x3FFF));

        send(&mut pickit, b"PCEepZZZ");
        assert_eq!(pickit.config_word(), 0x3FFF);
        assert!(pickit.journal().contains(&Event::EraseProgram { config: true }));
    }

    #[test]
    fn test_device_checksum() {
        let mut pickit = DummyPickit::new_default();
        pickit.program_mut().fill(0x0001);
        pickit.eeprom_mut()[0] = 0x01;
        send(&mut pickit, b"S\xff\x03\x80\x00V1Z");
        let reply = recv(&mut pickit);

        assert_eq!(u16::from_le_bytes([reply[0], reply[1]]), 0x03FF);
        // 127 erased bytes plus one 0x01
        assert_eq!(reply[2], (127u16 * 0xFF + 1) as u8);
    }

    #[test]
    fn test_calibration_needs_oscillator() {
        let mut pickit = DummyPickit::new_default();
        pickit.program_mut()[0] = 0x2800;
        send(&mut pickit, b"V1ZZZZZZ");
        pickit.delay(Duration::from_secs(1));
        assert_eq!(pickit.eeprom()[127], 0xFF);

        send(&mut pickit, b"V3ZZZZZZ");
        pickit.delay(Duration::from_secs(1));
        assert_eq!(pickit.eeprom()[127], 0x5C);
    }
}
