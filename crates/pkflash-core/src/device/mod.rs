//! Programming sessions and device operations

mod check;
mod operations;
mod progress;
mod session;

pub use check::{blank_check, check_blank, compare, verify};
pub use operations::{
    bulk_erase, erase, read, read_config, read_config_report, read_device_checksum,
    read_eeprom, read_program, regenerate_calibration, resolve_chip, set_bandgap, write,
    write_config, write_eeprom, write_program, ConfigReport, ProgramSettled, Recalibration,
};
pub use progress::{NoProgress, Progress};
pub use session::{FirmwareVersion, Mode, Session};

use crate::chip::ChipDescriptor;
use crate::memory::MemoryState;

/// A chip identified in the socket, with a state sized for it
#[derive(Debug, Clone)]
pub struct ResolvedChip<'r> {
    /// Registry entry
    pub chip: &'r ChipDescriptor,
    /// Silicon revision (low 5 bits of the device ID word)
    pub revision: u8,
    /// Erased state sized and configured for the chip
    pub state: MemoryState,
}

impl ResolvedChip<'_> {
    /// A fresh erased state for the same chip
    pub fn blank_state(&self) -> MemoryState {
        MemoryState::for_chip(self.chip)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::chip::Registry;
    use crate::error::Error;
    use crate::programmer::{Transport, TransportError, FRAME_LEN};

    /// Records frames and answers reads from a queue
    #[derive(Default)]
    struct Script {
        sent: Vec<[u8; FRAME_LEN]>,
        replies: VecDeque<u8>,
    }

    impl Script {
        fn reply(mut self, bytes: &[u8]) -> Self {
            let mut report = [0u8; FRAME_LEN];
            report[..bytes.len()].copy_from_slice(bytes);
            self.replies.extend(report);
            self
        }
    }

    impl Transport for Script {
        fn write_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<(), TransportError> {
            self.sent.push(*frame);
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
            if self.replies.len() < buf.len() {
                return Err(TransportError::Timeout);
            }
            for b in buf.iter_mut() {
                *b = self.replies.pop_front().unwrap_or(0);
            }
            Ok(())
        }

        fn delay(&mut self, _duration: std::time::Duration) {}
    }

    fn sent(session: &Session<Script>) -> &[[u8; FRAME_LEN]] {
        &session.transport().sent
    }

    #[test]
    fn test_open_handshake() {
        let session = Session::open(Script::default().reply(&[2, 0, 2])).unwrap();
        assert_eq!(sent(&session), [*b"V0ZZZZZZ", *b"vZZZZZZZ"]);
        assert_eq!(session.firmware().to_string(), "2.0.2");
        assert_eq!(session.mode(), Mode::Idle);
    }

    #[test]
    fn test_open_fails_without_reply() {
        let err = Session::open(Script::default()).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_memory_command_rejected_while_idle() {
        let mut session = Session::open(Script::default().reply(&[2, 0, 2])).unwrap();
        let err = session.read_words(4).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { opcode: 'R' }));
        // nothing reached the wire
        assert_eq!(session.transport().sent.len(), 2);
    }

    #[test]
    fn test_drop_leaves_programming_mode() {
        let mut script = Script::default().reply(&[2, 0, 2]);
        {
            let mut session = Session::open(&mut script).unwrap();
            session.send(crate::protocol::frames::enter()).unwrap();
            assert_eq!(session.mode(), Mode::Programming);
        }
        assert_eq!(script.sent.last(), Some(b"pV1ZZZZZ"));
    }

    #[test]
    fn test_resolve_chip() {
        let registry = Registry::builtin();
        let script = Script::default()
            .reply(&[2, 0, 2])
            .reply(&[0xC3, 0x0F, 0xFF, 0x3F, 0xFF, 0x3F, 0xFF, 0x3F]);
        let mut session = Session::open(script).unwrap();

        let chip = resolve_chip(&mut session, &registry).unwrap();
        assert_eq!(chip.chip.name, "12F675");
        assert_eq!(chip.revision, 3);
        assert_eq!(chip.state.program_len(), 0x3FF);
        assert!(chip.state.config.preserve_calibration);

        assert_eq!(
            sent(&session)[2..],
            [
                *b"pV0V1PCZ",
                *b"pPCI\x06\x00ZZ",
                *b"RZZZZZZZ",
                *b"pV1ZZZZZ"
            ]
        );
    }

    #[test]
    fn test_resolve_unknown_chip() {
        let registry = Registry::builtin();
        let script = Script::default().reply(&[2, 0, 2]).reply(&[0x21, 0x3F]);
        let mut session = Session::open(script).unwrap();

        let err = resolve_chip(&mut session, &registry).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedDevice {
                id: 0x3F20,
                revision: 1
            }
        ));
        assert_eq!(session.mode(), Mode::Idle);
    }
}
