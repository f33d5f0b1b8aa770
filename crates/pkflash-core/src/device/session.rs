//! Programming session

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::programmer::{Transport, FRAME_LEN};
use crate::protocol::{frames, Command, Frame, FrameError, PowerState, LAST_KNOWN_GOOD_MAJOR};

/// Whether the chip is held in programming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Normal operation; memory commands are rejected
    Idle,
    /// Vpp applied; memory commands are allowed
    Programming,
}

/// Programmer firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An open connection to the programmer
///
/// Every frame passes through [`Session::send`], which tracks programming
/// mode and refuses memory commands outside of it. Dropping the session
/// leaves programming mode if an error interrupted an operation.
pub struct Session<T: Transport> {
    transport: T,
    mode: Mode,
    firmware: FirmwareVersion,
}

impl<T: Transport> Session<T> {
    /// Take over `transport`: power the chip off and query the firmware
    pub fn open(transport: T) -> Result<Self> {
        let mut session = Self {
            transport,
            mode: Mode::Idle,
            firmware: FirmwareVersion {
                major: 0,
                minor: 0,
                patch: 0,
            },
        };
        session.handshake()?;
        Ok(session)
    }

    /// Run the open handshake again on the same transport
    ///
    /// The calibration firmware only reports its result after the
    /// programmer was reinitialised.
    pub fn reopen(&mut self) -> Result<()> {
        log::debug!("Reinitialising programmer session");
        self.handshake()
    }

    fn handshake(&mut self) -> Result<()> {
        // A powered chip can pick up garbage while the programmer resets
        self.mode = Mode::Idle;
        self.send(frames::power(PowerState::Off))?;

        self.send(frames::version())?;
        let mut reply = [0u8; FRAME_LEN];
        self.recv(&mut reply)?;
        self.firmware = FirmwareVersion {
            major: reply[0],
            minor: reply[1],
            patch: reply[2],
        };

        log::info!(
            "Communication established, onboard firmware version is {}",
            self.firmware
        );
        if self.firmware.major > LAST_KNOWN_GOOD_MAJOR {
            log::warn!(
                "PICkit major version is {}; last known working version is {}",
                self.firmware.major,
                LAST_KNOWN_GOOD_MAJOR
            );
        }
        Ok(())
    }

    /// Firmware version reported at open
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Current programming mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Mode after `frame` runs, or the first command it may not contain
    fn mode_after(&self, frame: &Frame) -> Result<Mode> {
        let commands = frame.commands().map_err(|e| match e {
            FrameError::UnknownOpcode { opcode, .. } => Error::ProtocolViolation {
                opcode: opcode as char,
            },
            FrameError::Truncated { opcode } => Error::ProtocolViolation { opcode },
        })?;

        let mut mode = self.mode;
        for command in commands {
            match command {
                Command::EnterProgramming => mode = Mode::Programming,
                Command::ExitProgramming => mode = Mode::Idle,
                c if c.requires_programming_mode() && mode == Mode::Idle => {
                    return Err(Error::ProtocolViolation {
                        opcode: c.opcode() as char,
                    });
                }
                _ => {}
            }
        }
        Ok(mode)
    }

    /// Send one frame
    pub fn send(&mut self, frame: Frame) -> Result<()> {
        let mode = self.mode_after(&frame)?;
        log::trace!("-> {}", frame);
        self.transport.write_frame(frame.as_bytes())?;
        if mode != self.mode {
            log::debug!("{:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
        Ok(())
    }

    /// Send frames in order
    pub fn send_all(&mut self, frames: impl IntoIterator<Item = Frame>) -> Result<()> {
        frames.into_iter().try_for_each(|frame| self.send(frame))
    }

    /// Receive response reports into `buf`
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<()> {
        self.transport.read(buf)?;
        log::trace!("<- {:02x?}", buf);
        Ok(())
    }

    /// Read `count` program words from the current address
    ///
    /// Words are fetched four at a time; the surplus of the last fetch is
    /// discarded and the chip's PC moves past it.
    pub fn read_words(&mut self, count: usize) -> Result<Vec<u16>> {
        let mut words = Vec::with_capacity(count.next_multiple_of(4));
        let mut reply = [0u8; FRAME_LEN];
        while words.len() < count {
            self.send(frames::read_words())?;
            self.recv(&mut reply)?;
            words.extend(
                reply
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
            );
        }
        words.truncate(count);
        Ok(words)
    }

    /// Read one program word from the current address
    pub fn read_word(&mut self) -> Result<u16> {
        Ok(self.read_words(1)?[0])
    }

    /// Write program words starting at the current address
    pub fn write_words(&mut self, words: &[u16]) -> Result<()> {
        self.send_all(crate::protocol::pack_words(words))
    }

    /// Let the chip run for `duration`
    pub fn delay(&mut self, duration: Duration) {
        self.transport.delay(duration);
    }

    /// Power the chip
    pub fn power_on(&mut self) -> Result<()> {
        self.send(frames::power(PowerState::On))
    }

    /// Remove chip power
    pub fn power_off(&mut self) -> Result<()> {
        self.send(frames::power(PowerState::Off))
    }

    /// Power the chip and start the 2.5 kHz reference
    pub fn oscillator_on(&mut self) -> Result<()> {
        self.send(frames::power(PowerState::Oscillator))
    }

    /// Stop the 2.5 kHz reference, keeping the chip powered
    pub fn oscillator_off(&mut self) -> Result<()> {
        self.send(frames::power(PowerState::On))
    }

    /// Hard reset: power cycle the chip
    pub fn reset(&mut self) -> Result<()> {
        self.power_off()?;
        self.power_on()
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.mode == Mode::Programming {
            log::debug!("Leaving programming mode on session close");
            if let Err(e) = self.send(frames::exit_powered()) {
                log::warn!("Failed to leave programming mode: {}", e);
            }
        }
    }
}

impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("firmware", &self.firmware)
            .finish_non_exhaustive()
    }
}
