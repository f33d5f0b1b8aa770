//! 8-byte command frames

use std::fmt;

use super::command::{Command, FrameError};
use crate::programmer::FRAME_LEN;

/// One 8-byte command frame
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Wrap raw frame bytes
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Decode every command in the frame, padding included
    pub fn commands(&self) -> Result<Vec<Command>, FrameError> {
        let mut commands = Vec::new();
        let mut offset = 0;
        while offset < FRAME_LEN {
            let (command, used) = Command::decode(&self.0, offset)?;
            commands.push(command);
            offset += used;
        }
        Ok(commands)
    }

    /// Bytes the programmer answers this frame with
    ///
    /// Returns 0 if the frame does not decode.
    pub fn response_len(&self) -> usize {
        self.commands()
            .map(|cmds| cmds.iter().map(Command::response_len).sum())
            .unwrap_or(0)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(\"{}\")", self)
    }
}

/// Printable opcodes as-is, argument bytes as `\xNN`
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_alphanumeric() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// Assembles commands into a frame
///
/// Unused trailing bytes are filled with 'Z' by [`FrameBuilder::finish`].
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    buf: Vec<u8>,
}

impl FrameBuilder {
    /// Start an empty frame
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(FRAME_LEN),
        }
    }

    /// Check if `command` still fits
    pub fn fits(&self, command: &Command) -> bool {
        self.buf.len() + command.encoded_len() <= FRAME_LEN
    }

    /// Append `command` if it fits. Returns false if the frame is full.
    pub fn try_push(&mut self, command: Command) -> bool {
        if !self.fits(&command) {
            return false;
        }
        command.encode_into(&mut self.buf);
        true
    }

    /// Append `command`
    ///
    /// # Panics
    ///
    /// Panics if the command does not fit. Use this only for fixed command
    /// sequences known to fit in one frame.
    pub fn push(mut self, command: Command) -> Self {
        assert!(
            self.try_push(command),
            "{:?} does not fit in the frame",
            command
        );
        self
    }

    /// Append several commands, see [`FrameBuilder::push`]
    pub fn extend(self, commands: impl IntoIterator<Item = Command>) -> Self {
        commands.into_iter().fold(self, FrameBuilder::push)
    }

    /// Check if nothing was pushed yet
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pad with 'Z' and return the frame
    pub fn finish(self) -> Frame {
        let mut bytes = [super::opcodes::NOP; FRAME_LEN];
        bytes[..self.buf.len()].copy_from_slice(&self.buf);
        Frame(bytes)
    }
}

/// Pack commands into as few frames as possible, keeping their order
fn pack(commands: impl IntoIterator<Item = Command>) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut builder = FrameBuilder::new();
    for command in commands {
        if !builder.try_push(command) {
            frames.push(std::mem::take(&mut builder).finish());
            builder.try_push(command);
        }
    }
    if !builder.is_empty() {
        frames.push(builder.finish());
    }
    frames
}

/// Frames writing `words` to consecutive program addresses, two per frame
pub fn pack_words(words: &[u16]) -> Vec<Frame> {
    pack(words.iter().map(|&w| Command::WriteWord(w)))
}

/// Frames writing `bytes` to consecutive EEPROM addresses, four per frame
pub fn pack_data(bytes: &[u8]) -> Vec<Frame> {
    pack(bytes.iter().map(|&b| Command::WriteData(b)))
}
