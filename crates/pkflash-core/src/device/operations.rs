//! Device operations
//!
//! Each operation is a fixed frame sequence. Reads and writes of one region
//! are bracketed by entering and leaving programming mode, and the address
//! seeks rely on 'P' resetting the chip's PC to 0.

use std::time::Duration;

use super::{Progress, ResolvedChip, Session};
use crate::chip::{ChipDescriptor, Registry};
use crate::error::{Error, Result};
use crate::memory::{
    ConfigBlock, MemoryState, Region, BANDGAP_MASK, BANDGAP_SHIFT, RETLW, USER_ID_WORDS,
};
use crate::programmer::{Transport, FRAME_LEN};
use crate::protocol::{frames, pack_data, pack_words};

/// Time the calibration firmware needs to measure the reference oscillator
const CALIBRATION_RUN_TIME: Duration = Duration::from_secs(1);

/// Offset of the last eight bytes of a 128-byte EEPROM
const CALIBRATION_RESULT_BLOCK: usize = 7;

/// Proof that program memory is in its final state
///
/// Some CONFIG word values enable code protection, after which program
/// memory can no longer be written. [`write_config`] therefore demands this
/// token, which only a finished [`write_program`] produces.
#[derive(Debug)]
pub struct ProgramSettled {
    _private: (),
}

impl ProgramSettled {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// Identify the chip in the socket
///
/// The returned state is sized and configured for the chip, with every
/// field at its erased value.
pub fn resolve_chip<'r, T: Transport>(
    session: &mut Session<T>,
    registry: &'r Registry,
) -> Result<ResolvedChip<'r>> {
    session.send(frames::restart_at_user_id())?;
    session.send(frames::reenter_at_device_id())?;
    let raw = session.read_word()?;
    session.send(frames::exit_powered())?;

    let (id, revision) = ChipDescriptor::split_id(raw);
    log::debug!("Device ID word 0x{:04X}", raw);

    let chip = registry
        .lookup(id)
        .ok_or(Error::UnsupportedDevice { id, revision })?;
    log::info!("PIC{} Rev {} found", chip.name, revision);

    Ok(ResolvedChip {
        chip,
        revision,
        state: MemoryState::for_chip(chip),
    })
}

/// Read EEPROM data, 64 bytes per frame
pub fn read_eeprom<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &mut MemoryState,
    progress: &mut P,
) -> Result<()> {
    let len = state.eeprom_len();
    progress.reading(Region::Eeprom, len);

    session.send(frames::enter())?;
    let mut block = [0u8; 8 * FRAME_LEN];
    let mut done = 0;
    while done < len {
        session.send(frames::read_data_block())?;
        session.recv(&mut block)?;
        let take = (len - done).min(block.len());
        state.eeprom[done..done + take].copy_from_slice(&block[..take]);
        done += take;
        progress.read_progress(done);
    }
    session.send(frames::exit())?;

    progress.finished();
    Ok(())
}

/// Read program memory, four words per frame
pub fn read_program<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &mut MemoryState,
    progress: &mut P,
) -> Result<()> {
    let len = state.program_len();
    progress.reading(Region::Program, len);

    session.send(frames::enter())?;
    for start in (0..len).step_by(64) {
        let count = (len - start).min(64);
        let words = session.read_words(count)?;
        state.program[start..start + count].copy_from_slice(&words);
        progress.read_progress(start + count);
    }
    session.send(frames::exit_powered())?;

    progress.finished();
    Ok(())
}

/// Read OSCCAL (on chips that preserve it), the user IDs and the CONFIG word
pub fn read_config<T: Transport>(session: &mut Session<T>, config: &mut ConfigBlock) -> Result<()> {
    if config.preserve_calibration {
        session.send(frames::restart_at_calibration())?;
        config.calibration = session.read_word()?;
    }

    session.send(frames::restart_at_user_id())?;
    let ids = session.read_words(USER_ID_WORDS)?;
    config.user_id.copy_from_slice(&ids);

    session.send(frames::reenter_at_config())?;
    config.config = session.read_word()?;
    session.send(frames::exit_powered())?;

    log::debug!(
        "Config 0x{:04X}, OSCCAL 0x{:04X}, IDs {:04X?}",
        config.config,
        config.calibration,
        config.user_id
    );
    Ok(())
}

/// Read the whole chip into `state` and compute its software checksum
pub fn read<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &mut MemoryState,
    progress: &mut P,
) -> Result<()> {
    read_eeprom(session, state, progress)?;
    read_program(session, state, progress)?;
    read_config(session, &mut state.config)?;
    state.compute_checksum();
    Ok(())
}

/// Bulk erase program and configuration memory, and EEPROM unless kept
///
/// This loses OSCCAL and the bandgap bits; callers restore them.
pub fn bulk_erase<T: Transport>(session: &mut Session<T>, keep_eeprom: bool) -> Result<()> {
    log::debug!("Bulk erase (keep EEPROM: {})", keep_eeprom);
    session.send(frames::bulk_erase(keep_eeprom))
}

/// Write the first `max_ee` EEPROM bytes, four per frame
pub fn write_eeprom<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &MemoryState,
    progress: &mut P,
) -> Result<()> {
    let data = &state.eeprom[..state.max_ee.min(state.eeprom_len())];
    log::info!("Writing {} EEPROM bytes", data.len());
    progress.writing(Region::Eeprom, data.len());

    session.send(frames::enter())?;
    for (i, frame) in pack_data(data).into_iter().enumerate() {
        session.send(frame)?;
        progress.write_progress(((i + 1) * 4).min(data.len()));
    }
    session.send(frames::exit())?;

    progress.finished();
    Ok(())
}

/// Write the first `max_prog` program words, two per frame
pub fn write_program<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &MemoryState,
    progress: &mut P,
) -> Result<ProgramSettled> {
    let words = &state.program[..state.max_prog.min(state.program_len())];
    log::info!("Writing {} program words", words.len());
    progress.writing(Region::Program, words.len());

    session.send(frames::enter())?;
    for (i, frame) in pack_words(words).into_iter().enumerate() {
        session.send(frame)?;
        progress.write_progress(((i + 1) * 2).min(words.len()));
    }
    session.send(frames::exit_powered())?;

    progress.finished();
    Ok(ProgramSettled::new())
}

/// Write OSCCAL (on chips that preserve it), the user IDs and the CONFIG word
///
/// Every bit of the CONFIG word is written as given.
pub fn write_config<T: Transport>(
    session: &mut Session<T>,
    config: &ConfigBlock,
    _settled: &ProgramSettled,
) -> Result<()> {
    session.send(frames::restart_at_calibration())?;
    if config.preserve_calibration {
        session.write_words(&[config.calibration])?;
    }

    session.send(frames::restart_at_user_id())?;
    session.write_words(&config.user_id)?;

    session.send(frames::reenter_at_config())?;
    session.write_words(&[config.config])?;
    session.send(frames::exit_powered())
}

/// Rewrite OSCCAL and a fresh CONFIG word after a bulk erase
fn restore_calibration<T: Transport>(
    session: &mut Session<T>,
    calibration: u16,
    config: u16,
) -> Result<()> {
    session.send(frames::restart_at_calibration())?;
    session.write_words(&[calibration])?;
    session.send(frames::reenter_at_config())?;
    session.write_words(&[config])?;
    session.send(frames::exit_powered())
}

/// Program `state` into the chip
///
/// With `keep_old`, OSCCAL and the bandgap bits are read before the erase
/// and merged into the CONFIG block that is written back. Without it the
/// CONFIG block from `state` is written verbatim, which may destroy the
/// factory calibration.
///
/// EEPROM is only erased when `state` carries EEPROM data.
pub fn write<T: Transport, P: Progress>(
    session: &mut Session<T>,
    state: &mut MemoryState,
    keep_old: bool,
    progress: &mut P,
) -> Result<()> {
    let checksum = state.compute_checksum();
    log::info!("Calculated checksum from .hex file: 0x{:04X}", checksum);

    let old = if keep_old {
        let mut old = state.config.clone();
        read_config(session, &mut old)?;
        Some(old)
    } else {
        None
    };

    let keep_eeprom = state.max_ee == 0;
    progress.erasing();
    bulk_erase(session, keep_eeprom)?;

    write_eeprom(session, state, progress)?;
    let settled = write_program(session, state, progress)?;

    // The programmer checksum would cover the new program but the old CONFIG
    // word at this point, so it is not compared here.
    match old {
        Some(old) => write_config(session, &state.config.merged_with(&old), &settled),
        None => write_config(session, &state.config, &settled),
    }
}

/// Erase the chip, keeping OSCCAL and the bandgap bits where the chip has them
pub fn erase<T: Transport>(session: &mut Session<T>, state: &MemoryState) -> Result<()> {
    let preserve = state.config.preserve_calibration;

    let mut old = state.config.clone();
    if preserve {
        read_config(session, &mut old)?;
    }

    bulk_erase(session, false)?;

    if preserve {
        let config = (old.config & BANDGAP_MASK) | state.config.config_mask;
        restore_calibration(session, old.calibration, config)?;
        log::info!(
            "OSCCAL 0x{:04X} and bandgap {} restored",
            old.calibration,
            old.bandgap()
        );
    }

    log::info!("Device erased");
    Ok(())
}

fn require_calibration(chip: &ResolvedChip<'_>, operation: &'static str) -> Result<()> {
    if chip.state.config.preserve_calibration {
        Ok(())
    } else {
        Err(Error::UnsupportedOperation {
            chip: chip.chip.name.to_string(),
            operation,
        })
    }
}

/// Erase the chip and program new bandgap bits, keeping OSCCAL
pub fn set_bandgap<T: Transport>(
    session: &mut Session<T>,
    chip: &ResolvedChip<'_>,
    level: u8,
) -> Result<()> {
    if level > 3 {
        return Err(Error::InvalidBandgap(level));
    }
    require_calibration(chip, "Bandgap programming")?;

    let mut old = chip.state.config.clone();
    read_config(session, &mut old)?;

    bulk_erase(session, false)?;

    let config = ((level as u16) << BANDGAP_SHIFT) | chip.state.config.config_mask;
    restore_calibration(session, old.calibration, config)?;

    log::info!("Device erased");
    log::info!("OSCCAL 0x{:04X} reprogrammed", old.calibration);
    log::info!("Bandgap {} programmed", level);
    Ok(())
}

/// Result of a calibration regeneration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recalibration {
    /// New OSCCAL word (a RETLW instruction)
    pub calibration: u16,
    /// CONFIG word written afterwards
    pub config: u16,
}

/// Measure and program a new OSCCAL value
///
/// The chip must already hold the calibration firmware (`autocal.hex`),
/// which times the programmer's 2.5 kHz reference and stores the result in
/// the last EEPROM byte. Reopen the session between programming that
/// firmware and calling this.
pub fn regenerate_calibration<T: Transport>(
    session: &mut Session<T>,
    chip: &ResolvedChip<'_>,
) -> Result<Recalibration> {
    require_calibration(chip, "OSCCAL regeneration")?;

    session.send(frames::reenter_at_config())?;
    let old_config = session.read_word()?;
    session.send(frames::exit_powered())?;

    session.oscillator_on()?;
    session.delay(CALIBRATION_RUN_TIME);
    session.power_off()?;

    session.send(frames::read_calibration_result())?;
    let mut block = [0u8; FRAME_LEN];
    session.recv(&mut block)?;
    let calibration = RETLW | block[CALIBRATION_RESULT_BLOCK] as u16;

    bulk_erase(session, false)?;

    session.send(frames::exit_powered())?;
    session.send(frames::enter_at_calibration())?;
    session.write_words(&[calibration])?;

    let config = (old_config & BANDGAP_MASK) | chip.state.config.config_mask;
    session.send(frames::reenter_at_config())?;
    session.write_words(&[config])?;
    session.send(frames::exit_powered())?;

    log::info!("Device erased");
    log::info!("OSCCAL 0x{:04X} regenerated and programmed", calibration);
    log::info!("Config word and bandgap 0x{:04X} restored", config);
    Ok(Recalibration {
        calibration,
        config,
    })
}

/// Ask the programmer to checksum program and EEPROM memory
///
/// Results are stored in the state's [`ConfigBlock`].
pub fn read_device_checksum<T: Transport>(
    session: &mut Session<T>,
    state: &mut MemoryState,
) -> Result<()> {
    session.send(frames::checksum(
        state.program_len() as u16,
        state.eeprom_len() as u16,
    ))?;
    let mut reply = [0u8; FRAME_LEN];
    session.recv(&mut reply)?;
    session.send(frames::exit_powered())?;

    state.config.device_checksum = u16::from_le_bytes([reply[0], reply[1]]);
    state.config.device_ee_checksum = reply[2];
    Ok(())
}

/// Configuration memory as read from the chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    /// OSCCAL word, on chips that have one
    pub calibration: Option<u16>,
    /// Words 0x2000..0x2008: user IDs, reserved, device ID, CONFIG
    pub words: [u16; 8],
    /// Writable CONFIG bits of the chip
    pub config_mask: u16,
    /// Programmer checksum over program memory
    pub device_checksum: u16,
    /// Programmer checksum over EEPROM
    pub device_ee_checksum: u8,
}

impl ConfigReport {
    /// CONFIG word as read
    pub fn config(&self) -> u16 {
        self.words[7]
    }

    /// CONFIG word under the chip's mask
    pub fn masked_config(&self) -> u16 {
        self.config() & self.config_mask
    }

    /// Bandgap bits of the CONFIG word, on chips that have them
    pub fn bandgap(&self) -> Option<u8> {
        self.calibration
            .map(|_| ((self.config() & BANDGAP_MASK) >> BANDGAP_SHIFT) as u8)
    }

    /// Program checksum combined with the masked CONFIG word
    pub fn total_checksum(&self) -> u16 {
        self.device_checksum.wrapping_add(self.masked_config())
    }
}

/// Read the configuration area and the programmer checksums
pub fn read_config_report<T: Transport>(
    session: &mut Session<T>,
    state: &mut MemoryState,
) -> Result<ConfigReport> {
    let calibration = if state.config.preserve_calibration {
        session.send(frames::restart_at_calibration())?;
        Some(session.read_word()?)
    } else {
        None
    };

    session.send(frames::restart_at_user_id())?;
    let mut words = [0u16; 8];
    words.copy_from_slice(&session.read_words(8)?);
    session.send(frames::exit_powered())?;

    read_device_checksum(session, state)?;

    Ok(ConfigReport {
        calibration,
        words,
        config_mask: state.config.config_mask,
        device_checksum: state.config.device_checksum,
        device_ee_checksum: state.config.device_ee_checksum,
    })
}
