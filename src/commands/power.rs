//! Supply and oscillator control

use super::{CmdResult, PicSession};

/// Supply actions that need no chip identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reset,
    On,
    Off,
    OscillatorOn,
    OscillatorOff,
}

pub fn run_power(session: &mut PicSession, action: PowerAction) -> CmdResult {
    match action {
        PowerAction::Reset => {
            session.reset()?;
            println!("Chip power cycled");
        }
        PowerAction::On => {
            session.power_on()?;
            println!("Chip power on");
        }
        PowerAction::Off => {
            session.power_off()?;
            println!("Chip power off");
        }
        PowerAction::OscillatorOn => {
            session.oscillator_on()?;
            println!("2.5 kHz oscillator on");
        }
        PowerAction::OscillatorOff => {
            session.oscillator_off()?;
            println!("2.5 kHz oscillator off");
        }
    }
    Ok(())
}
