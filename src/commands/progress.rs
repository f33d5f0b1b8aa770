//! Progress bars for device operations

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pkflash_core::device::Progress;
use pkflash_core::memory::Region;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn unit(region: Region) -> &'static str {
    match region {
        Region::Eeprom => "EEPROM bytes",
        _ => "program words",
    }
}

/// [`Progress`] implementation drawing one bar per memory region
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self, total: usize, message: String) {
        self.finish();
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_message(message);
        self.bar = Some(bar);
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Progress for BarProgress {
    fn reading(&mut self, region: Region, total: usize) {
        self.start(total, format!("{} read", unit(region)));
    }

    fn read_progress(&mut self, done: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn erasing(&mut self) {
        self.finish();
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message("Erasing...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(spinner);
    }

    fn writing(&mut self, region: Region, total: usize) {
        self.start(total, format!("{} written", unit(region)));
    }

    fn write_progress(&mut self, done: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn finished(&mut self) {
        self.finish();
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        self.finish();
    }
}
