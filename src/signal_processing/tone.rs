use std::f64::consts::TAU;

use crate::error::{DspError, Result};
use crate::signal_processing::math::db_to_linear;

/// Continuous sinusoid source for the CTCSS encoder
///
/// The oscillator runs whether or not output is enabled, so enabling it
/// mid-stream continues the existing phase. Phase is wrapped to `[0, 2*PI)`
/// after every block.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: f64,
    frequency_hz: f64,
    omega: f64,
    phase: f64,
    level: f32,
    enabled: bool,
}

impl ToneGenerator {
    pub fn new(frequency_hz: f64, sample_rate: f64, level_db: f32) -> Result<Self> {
        let mut tone = Self {
            sample_rate,
            frequency_hz: 0.0,
            omega: 0.0,
            phase: 0.0,
            level: db_to_linear(level_db),
            enabled: false,
        };
        tone.set_frequency(frequency_hz)?;
        Ok(tone)
    }

    /// Retune, restarting the phase at zero
    pub fn set_frequency(&mut self, frequency_hz: f64) -> Result<()> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0 && frequency_hz < self.sample_rate / 2.0)
        {
            return Err(DspError::InvalidSpec(format!(
                "tone frequency {} Hz must be between 0 and Nyquist ({} Hz)",
                frequency_hz,
                self.sample_rate / 2.0
            )));
        }
        self.frequency_hz = frequency_hz;
        self.omega = TAU * frequency_hz / self.sample_rate;
        self.phase = 0.0;
        Ok(())
    }

    /// Peak level in dB relative to full scale
    pub fn set_level_db(&mut self, level_db: f32) {
        self.level = db_to_linear(level_db);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Linear peak amplitude
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Add the tone into `buffer` (nothing is added while disabled)
    pub fn mix_into(&mut self, buffer: &mut [f32]) {
        let level = if self.enabled { self.level } else { 0.0 };
        for sample in buffer.iter_mut() {
            *sample += level * self.phase.cos() as f32;
            self.phase += self.omega;
        }
        self.phase = self.phase.rem_euclid(TAU);
    }

    /// Generate one block of tone
    pub fn generate(&mut self, len: usize) -> Vec<f32> {
        let mut block = vec![0.0; len];
        self.mix_into(&mut block);
        block
    }
}
