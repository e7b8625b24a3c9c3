//! Single-bin tone detection with the Goertzel recursion.
//!
//! One multiply-add per sample and two state registers give the DFT bin at a
//! single target frequency. Magnitudes are reported unnormalized; multiply by
//! `2 / N` (see [`GoertzelResult::normalized_magnitude`]) to recover the peak
//! amplitude of a sinusoid present in an N-sample buffer.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{DspError, Result};

/// Magnitude and phase of one bin over one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoertzelResult {
    /// Unnormalized bin magnitude
    pub magnitude: f64,
    /// Bin phase in radians, -PI..PI
    pub phase: f64,
}

impl GoertzelResult {
    /// Magnitude scaled by 2/N, the peak amplitude of a matching sinusoid
    pub fn normalized_magnitude(&self, num_samples: usize) -> f64 {
        if num_samples == 0 {
            return 0.0;
        }
        self.magnitude * 2.0 / num_samples as f64
    }
}

/// Precomputed Goertzel coefficients for one target frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goertzel {
    target_hz: f64,
    sample_rate: f64,
    cos_w: f64,
    sin_w: f64,
    coeff: f64,
}

impl Goertzel {
    /// # Errors
    /// Returns `DspError::InvalidSpec` unless `0 < target_hz < sample_rate / 2`.
    pub fn new(target_hz: f64, sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidSpec(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if !(target_hz.is_finite() && target_hz > 0.0 && target_hz < sample_rate / 2.0) {
            return Err(DspError::InvalidSpec(format!(
                "target frequency {} Hz must be between 0 and Nyquist ({} Hz)",
                target_hz,
                sample_rate / 2.0
            )));
        }
        let w = 2.0 * PI * target_hz / sample_rate;
        let (sin_w, cos_w) = w.sin_cos();
        Ok(Self {
            target_hz,
            sample_rate,
            cos_w,
            sin_w,
            coeff: 2.0 * cos_w,
        })
    }

    pub fn target_hz(&self) -> f64 {
        self.target_hz
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    fn step(&self, state: &mut (f64, f64), sample: f32) {
        let (z1, z2) = *state;
        let z0 = sample as f64 + self.coeff * z1 - z2;
        *state = (z0, z1);
    }

    fn finish(&self, state: (f64, f64)) -> GoertzelResult {
        let (z1, z2) = state;
        let bin = Complex64::new(self.cos_w * z1 - z2, self.sin_w * z1);
        GoertzelResult {
            magnitude: bin.norm(),
            phase: bin.arg(),
        }
    }

    /// Run the recursion over a whole buffer
    ///
    /// # Errors
    /// Returns `DspError::InvalidInput` for an empty buffer.
    pub fn evaluate(&self, samples: &[f32]) -> Result<GoertzelResult> {
        if samples.is_empty() {
            return Err(DspError::InvalidInput(
                "Goertzel needs at least one sample".to_string(),
            ));
        }
        let mut state = (0.0, 0.0);
        for &sample in samples {
            self.step(&mut state, sample);
        }
        Ok(self.finish(state))
    }
}

/// Evaluate one bin at `target_hz` over `samples`
pub fn goertzel(samples: &[f32], target_hz: f64, sample_rate: f64) -> Result<GoertzelResult> {
    Goertzel::new(target_hz, sample_rate)?.evaluate(samples)
}

/// Streaming tone detector that accumulates across blocks
///
/// The recursion runs continuously; every `window_len` samples the
/// normalized magnitude is published and the state restarts.
#[derive(Debug, Clone)]
pub struct BlockGoertzel {
    goertzel: Goertzel,
    window_len: usize,
    count: usize,
    state: (f64, f64),
    last_magnitude: f32,
    last_phase: f64,
}

impl BlockGoertzel {
    pub fn new(target_hz: f64, sample_rate: f64, window_len: usize) -> Result<Self> {
        if window_len == 0 {
            return Err(DspError::InvalidSpec(
                "detection window must hold at least one sample".to_string(),
            ));
        }
        Ok(Self {
            goertzel: Goertzel::new(target_hz, sample_rate)?,
            window_len,
            count: 0,
            state: (0.0, 0.0),
            last_magnitude: 0.0,
            last_phase: 0.0,
        })
    }

    /// Change the target frequency, discarding any partial window
    pub fn retune(&mut self, target_hz: f64) -> Result<()> {
        self.goertzel = Goertzel::new(target_hz, self.goertzel.sample_rate())?;
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.state = (0.0, 0.0);
        self.last_magnitude = 0.0;
        self.last_phase = 0.0;
    }

    /// Feed samples; returns the newest normalized magnitude if at least one
    /// window completed inside this block.
    pub fn process_block(&mut self, samples: &[f32]) -> Option<f32> {
        let mut published = None;
        for &sample in samples {
            self.goertzel.step(&mut self.state, sample);
            self.count += 1;
            if self.count == self.window_len {
                let result = self.goertzel.finish(self.state);
                self.last_magnitude = result.normalized_magnitude(self.window_len) as f32;
                self.last_phase = result.phase;
                published = Some(self.last_magnitude);
                self.state = (0.0, 0.0);
                self.count = 0;
            }
        }
        published
    }

    /// Normalized magnitude of the last completed window
    pub fn magnitude(&self) -> f32 {
        self.last_magnitude
    }

    /// Phase of the last completed window
    pub fn phase(&self) -> f64 {
        self.last_phase
    }

    pub fn target_hz(&self) -> f64 {
        self.goertzel.target_hz()
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }
}
