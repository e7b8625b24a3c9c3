use crate::error::{DspError, Result};

/// Samples tagged with the rate they were taken at
///
/// Stages take a buffer by value and hand back a new one, so a buffer is only
/// ever owned by the stage currently working on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DspError::InvalidInput(
                "sample rate must be positive".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Buffer of `len` zeros
    pub fn silence(len: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Fail unless the buffer was sampled at `expected` Hz
    pub fn expect_rate(&self, expected: u32) -> Result<()> {
        if self.sample_rate != expected {
            return Err(DspError::SampleRateMismatch {
                expected,
                actual: self.sample_rate,
            });
        }
        Ok(())
    }
}
