//! Decimation and interpolation between the main and control channel rates.
//!
//! Every stage is streaming: feeding a signal in arbitrary chunks produces
//! exactly the samples a single call would.

use crate::error::{DspError, Result};
use crate::filter_design::{FirCoefficients, HalfBandSpec, design_half_band};
use crate::signal_processing::{FirFilterCore, SampleBuffer};

/// Low-pass filter followed by keeping one sample in `factor`
///
/// The first input sample of every group is kept. The convolution only runs
/// for kept samples.
#[derive(Debug, Clone)]
pub struct Decimator {
    core: FirFilterCore,
    factor: usize,
    phase: usize,
}

impl Decimator {
    pub fn new(taps: &FirCoefficients, factor: usize) -> Result<Self> {
        if factor == 0 {
            return Err(DspError::InvalidSpec(
                "decimation factor must be at least 1".to_string(),
            ));
        }
        if taps.is_empty() {
            return Err(DspError::InvalidSpec("decimation filter has no taps".to_string()));
        }
        Ok(Self {
            core: FirFilterCore::new(taps.taps().to_vec()),
            factor,
            phase: 0,
        })
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Decimate a block, appending kept samples to `output`
    pub fn process_into(&mut self, input: &[f32], output: &mut Vec<f32>) {
        for &sample in input {
            self.core.push(sample);
            if self.phase == 0 {
                output.push(self.core.output() as f32);
            }
            self.phase += 1;
            if self.phase == self.factor {
                self.phase = 0;
            }
        }
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = Vec::with_capacity(input.len() / self.factor + 1);
        self.process_into(input, &mut output);
        output
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.phase = 0;
    }

    /// Group delay in input samples
    pub fn group_delay_samples(&self) -> f64 {
        self.core.group_delay_samples()
    }
}

/// Series of decimators taking a buffer from one rate to a lower one
#[derive(Debug, Clone)]
pub struct DecimationChain {
    stages: Vec<Decimator>,
    input_rate: u32,
}

impl DecimationChain {
    /// Cascade of `stages` half-band decimate-by-2 stages sharing one design
    ///
    /// Two stages take 32 kHz to 8 kHz through 16 kHz.
    pub fn half_band(input_rate: u32, num_taps: usize, stages: usize) -> Result<Self> {
        let spec = HalfBandSpec::new(input_rate as f64, num_taps)?;
        let taps = design_half_band(&spec);
        let stages = (0..stages)
            .map(|_| Decimator::new(&taps, 2))
            .collect::<Result<Vec<_>>>()?;
        Self::from_stages(input_rate, stages)
    }

    /// One low-pass and a single stride, e.g. an equiripple fs/8 design by 4
    pub fn single_stage(input_rate: u32, taps: &FirCoefficients, factor: usize) -> Result<Self> {
        Self::from_stages(input_rate, vec![Decimator::new(taps, factor)?])
    }

    fn from_stages(input_rate: u32, stages: Vec<Decimator>) -> Result<Self> {
        if stages.is_empty() {
            return Err(DspError::InvalidSpec(
                "decimation chain needs at least one stage".to_string(),
            ));
        }
        let factor: usize = stages.iter().map(Decimator::factor).product();
        if input_rate as usize % factor != 0 {
            return Err(DspError::InvalidSpec(format!(
                "input rate {} Hz is not divisible by total factor {}",
                input_rate, factor
            )));
        }
        Ok(Self { stages, input_rate })
    }

    pub fn factor(&self) -> usize {
        self.stages.iter().map(Decimator::factor).product()
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.input_rate / self.factor() as u32
    }

    /// Decimate raw samples at the input rate
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut current = input.to_vec();
        for stage in self.stages.iter_mut() {
            current = stage.process(&current);
        }
        current
    }

    /// Decimate a buffer, checking and converting its sample rate
    pub fn process_buffer(&mut self, input: SampleBuffer) -> Result<SampleBuffer> {
        input.expect_rate(self.input_rate)?;
        let output = self.process(input.samples());
        SampleBuffer::new(output, self.output_rate())
    }

    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(Decimator::reset);
    }

    /// Total group delay expressed in input samples
    pub fn group_delay_samples(&self) -> f64 {
        let mut rate_multiplier = 1.0;
        let mut delay = 0.0;
        for stage in &self.stages {
            delay += stage.group_delay_samples() * rate_multiplier;
            rate_multiplier *= stage.factor() as f64;
        }
        delay
    }
}

/// Raises the sample rate by an integer factor
///
/// Implementations insert `factor - 1` zeros after every input sample and
/// low-pass the result, scaling by `factor` to restore the amplitude lost
/// to zero-stuffing.
pub trait Interpolator: Send {
    /// Interpolate a block, returning `factor * input.len()` samples
    fn interpolate(&mut self, input: &[f32]) -> Vec<f32>;

    fn factor(&self) -> usize;

    fn input_rate(&self) -> u32;

    fn reset(&mut self);

    fn output_rate(&self) -> u32 {
        self.input_rate() * self.factor() as u32
    }

    /// Interpolate a buffer, checking and converting its sample rate
    fn process_buffer(&mut self, input: SampleBuffer) -> Result<SampleBuffer> {
        input.expect_rate(self.input_rate())?;
        let output = self.interpolate(input.samples());
        SampleBuffer::new(output, self.output_rate())
    }
}

fn check_interpolation(factor: usize, taps: &FirCoefficients) -> Result<()> {
    if factor == 0 {
        return Err(DspError::InvalidSpec(
            "interpolation factor must be at least 1".to_string(),
        ));
    }
    if taps.is_empty() {
        return Err(DspError::InvalidSpec(
            "interpolation filter has no taps".to_string(),
        ));
    }
    Ok(())
}

/// Zero-stuffing followed by a full-rate FIR convolution
#[derive(Debug, Clone)]
pub struct DirectInterpolator {
    core: FirFilterCore,
    factor: usize,
    input_rate: u32,
}

impl DirectInterpolator {
    /// `taps` are designed at the output rate with unity passband gain
    pub fn new(taps: &FirCoefficients, factor: usize, input_rate: u32) -> Result<Self> {
        check_interpolation(factor, taps)?;
        Ok(Self {
            core: FirFilterCore::new(taps.scaled(factor as f64).into_taps()),
            factor,
            input_rate,
        })
    }
}

impl Interpolator for DirectInterpolator {
    fn interpolate(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = Vec::with_capacity(input.len() * self.factor);
        for &sample in input {
            output.push(self.core.process(sample));
            for _ in 1..self.factor {
                output.push(self.core.process(0.0));
            }
        }
        output
    }

    fn factor(&self) -> usize {
        self.factor
    }

    fn input_rate(&self) -> u32 {
        self.input_rate
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}

/// Polyphase form of the same interpolator
///
/// The taps split into `factor` sub-filters of `N / factor` taps; output
/// phase `p` of each input sample uses taps `p, p + factor, p + 2*factor, ...`
/// against the low-rate history, skipping the multiplications by stuffed
/// zeros.
#[derive(Debug, Clone)]
pub struct PolyphaseInterpolator {
    phases: Vec<Vec<f64>>,
    history: Vec<f64>,
    pos: usize,
    factor: usize,
    input_rate: u32,
}

impl PolyphaseInterpolator {
    /// # Errors
    /// Returns `DspError::InvalidSpec` unless the tap count is a multiple of
    /// `factor`.
    pub fn new(taps: &FirCoefficients, factor: usize, input_rate: u32) -> Result<Self> {
        check_interpolation(factor, taps)?;
        if !taps.len().is_multiple_of(factor) {
            return Err(DspError::InvalidSpec(format!(
                "polyphase interpolation needs a tap count that is a multiple of {}, got {}",
                factor,
                taps.len()
            )));
        }
        let scaled = taps.scaled(factor as f64);
        let phases: Vec<Vec<f64>> = (0..factor)
            .map(|p| scaled.taps().iter().skip(p).step_by(factor).copied().collect())
            .collect();
        let sub_len = taps.len() / factor;
        Ok(Self {
            phases,
            history: vec![0.0; sub_len],
            pos: 0,
            factor,
            input_rate,
        })
    }

    /// Taps per sub-filter
    pub fn sub_filter_len(&self) -> usize {
        self.history.len()
    }
}

impl Interpolator for PolyphaseInterpolator {
    fn interpolate(&mut self, input: &[f32]) -> Vec<f32> {
        let len = self.history.len();
        let mut output = Vec::with_capacity(input.len() * self.factor);
        for &sample in input {
            self.pos = if self.pos == 0 { len - 1 } else { self.pos - 1 };
            self.history[self.pos] = sample as f64;

            for phase in &self.phases {
                // history[pos] is the newest sample, walking forward goes back in time
                let mut acc = 0.0f64;
                for (k, tap) in phase.iter().enumerate() {
                    let idx = (self.pos + k) % len;
                    acc += tap * self.history[idx];
                }
                output.push(acc as f32);
            }
        }
        output
    }

    fn factor(&self) -> usize {
        self.factor
    }

    fn input_rate(&self) -> u32 {
        self.input_rate
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }
}
