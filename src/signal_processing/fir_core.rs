use crate::signal_processing::Filter;

/// Streaming FIR convolution shared by every FIR stage
///
/// Holds the delay line, tap coefficients, and convolution logic. Taps are
/// applied newest-sample-first: `taps[0]` multiplies the latest input. The
/// decimators split `push` from `output` so the convolution only runs for
/// samples that are kept.
#[derive(Debug, Clone)]
pub struct FirFilterCore {
    taps: Vec<f64>,
    delay_line: Vec<f64>,
    pos: usize,
}

impl FirFilterCore {
    /// Create a new FIR filter core with the given tap coefficients
    pub fn new(taps: Vec<f64>) -> Self {
        Self {
            delay_line: vec![0.0; taps.len().max(1)],
            taps,
            pos: 0,
        }
    }

    /// Write a sample into the delay line without computing an output
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.pos += 1;
        if self.pos == self.delay_line.len() {
            self.pos = 0;
        }
        self.delay_line[self.pos] = sample as f64;
    }

    /// Convolution of the taps with the current delay line contents
    pub fn output(&self) -> f64 {
        let n = self.taps.len();
        let mut output = 0.0f64;

        // Iterate the ring buffer in two contiguous reverse ranges to avoid
        // modulo arithmetic in the inner convolution loop.
        let mut tap_i = 0usize;
        for delay_idx in (0..=self.pos).rev() {
            if tap_i == n {
                break;
            }
            output += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        for delay_idx in ((self.pos + 1)..self.delay_line.len()).rev() {
            if tap_i == n {
                break;
            }
            output += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        output
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, sample: f32) -> f32 {
        self.push(sample);
        self.output() as f32
    }

    /// Process an entire buffer of samples in-place
    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.delay_line.fill(0.0);
        self.pos = 0;
    }

    /// Get the number of taps (filter length)
    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    /// Group delay in samples for a linear-phase filter
    pub fn group_delay_samples(&self) -> f64 {
        (self.taps.len().saturating_sub(1)) as f64 / 2.0
    }

    /// Get access to the tap coefficients
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }
}

impl Filter for FirFilterCore {
    fn process(&mut self, sample: f32) -> f32 {
        FirFilterCore::process(self, sample)
    }

    fn process_buffer(&mut self, buffer: &mut [f32]) {
        FirFilterCore::process_buffer(self, buffer)
    }

    fn reset(&mut self) {
        FirFilterCore::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_response_is_taps() {
        let taps = vec![0.1, 0.2, 0.3, 0.4];
        let mut core = FirFilterCore::new(taps.clone());
        let mut buffer = vec![0.0f32; 6];
        buffer[0] = 1.0;
        core.process_buffer(&mut buffer);
        for (i, tap) in taps.iter().enumerate() {
            assert!((buffer[i] as f64 - tap).abs() < 1e-7);
        }
        assert_eq!(buffer[4], 0.0);
        assert_eq!(buffer[5], 0.0);
    }

    #[test]
    fn test_push_then_output_matches_process() {
        let taps = vec![0.5, -0.25, 0.125];
        let mut a = FirFilterCore::new(taps.clone());
        let mut b = FirFilterCore::new(taps);
        for i in 0..20 {
            let x = (i as f32 * 0.3).cos();
            let y = a.process(x);
            b.push(x);
            assert!((y as f64 - b.output()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_group_delay() {
        assert_eq!(FirFilterCore::new(vec![0.0; 127]).group_delay_samples(), 63.0);
        assert_eq!(FirFilterCore::new(vec![0.0; 124]).group_delay_samples(), 61.5);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut core = FirFilterCore::new(vec![1.0, 1.0]);
        core.process(3.0);
        core.reset();
        assert_eq!(core.process(1.0), 1.0);
    }
}
