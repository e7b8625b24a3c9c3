use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::signal_processing::Filter;

/// Second-order section coefficients, normalized so that a0 = 1
///
/// This is the IIR interchange format: five reals per section, in the order
/// (b0, b1, b2, a1, a2). First-order sections have b2 = a2 = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    pub fn first_order(b0: f64, b1: f64, a1: f64) -> Self {
        Self::new(b0, b1, 0.0, a1, 0.0)
    }

    /// Roots of z^2 + a1*z + a2
    pub fn poles(&self) -> [Complex64; 2] {
        let disc = Complex64::new(self.a1 * self.a1 - 4.0 * self.a2, 0.0).sqrt();
        let minus_a1 = Complex64::new(-self.a1, 0.0);
        [(minus_a1 + disc) / 2.0, (minus_a1 - disc) / 2.0]
    }

    /// True when both poles lie strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.norm() < 1.0)
    }

    /// Coefficients as (b0, b1, b2, a1, a2)
    pub fn as_array(&self) -> [f64; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }
}

/// One biquad with its direct form I state
///
/// State belongs to a single streaming session. Splitting a buffer into
/// chunks gives exactly the same output as processing it in one call.
#[derive(Debug, Clone)]
pub struct BiquadSection {
    coeffs: BiquadCoefficients,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadSection {
    pub fn new(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.process_f64(sample as f64) as f32
    }

    #[inline]
    fn process_f64(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear the delay registers, keeping the coefficients
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coeffs
    }
}

impl Filter for BiquadSection {
    fn process(&mut self, sample: f32) -> f32 {
        BiquadSection::process(self, sample)
    }

    fn reset(&mut self) {
        BiquadSection::reset(self)
    }
}

/// Ordered chain of biquads; each section feeds the next
#[derive(Debug, Clone)]
pub struct BiquadCascade {
    sections: Vec<BiquadSection>,
}

impl BiquadCascade {
    pub fn new(coeffs: &[BiquadCoefficients]) -> Self {
        Self {
            sections: coeffs.iter().copied().map(BiquadSection::new).collect(),
        }
    }

    pub fn process(&mut self, sample: f32) -> f32 {
        let mut x = sample as f64;
        for section in self.sections.iter_mut() {
            x = section.process_f64(x);
        }
        x as f32
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.sections.iter_mut().for_each(BiquadSection::reset);
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn coefficients(&self) -> Vec<BiquadCoefficients> {
        self.sections.iter().map(|s| *s.coefficients()).collect()
    }
}

impl Filter for BiquadCascade {
    fn process(&mut self, sample: f32) -> f32 {
        BiquadCascade::process(self, sample)
    }

    fn reset(&mut self) {
        BiquadCascade::reset(self)
    }
}
