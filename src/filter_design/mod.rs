//! Filter synthesis: specs in, coefficient sets out.

pub mod equiripple;
pub mod half_band;
pub mod iir;
pub mod response;
pub mod spec;

use serde::{Deserialize, Serialize};

use crate::signal_processing::BiquadCoefficients;

pub use equiripple::design_equiripple;
pub use half_band::design_half_band;
pub use iir::{design_iir, design_notch, design_wideband_notch};
pub use response::{biquad_response, cascade_response, fir_response, magnitude_db};
pub use spec::{
    Band, EquirippleSpec, FilterKind, FilterSpec, HalfBandSpec, IirOrder, IirSpec, NotchSpec,
};

/// FIR taps in convolution order (`taps[0]` multiplies the newest sample)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirCoefficients {
    taps: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    deviation: Option<f64>,
}

impl FirCoefficients {
    pub fn new(taps: Vec<f64>) -> Self {
        Self {
            taps,
            deviation: None,
        }
    }

    /// Taps from an equiripple design with its achieved deviation
    pub fn with_deviation(taps: Vec<f64>, deviation: f64) -> Self {
        Self {
            taps,
            deviation: Some(deviation),
        }
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn into_taps(self) -> Vec<f64> {
        self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Worst-case weighted deviation reported by the equiripple solver
    pub fn deviation(&self) -> Option<f64> {
        self.deviation
    }

    /// Time-reversed taps, for runtimes that walk the history oldest-first
    pub fn reversed(&self) -> Self {
        let mut taps = self.taps.clone();
        taps.reverse();
        Self {
            taps,
            deviation: self.deviation,
        }
    }

    /// True when the taps mirror about the center within `tolerance`
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.taps
            .iter()
            .zip(self.taps.iter().rev())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Sum of the taps, the DC gain
    pub fn dc_gain(&self) -> f64 {
        self.taps.iter().sum()
    }

    /// Multiply every tap by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            taps: self.taps.iter().map(|t| t * factor).collect(),
            deviation: self.deviation,
        }
    }
}

/// Output of synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterDesign {
    /// Biquad sections in cascade order
    Iir(Vec<BiquadCoefficients>),
    Fir(FirCoefficients),
}
