pub mod biquad;
pub mod buffer;
pub mod filter;
pub mod fir_core;
pub mod goertzel;
pub mod math;
pub mod multirate;
pub mod tone;

pub use biquad::{BiquadCascade, BiquadCoefficients, BiquadSection};
pub use buffer::SampleBuffer;
pub use filter::Filter;
pub use fir_core::FirFilterCore;
pub use goertzel::{BlockGoertzel, Goertzel, GoertzelResult, goertzel};
pub use math::{db_to_linear, linear_to_db, ratio_db, rms};
pub use multirate::{
    DecimationChain, Decimator, DirectInterpolator, Interpolator, PolyphaseInterpolator,
};
pub use tone::ToneGenerator;
