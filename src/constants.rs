//! Numeric constants for filter design and the repeater audio rates
//!
//! Sample rates are fixed by the controller hardware: the ADC/DAC run at the
//! main-channel rate and all control-channel work happens at a quarter of it.

/// Main-channel (ADC/DAC) sample rate in Hz.
pub const MAIN_RATE_HZ: u32 = 32_000;

/// Intermediate rate between the two half-band decimation stages.
pub const INTERMEDIATE_RATE_HZ: u32 = 16_000;

/// Control-channel sample rate in Hz (CTCSS decode, cross audio).
pub const CONTROL_RATE_HZ: u32 = 8_000;

/// Ratio between the main and control channel rates.
pub const RATE_FACTOR: usize = (MAIN_RATE_HZ / CONTROL_RATE_HZ) as usize;

/// Largest equiripple filter the controller runs in real time.
pub const MAX_EQUIRIPPLE_TAPS: usize = 127;

/// Smallest usable FIR length.
pub const MIN_FIR_TAPS: usize = 3;

/// Largest acceptable equiripple deviation (linear, per unit weight).
/// Anything worse means the transition bands were too narrow for the tap
/// count and the solver result is not a usable filter.
pub const MAX_EQUIRIPPLE_DEVIATION: f64 = 0.25;

/// Half-band taps smaller than this are rounding noise and become exactly 0.
pub const HALF_BAND_SNAP_THRESHOLD: f64 = 1e-16;

/// Even-offset half-band taps below this are forced to exactly 0.
pub const HALF_BAND_ZERO_TOLERANCE: f64 = 1e-9;

/// Floor used when converting non-positive magnitudes to dB.
pub const DB_FLOOR: f32 = -60.0;

/// Minimum RMS treated as signal when forming ratios.
pub const MIN_RMS_THRESHOLD: f32 = 1e-9;
