//! Validated filter specifications.
//!
//! Every spec is checked when it is built, so a value of any of these types is
//! always a legal input to synthesis. Fields are private for that reason.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_EQUIRIPPLE_TAPS, MIN_FIR_TAPS};
use crate::error::{DspError, Result};
use crate::signal_processing::BiquadCoefficients;

use super::{FilterDesign, FirCoefficients, equiripple, half_band, iir};

/// Filter response family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    LowPass,
    HighPass,
    Notch,
    BandPass,
    HalfBand,
}

/// IIR section order. Only first and second order sections are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IirOrder {
    First,
    Second,
}

impl TryFrom<u32> for IirOrder {
    type Error = DspError;

    fn try_from(order: u32) -> Result<Self> {
        match order {
            1 => Ok(IirOrder::First),
            2 => Ok(IirOrder::Second),
            other => Err(DspError::InvalidSpec(format!(
                "IIR order must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

fn check_sample_rate(sample_rate: f64) -> Result<()> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(DspError::InvalidSpec(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    Ok(())
}

fn check_sub_nyquist(name: &str, hz: f64, sample_rate: f64) -> Result<()> {
    let nyquist = sample_rate / 2.0;
    if !(hz.is_finite() && hz > 0.0 && hz < nyquist) {
        return Err(DspError::InvalidSpec(format!(
            "{} must be between 0 and Nyquist ({} Hz), got {} Hz",
            name, nyquist, hz
        )));
    }
    Ok(())
}

/// Bilinear-transform low-pass or high-pass section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IirSpec {
    kind: FilterKind,
    sample_rate: f64,
    cutoff_hz: f64,
    order: IirOrder,
}

impl IirSpec {
    pub fn low_pass(sample_rate: f64, cutoff_hz: f64, order: u32) -> Result<Self> {
        Self::new(FilterKind::LowPass, sample_rate, cutoff_hz, order)
    }

    pub fn high_pass(sample_rate: f64, cutoff_hz: f64, order: u32) -> Result<Self> {
        Self::new(FilterKind::HighPass, sample_rate, cutoff_hz, order)
    }

    fn new(kind: FilterKind, sample_rate: f64, cutoff_hz: f64, order: u32) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        check_sub_nyquist("cutoff", cutoff_hz, sample_rate)?;
        let order = IirOrder::try_from(order)?;
        Ok(Self {
            kind,
            sample_rate,
            cutoff_hz,
            order,
        })
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn order(&self) -> IirOrder {
        self.order
    }
}

/// Second-order notch described by center frequency and -3 dB bandwidth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchSpec {
    sample_rate: f64,
    center_hz: f64,
    bandwidth_hz: f64,
}

impl NotchSpec {
    pub fn new(sample_rate: f64, center_hz: f64, bandwidth_hz: f64) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        check_sub_nyquist("notch center", center_hz, sample_rate)?;
        if !(bandwidth_hz.is_finite() && bandwidth_hz > 0.0) {
            return Err(DspError::InvalidSpec(format!(
                "notch bandwidth must be positive (Q > 0), got {} Hz",
                bandwidth_hz
            )));
        }
        if bandwidth_hz >= sample_rate / 2.0 {
            return Err(DspError::InvalidSpec(format!(
                "notch bandwidth {} Hz exceeds Nyquist",
                bandwidth_hz
            )));
        }
        Ok(Self {
            sample_rate,
            center_hz,
            bandwidth_hz,
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.bandwidth_hz
    }

    /// Quality factor, center over -3 dB bandwidth
    pub fn q(&self) -> f64 {
        self.center_hz / self.bandwidth_hz
    }

    /// The same notch re-targeted at another sample rate. Used to build the
    /// wideband cascade, which adds an instance designed at twice the rate.
    pub fn at_sample_rate(&self, sample_rate: f64) -> Result<Self> {
        Self::new(sample_rate, self.center_hz, self.bandwidth_hz)
    }
}

/// One equiripple band. Edges are fractions of the sample rate in [0, 0.5].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    start: f64,
    end: f64,
    gain: f64,
    weight: f64,
}

impl Band {
    pub fn new(start: f64, end: f64, gain: f64, weight: f64) -> Result<Self> {
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || end > 0.5 || start >= end {
            return Err(DspError::InvalidSpec(format!(
                "band edges must satisfy 0 <= start < end <= 0.5, got [{}, {}]",
                start, end
            )));
        }
        if !gain.is_finite() || gain < 0.0 {
            return Err(DspError::InvalidSpec(format!(
                "band gain must be a non-negative number, got {}",
                gain
            )));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(DspError::InvalidSpec(format!(
                "band weight must be positive, got {}",
                weight
            )));
        }
        Ok(Self {
            start,
            end,
            gain,
            weight,
        })
    }

    /// Build a band from edges in Hz at the given sample rate
    pub fn from_hz(sample_rate: f64, start_hz: f64, end_hz: f64, gain: f64) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        Self::new(start_hz / sample_rate, end_hz / sample_rate, gain, 1.0)
    }

    pub fn with_weight(self, weight: f64) -> Result<Self> {
        Self::new(self.start, self.end, self.gain, weight)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Linear-phase FIR designed by the Parks-McClellan exchange
#[derive(Debug, Clone, PartialEq)]
pub struct EquirippleSpec {
    kind: FilterKind,
    sample_rate: f64,
    num_taps: usize,
    bands: Vec<Band>,
}

impl EquirippleSpec {
    /// Create a spec from explicit bands
    ///
    /// # Errors
    /// Returns `DspError::InvalidSpec` when the tap count is out of range, the
    /// band list is not 2 or 3 bands covering [0, 0.5] in increasing order, or
    /// the gains do not describe a low-pass, high-pass or band-pass response.
    pub fn new(sample_rate: f64, num_taps: usize, bands: Vec<Band>) -> Result<Self> {
        check_sample_rate(sample_rate)?;

        if !(MIN_FIR_TAPS..=MAX_EQUIRIPPLE_TAPS).contains(&num_taps) {
            return Err(DspError::InvalidSpec(format!(
                "equiripple tap count must be in {}..={}, got {}",
                MIN_FIR_TAPS, MAX_EQUIRIPPLE_TAPS, num_taps
            )));
        }

        if !(2..=3).contains(&bands.len()) {
            return Err(DspError::InvalidSpec(format!(
                "equiripple design needs 2 or 3 bands, got {}",
                bands.len()
            )));
        }

        let first = bands[0];
        let last = bands[bands.len() - 1];
        if first.start != 0.0 || last.end != 0.5 {
            return Err(DspError::InvalidSpec(format!(
                "bands must span [0, 0.5], got [{}, {}]",
                first.start, last.end
            )));
        }

        for pair in bands.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(DspError::InvalidSpec(format!(
                    "band edges must be strictly increasing: {} then {}",
                    pair[0].end, pair[1].start
                )));
            }
        }

        let kind = classify(&bands)?;

        // A symmetric even-length filter has a forced zero at Nyquist
        if last.gain > 0.0 && num_taps.is_multiple_of(2) {
            return Err(DspError::InvalidSpec(format!(
                "{:?} design with gain at Nyquist needs an odd tap count, got {}",
                kind, num_taps
            )));
        }

        Ok(Self {
            kind,
            sample_rate,
            num_taps,
            bands,
        })
    }

    /// Low-pass: pass [0, pass_edge_hz], stop [stop_edge_hz, fs/2]
    pub fn low_pass(
        sample_rate: f64,
        num_taps: usize,
        pass_edge_hz: f64,
        stop_edge_hz: f64,
    ) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        check_sub_nyquist("pass edge", pass_edge_hz, sample_rate)?;
        check_sub_nyquist("stop edge", stop_edge_hz, sample_rate)?;
        let bands = vec![
            Band::from_hz(sample_rate, 0.0, pass_edge_hz, 1.0)?,
            Band::from_hz(sample_rate, stop_edge_hz, sample_rate / 2.0, 0.0)?,
        ];
        Self::new(sample_rate, num_taps, bands)
    }

    /// High-pass: stop [0, stop_edge_hz], pass [pass_edge_hz, fs/2]
    pub fn high_pass(
        sample_rate: f64,
        num_taps: usize,
        stop_edge_hz: f64,
        pass_edge_hz: f64,
    ) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        check_sub_nyquist("stop edge", stop_edge_hz, sample_rate)?;
        check_sub_nyquist("pass edge", pass_edge_hz, sample_rate)?;
        let bands = vec![
            Band::from_hz(sample_rate, 0.0, stop_edge_hz, 0.0)?,
            Band::from_hz(sample_rate, pass_edge_hz, sample_rate / 2.0, 1.0)?,
        ];
        Self::new(sample_rate, num_taps, bands)
    }

    /// Band-pass: stop [0, stop_low_hz], pass [pass_low_hz, pass_high_hz],
    /// stop [stop_high_hz, fs/2]
    pub fn band_pass(
        sample_rate: f64,
        num_taps: usize,
        stop_low_hz: f64,
        pass_low_hz: f64,
        pass_high_hz: f64,
        stop_high_hz: f64,
    ) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        for (name, hz) in [
            ("lower stop edge", stop_low_hz),
            ("lower pass edge", pass_low_hz),
            ("upper pass edge", pass_high_hz),
            ("upper stop edge", stop_high_hz),
        ] {
            check_sub_nyquist(name, hz, sample_rate)?;
        }
        let bands = vec![
            Band::from_hz(sample_rate, 0.0, stop_low_hz, 0.0)?,
            Band::from_hz(sample_rate, pass_low_hz, pass_high_hz, 1.0)?,
            Band::from_hz(sample_rate, stop_high_hz, sample_rate / 2.0, 0.0)?,
        ];
        Self::new(sample_rate, num_taps, bands)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_taps(&self) -> usize {
        self.num_taps
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }
}

fn classify(bands: &[Band]) -> Result<FilterKind> {
    let gains: Vec<f64> = bands.iter().map(|b| b.gain).collect();
    match gains.as_slice() {
        [a, b] if a > b => Ok(FilterKind::LowPass),
        [a, b] if a < b => Ok(FilterKind::HighPass),
        [a, b, c] if b > a && b > c => Ok(FilterKind::BandPass),
        _ => Err(DspError::InvalidSpec(format!(
            "unsupported band gain layout {:?}",
            gains
        ))),
    }
}

/// Windowed half-band low-pass for factor-of-two rate changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfBandSpec {
    sample_rate: f64,
    num_taps: usize,
}

impl HalfBandSpec {
    /// # Errors
    /// Returns `DspError::InvalidSpec` unless `num_taps` is at least 5 and
    /// congruent to 1 mod 4.
    pub fn new(sample_rate: f64, num_taps: usize) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        if num_taps < 5 || num_taps % 4 != 1 {
            return Err(DspError::InvalidSpec(format!(
                "half-band tap count must be >= 5 and 1 mod 4, got {}",
                num_taps
            )));
        }
        Ok(Self {
            sample_rate,
            num_taps,
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_taps(&self) -> usize {
        self.num_taps
    }

    /// Cutoff of the ideal response, a quarter of the sample rate
    pub fn cutoff_hz(&self) -> f64 {
        self.sample_rate / 4.0
    }
}

/// Any filter the controller knows how to synthesize
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Iir(IirSpec),
    Notch(NotchSpec),
    Equiripple(EquirippleSpec),
    HalfBand(HalfBandSpec),
}

impl FilterSpec {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSpec::Iir(spec) => spec.kind(),
            FilterSpec::Notch(_) => FilterKind::Notch,
            FilterSpec::Equiripple(spec) => spec.kind(),
            FilterSpec::HalfBand(_) => FilterKind::HalfBand,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        match self {
            FilterSpec::Iir(spec) => spec.sample_rate(),
            FilterSpec::Notch(spec) => spec.sample_rate(),
            FilterSpec::Equiripple(spec) => spec.sample_rate(),
            FilterSpec::HalfBand(spec) => spec.sample_rate(),
        }
    }

    /// Run the synthesis that matches this spec
    pub fn design(&self) -> Result<FilterDesign> {
        match self {
            FilterSpec::Iir(spec) => {
                let section: BiquadCoefficients = iir::design_iir(spec)?;
                Ok(FilterDesign::Iir(vec![section]))
            }
            FilterSpec::Notch(spec) => Ok(FilterDesign::Iir(vec![iir::design_notch(spec)?])),
            FilterSpec::Equiripple(spec) => {
                let taps: FirCoefficients = equiripple::design_equiripple(spec)?;
                Ok(FilterDesign::Fir(taps))
            }
            FilterSpec::HalfBand(spec) => Ok(FilterDesign::Fir(half_band::design_half_band(spec))),
        }
    }
}

impl From<IirSpec> for FilterSpec {
    fn from(spec: IirSpec) -> Self {
        FilterSpec::Iir(spec)
    }
}

impl From<NotchSpec> for FilterSpec {
    fn from(spec: NotchSpec) -> Self {
        FilterSpec::Notch(spec)
    }
}

impl From<EquirippleSpec> for FilterSpec {
    fn from(spec: EquirippleSpec) -> Self {
        FilterSpec::Equiripple(spec)
    }
}

impl From<HalfBandSpec> for FilterSpec {
    fn from(spec: HalfBandSpec) -> Self {
        FilterSpec::HalfBand(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iir_cutoff_at_nyquist_rejected() {
        let err = IirSpec::low_pass(8000.0, 4000.0, 1).unwrap_err();
        assert!(matches!(err, DspError::InvalidSpec(_)));
        assert!(IirSpec::high_pass(8000.0, 0.0, 1).is_err());
        assert!(IirSpec::high_pass(8000.0, 300.0, 3).is_err());
    }

    #[test]
    fn test_notch_requires_positive_bandwidth() {
        assert!(NotchSpec::new(8000.0, 123.0, 0.0).is_err());
        assert!(NotchSpec::new(8000.0, 123.0, -5.0).is_err());
        let spec = NotchSpec::new(8000.0, 123.0, 110.0).unwrap();
        assert!((spec.q() - 123.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_equiripple_classification() {
        let hp = EquirippleSpec::high_pass(8000.0, 127, 100.0, 225.0).unwrap();
        assert_eq!(hp.kind(), FilterKind::HighPass);

        let lp = EquirippleSpec::low_pass(32000.0, 124, 3000.0, 3600.0).unwrap();
        assert_eq!(lp.kind(), FilterKind::LowPass);

        let bp = EquirippleSpec::band_pass(8000.0, 101, 20.0, 60.0, 260.0, 400.0).unwrap();
        assert_eq!(bp.kind(), FilterKind::BandPass);
        assert_eq!(FilterSpec::from(bp).kind(), FilterKind::BandPass);
    }

    #[test]
    fn test_equiripple_rejects_bad_layouts() {
        // Overlapping edges
        assert!(EquirippleSpec::high_pass(8000.0, 31, 300.0, 200.0).is_err());
        // Too many taps
        assert!(EquirippleSpec::high_pass(8000.0, 129, 100.0, 225.0).is_err());
        // High-pass with an even tap count
        assert!(EquirippleSpec::high_pass(8000.0, 64, 100.0, 225.0).is_err());
        // Bands that do not reach Nyquist
        let bands = vec![
            Band::new(0.0, 0.1, 1.0, 1.0).unwrap(),
            Band::new(0.2, 0.4, 0.0, 1.0).unwrap(),
        ];
        assert!(EquirippleSpec::new(8000.0, 31, bands).is_err());
        // Flat gains are not a filter
        let bands = vec![
            Band::new(0.0, 0.1, 1.0, 1.0).unwrap(),
            Band::new(0.2, 0.5, 1.0, 1.0).unwrap(),
        ];
        assert!(EquirippleSpec::new(8000.0, 31, bands).is_err());
    }

    #[test]
    fn test_band_validation() {
        assert!(Band::new(0.3, 0.2, 1.0, 1.0).is_err());
        assert!(Band::new(0.0, 0.6, 1.0, 1.0).is_err());
        assert!(Band::new(0.0, 0.2, 1.0, 0.0).is_err());
        let band = Band::from_hz(8000.0, 0.0, 400.0, 1.0).unwrap();
        assert!((band.end() - 0.05).abs() < 1e-12);
        assert_eq!(band.with_weight(4.0).unwrap().weight(), 4.0);
    }

    #[test]
    fn test_half_band_tap_rule() {
        assert!(HalfBandSpec::new(32000.0, 41).is_ok());
        assert!(HalfBandSpec::new(32000.0, 43).is_err());
        assert!(HalfBandSpec::new(32000.0, 40).is_err());
        assert!(HalfBandSpec::new(32000.0, 1).is_err());
        assert_eq!(HalfBandSpec::new(32000.0, 41).unwrap().cutoff_hz(), 8000.0);
    }
}
