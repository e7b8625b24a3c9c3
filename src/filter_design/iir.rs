use std::f64::consts::{PI, SQRT_2};

use crate::error::{DspError, Result};
use crate::signal_processing::BiquadCoefficients;

use super::spec::{FilterKind, IirOrder, IirSpec, NotchSpec};

/// Design a bilinear-transform low-pass or high-pass section
///
/// The analog cutoff is pre-warped with `tan(PI * fc / fs)` so the digital
/// -3 dB point lands exactly on the requested cutoff. Second order sections
/// are Butterworth (Q = 1/sqrt(2)).
///
/// # Errors
/// Returns `DspError::InvalidSpec` if the resulting poles are not strictly
/// inside the unit circle.
pub fn design_iir(spec: &IirSpec) -> Result<BiquadCoefficients> {
    let wc = (PI * spec.cutoff_hz() / spec.sample_rate()).tan();

    let coeffs = match (spec.order(), spec.kind()) {
        (IirOrder::First, FilterKind::HighPass) => {
            let b0 = 1.0 / (1.0 + wc);
            BiquadCoefficients::first_order(b0, -b0, -b0 * (1.0 - wc))
        }
        (IirOrder::First, _) => {
            let b0 = wc / (1.0 + wc);
            BiquadCoefficients::first_order(b0, b0, (wc - 1.0) / (wc + 1.0))
        }
        (IirOrder::Second, kind) => {
            let k2 = wc * wc;
            let norm = 1.0 / (1.0 + SQRT_2 * wc + k2);
            let a1 = 2.0 * (k2 - 1.0) * norm;
            let a2 = (1.0 - SQRT_2 * wc + k2) * norm;
            if kind == FilterKind::HighPass {
                BiquadCoefficients::new(norm, -2.0 * norm, norm, a1, a2)
            } else {
                let b0 = k2 * norm;
                BiquadCoefficients::new(b0, 2.0 * b0, b0, a1, a2)
            }
        }
    };

    check_stable(&coeffs)?;
    log::debug!(
        "{:?} {:?} order IIR at {} Hz (fs {}): {:?}",
        spec.kind(),
        spec.order(),
        spec.cutoff_hz(),
        spec.sample_rate(),
        coeffs.as_array()
    );
    Ok(coeffs)
}

/// Design a second-order notch from center frequency and -3 dB bandwidth
///
/// Coefficients are `g * [1, -2 cos w0, 1]` over `[1, -2 g cos w0, 2g - 1]`
/// with `g = 1 / (1 + tan(PI * bw / fs))`. The -3 dB band edges are
/// separated by exactly `bw` in the digital domain; they sit slightly above
/// `f0 -/+ bw/2` because the warped center is the arithmetic mean of the
/// edges.
pub fn design_notch(spec: &NotchSpec) -> Result<BiquadCoefficients> {
    let w0 = 2.0 * PI * spec.center_hz() / spec.sample_rate();
    let bw = 2.0 * PI * spec.bandwidth_hz() / spec.sample_rate();
    let beta = (bw / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    let coeffs = BiquadCoefficients::new(
        gain,
        -2.0 * gain * cos_w0,
        gain,
        -2.0 * gain * cos_w0,
        2.0 * gain - 1.0,
    );

    check_stable(&coeffs)?;
    log::debug!(
        "Notch at {} Hz, Q {:.3} (fs {}): {:?}",
        spec.center_hz(),
        spec.q(),
        spec.sample_rate(),
        coeffs.as_array()
    );
    Ok(coeffs)
}

/// Two-section notch cascade for wider sub-audible coverage
///
/// The first section is the notch designed at the operating rate; the second
/// is the same notch designed at twice the rate, which run at the operating
/// rate sits at half the frequency with half the bandwidth. Together they
/// deepen and widen the rejection below the nominal center.
pub fn design_wideband_notch(spec: &NotchSpec) -> Result<Vec<BiquadCoefficients>> {
    let primary = design_notch(spec)?;
    let secondary = design_notch(&spec.at_sample_rate(spec.sample_rate() * 2.0)?)?;
    Ok(vec![primary, secondary])
}

fn check_stable(coeffs: &BiquadCoefficients) -> Result<()> {
    if !coeffs.is_stable() {
        return Err(DspError::InvalidSpec(format!(
            "design produced poles on or outside the unit circle: {:?}",
            coeffs.poles()
        )));
    }
    Ok(())
}
