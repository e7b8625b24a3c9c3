use std::f64::consts::PI;

use crate::constants::{HALF_BAND_SNAP_THRESHOLD, HALF_BAND_ZERO_TOLERANCE};

use super::FirCoefficients;
use super::spec::HalfBandSpec;

/// Closed-form half-band low-pass for factor-of-two rate changes
///
/// The ideal response is a rectangle covering half the band (K = N/2 ones),
/// whose inverse transform is `sin(PI*n*K/N) / (N * sin(PI*n/N))`. It is
/// shaped with a Hamming window. Taps at even offsets from the center are
/// zero by construction; rounding residue there is removed so the zero
/// pattern is exact.
pub fn design_half_band(spec: &HalfBandSpec) -> FirCoefficients {
    let n_taps = spec.num_taps();
    let n = n_taps as f64;
    let k = n / 2.0;
    let half = (n_taps / 2) as i64;

    let taps: Vec<f64> = (-half..=half)
        .map(|offset| {
            let m = offset as f64;
            let ideal = if offset == 0 {
                k / n
            } else {
                (PI * m * k / n).sin() / (n * (PI * m / n).sin())
            };
            let window = 0.54 + 0.46 * (2.0 * PI * m / n).cos();
            let tap = ideal * window;

            if tap.abs() < HALF_BAND_SNAP_THRESHOLD
                || (offset != 0 && offset % 2 == 0 && tap.abs() < HALF_BAND_ZERO_TOLERANCE)
            {
                0.0
            } else {
                tap
            }
        })
        .collect();

    log::debug!(
        "Half-band: {} taps at {} Hz, {} non-zero",
        n_taps,
        spec.sample_rate(),
        taps.iter().filter(|t| **t != 0.0).count()
    );

    FirCoefficients::new(taps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_design::response::{fir_response, magnitude_db};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_matches_deployed_41_tap_filter() {
        let taps = design_half_band(&HalfBandSpec::new(32000.0, 41).unwrap());
        let t = taps.taps();
        assert_eq!(t.len(), 41);
        assert_abs_diff_eq!(t[20], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(t[19], 0.3169038896556724, epsilon = 1e-9);
        assert_abs_diff_eq!(t[17], -0.10193071949733788, epsilon = 1e-9);
        assert_abs_diff_eq!(t[1], -0.0022612636393077577, epsilon = 1e-9);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[40], 0.0);
    }

    #[test]
    fn test_even_offsets_are_exactly_zero() {
        for n in [5, 9, 13, 21, 41, 61, 101] {
            let taps = design_half_band(&HalfBandSpec::new(32000.0, n).unwrap());
            let center = n / 2;
            for (i, &tap) in taps.taps().iter().enumerate() {
                let offset = i.abs_diff(center);
                if offset != 0 && offset % 2 == 0 {
                    assert_eq!(tap, 0.0, "N={} offset {} tap {}", n, offset, tap);
                } else {
                    assert_ne!(tap, 0.0, "N={} offset {} should be non-zero", n, offset);
                }
            }
            assert!(taps.is_symmetric(1e-15));
        }
    }

    #[test]
    fn test_half_band_response() {
        let taps = design_half_band(&HalfBandSpec::new(32000.0, 41).unwrap());
        // Unity at DC, -6 dB at fs/4, strong rejection near Nyquist
        assert_abs_diff_eq!(fir_response(taps.taps(), 0.0, 32000.0).norm(), 1.0, epsilon = 5e-3);
        assert_abs_diff_eq!(
            fir_response(taps.taps(), 8000.0, 32000.0).norm(),
            0.5,
            epsilon = 1e-9
        );
        assert!(magnitude_db(fir_response(taps.taps(), 1000.0, 32000.0)).abs() < 0.1);
        assert!(magnitude_db(fir_response(taps.taps(), 12000.0, 32000.0)) < -40.0);
    }
}
