//! Frequency response evaluation for synthesized filters.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::signal_processing::BiquadCoefficients;

/// Smallest magnitude reported by `magnitude_db` (-240 dB)
const MIN_MAGNITUDE: f64 = 1e-12;

fn unit_delay(freq_hz: f64, sample_rate: f64) -> Complex64 {
    Complex64::from_polar(1.0, -2.0 * PI * freq_hz / sample_rate)
}

/// H(e^jw) of an FIR filter at `freq_hz`
pub fn fir_response(taps: &[f64], freq_hz: f64, sample_rate: f64) -> Complex64 {
    let z_inv = unit_delay(freq_hz, sample_rate);
    let mut power = Complex64::new(1.0, 0.0);
    let mut sum = Complex64::new(0.0, 0.0);
    for &tap in taps {
        sum += power * tap;
        power *= z_inv;
    }
    sum
}

/// H(e^jw) of one biquad at `freq_hz`
pub fn biquad_response(coeffs: &BiquadCoefficients, freq_hz: f64, sample_rate: f64) -> Complex64 {
    let z1 = unit_delay(freq_hz, sample_rate);
    let z2 = z1 * z1;
    let num = z1 * coeffs.b1 + z2 * coeffs.b2 + coeffs.b0;
    let den = z1 * coeffs.a1 + z2 * coeffs.a2 + 1.0;
    num / den
}

/// Product of the section responses of a cascade
pub fn cascade_response(sections: &[BiquadCoefficients], freq_hz: f64, sample_rate: f64) -> Complex64 {
    sections
        .iter()
        .map(|s| biquad_response(s, freq_hz, sample_rate))
        .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
}

/// Response magnitude in dB, clamped at -240 dB for exact zeros
pub fn magnitude_db(response: Complex64) -> f64 {
    20.0 * response.norm().max(MIN_MAGNITUDE).log10()
}

/// Magnitude in dB at evenly spaced frequencies from 0 to Nyquist
pub fn fir_magnitude_db_grid(taps: &[f64], sample_rate: f64, points: usize) -> Vec<(f64, f64)> {
    let points = points.max(2);
    (0..points)
        .map(|i| {
            let f = sample_rate / 2.0 * i as f64 / (points - 1) as f64;
            (f, magnitude_db(fir_response(taps, f, sample_rate)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fir_response_of_moving_average() {
        let taps = [0.5, 0.5];
        assert_abs_diff_eq!(fir_response(&taps, 0.0, 8000.0).norm(), 1.0, epsilon = 1e-12);
        assert!(fir_response(&taps, 4000.0, 8000.0).norm() < 1e-12);
        // |cos(w/2)| at fs/4
        assert_abs_diff_eq!(
            fir_response(&taps, 2000.0, 8000.0).norm(),
            (PI / 4.0).cos(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_biquad_response_matches_fir_for_zero_feedback() {
        let coeffs = BiquadCoefficients::new(0.25, 0.5, 0.25, 0.0, 0.0);
        for f in [0.0, 500.0, 1234.0, 3900.0] {
            let a = biquad_response(&coeffs, f, 8000.0);
            let b = fir_response(&[0.25, 0.5, 0.25], f, 8000.0);
            assert_abs_diff_eq!((a - b).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cascade_is_product() {
        let a = BiquadCoefficients::first_order(0.5, 0.5, 0.0);
        let h = cascade_response(&[a, a], 2000.0, 8000.0);
        let single = biquad_response(&a, 2000.0, 8000.0);
        assert_abs_diff_eq!((h - single * single).norm(), 0.0, epsilon = 1e-12);
        assert_eq!(cascade_response(&[], 100.0, 8000.0), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_magnitude_db_clamps_zero() {
        assert_abs_diff_eq!(magnitude_db(Complex64::new(0.0, 0.0)), -240.0, epsilon = 1e-9);
        assert_abs_diff_eq!(magnitude_db(Complex64::new(0.0, 1.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_spans_nyquist() {
        let grid = fir_magnitude_db_grid(&[1.0], 8000.0, 5);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0].0, 0.0);
        assert_eq!(grid[4].0, 4000.0);
        assert!(grid.iter().all(|&(_, db)| db.abs() < 1e-9));
    }
}
