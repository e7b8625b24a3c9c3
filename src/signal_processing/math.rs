use crate::constants::{DB_FLOOR, MIN_RMS_THRESHOLD};

/// Root-mean-square level of a buffer (0 for an empty buffer)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let power: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>();
    (power / samples.len() as f64).sqrt() as f32
}

/// Convert a linear amplitude to dB
///
/// Non-positive values have no logarithm; they map to `DB_FLOOR` instead of
/// producing -inf or NaN. The result never drops below the floor.
pub fn linear_to_db(value: f32) -> f32 {
    if value > 0.0 {
        (20.0 * value.log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    }
}

/// Convert dB to a linear amplitude
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Amplitude ratio in dB, floored when the denominator is effectively silent
pub fn ratio_db(numerator: f32, denominator: f32) -> f32 {
    if denominator < MIN_RMS_THRESHOLD {
        return DB_FLOOR;
    }
    linear_to_db(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rms_of_sine() {
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 8000.0).sin())
            .collect();
        assert_abs_diff_eq!(rms(&samples), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_linear_to_db() {
        assert_abs_diff_eq!(linear_to_db(1.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(linear_to_db(2.0), 6.0206, epsilon = 1e-3);
        assert_abs_diff_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-4);
        assert_eq!(linear_to_db(0.0), DB_FLOOR);
        assert_eq!(linear_to_db(-3.0), DB_FLOOR);
        assert_eq!(linear_to_db(1e-9), DB_FLOOR);
    }

    #[test]
    fn test_db_round_trip_level() {
        assert_abs_diff_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(db_to_linear(0.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ratio_db_silent_denominator() {
        assert_eq!(ratio_db(1.0, 0.0), DB_FLOOR);
        assert_abs_diff_eq!(ratio_db(1.0, 0.5), 6.0206, epsilon = 1e-3);
    }
}
