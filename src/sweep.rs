//! Frequency-sweep records reported by the analyzer firmware.
//!
//! One record is a single text line:
//!
//! ```text
//! SWEEP <start_hz> <step_hz> <mag_1> <mag_2> ... <mag_k>
//! ```
//!
//! Magnitudes are linear. Each parsed [`SweepFrame`] is independent, so a
//! malformed line never affects the records after it.

use serde::Serialize;

use crate::error::{DspError, Result};
use crate::constants::DB_FLOOR;

/// Prefix that marks a sweep record
pub const SWEEP_PREFIX: &str = "SWEEP ";

/// One sweep: a linear frequency axis and the magnitude at each point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFrame {
    start_hz: f64,
    step_hz: f64,
    magnitudes: Vec<f64>,
}

impl SweepFrame {
    /// # Errors
    /// Returns `DspError::InvalidInput` if `step_hz` is not positive, no
    /// magnitudes are given, or any value is not finite.
    pub fn new(start_hz: f64, step_hz: f64, magnitudes: Vec<f64>) -> Result<Self> {
        if !start_hz.is_finite() {
            return Err(DspError::InvalidInput(format!(
                "sweep start {} Hz is not finite",
                start_hz
            )));
        }
        if !(step_hz.is_finite() && step_hz > 0.0) {
            return Err(DspError::InvalidInput(format!(
                "sweep step must be positive, got {} Hz",
                step_hz
            )));
        }
        if magnitudes.is_empty() {
            return Err(DspError::InvalidInput(
                "sweep record has no magnitude samples".to_string(),
            ));
        }
        if let Some(i) = magnitudes.iter().position(|m| !m.is_finite()) {
            return Err(DspError::InvalidInput(format!(
                "magnitude {} is not finite: {}",
                i, magnitudes[i]
            )));
        }
        Ok(Self {
            start_hz,
            step_hz,
            magnitudes,
        })
    }

    /// Parse one line of analyzer output
    ///
    /// Returns `Ok(None)` for lines that are not sweep records (status
    /// output, `THDSWEEP` lines, blank lines). Trailing whitespace is
    /// ignored.
    ///
    /// # Errors
    /// Returns `DspError::InvalidInput` for a sweep record with missing,
    /// non-numeric or non-finite tokens.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(body) = line.strip_prefix(SWEEP_PREFIX) else {
            return Ok(None);
        };

        let mut tokens = body.split_whitespace();
        let start_hz = parse_token(tokens.next(), "start frequency")?;
        let step_hz = parse_token(tokens.next(), "step frequency")?;
        let magnitudes = tokens
            .enumerate()
            .map(|(i, token)| {
                match token.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(DspError::InvalidInput(format!(
                        "magnitude {}: '{}' is not a finite number",
                        i, token
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(start_hz, step_hz, magnitudes).map(Some)
    }

    pub fn start_hz(&self) -> f64 {
        self.start_hz
    }

    pub fn step_hz(&self) -> f64 {
        self.step_hz
    }

    /// Linear magnitudes as received
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// `start + i * step` for every sample
    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.magnitudes.len())
            .map(|i| self.start_hz + i as f64 * self.step_hz)
            .collect()
    }

    /// `20 * log10(m)`, with non-positive magnitudes reported as -60 dB
    ///
    /// Positive magnitudes are never clamped, so a notch floor below -60 dB
    /// reads at its true depth.
    pub fn magnitudes_db(&self) -> Vec<f32> {
        self.magnitudes
            .iter()
            .map(|&m| {
                if m > 0.0 {
                    (20.0 * m.log10()) as f32
                } else {
                    DB_FLOOR
                }
            })
            .collect()
    }

    /// (frequency, dB) pairs
    pub fn series(&self) -> Vec<(f64, f32)> {
        self.frequencies()
            .into_iter()
            .zip(self.magnitudes_db())
            .collect()
    }

    /// Frequency and level of the strongest point
    pub fn peak(&self) -> (f64, f32) {
        self.series()
            .into_iter()
            .fold((self.start_hz, f32::NEG_INFINITY), |best, point| {
                if point.1 > best.1 { point } else { best }
            })
    }
}

fn parse_token(token: Option<&str>, what: &str) -> Result<f64> {
    let token = token.ok_or_else(|| DspError::InvalidInput(format!("sweep record is missing the {}", what)))?;
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DspError::InvalidInput(format!(
            "{} '{}' is not a finite number",
            what, token
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_parse_reference_record() {
        let frame = SweepFrame::parse_line("SWEEP 100 50 1 2 4 8").unwrap().unwrap();
        assert_eq!(frame.frequencies(), vec![100.0, 150.0, 200.0, 250.0]);
        let db = frame.magnitudes_db();
        for (actual, expected) in db.iter().zip([0.0, 6.02, 12.04, 18.06]) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 0.1);
        }
        assert_eq!(frame.peak().0, 250.0);
    }

    #[test]
    fn test_trailing_space_from_firmware() {
        let frame = SweepFrame::parse_line("SWEEP 31.250000 31.250000 0.500 1.000 \r\n")
            .unwrap()
            .unwrap();
        assert_eq!(frame.len(), 2);
        assert_abs_diff_eq!(frame.frequencies()[1], 62.5, epsilon = 1e-12);
    }

    #[test]
    fn test_other_lines_are_ignored() {
        assert_eq!(SweepFrame::parse_line("RMS        0.12 Vrms").unwrap(), None);
        assert_eq!(SweepFrame::parse_line("THDSWEEP 100 50 1 2").unwrap(), None);
        assert_eq!(SweepFrame::parse_line("").unwrap(), None);
        assert_eq!(SweepFrame::parse_line("SWEEP").unwrap(), None);
    }

    #[test]
    fn test_malformed_records() {
        for line in [
            "SWEEP ",
            "SWEEP 100",
            "SWEEP 100 50",
            "SWEEP 100 0 1 2",
            "SWEEP 100 -5 1 2",
            "SWEEP abc 50 1",
            "SWEEP 100 50 1 x 3",
            "SWEEP 100 50 1 NaN 3",
            "SWEEP 100 50 inf 2",
            "SWEEP 100 50 1 -inf",
            "SWEEP inf 50 1 2",
            "SWEEP 100 NaN 1 2",
        ] {
            let err = SweepFrame::parse_line(line).unwrap_err();
            assert!(matches!(err, DspError::InvalidInput(_)), "{}: {:?}", line, err);
        }
    }

    #[test]
    fn test_non_positive_magnitudes_floor() {
        let frame = SweepFrame::new(0.0, 10.0, vec![0.0, -1.0, 1e-9]).unwrap();
        let db = frame.magnitudes_db();
        assert_eq!(db[..2], [-60.0, -60.0]);
        assert_abs_diff_eq!(db[2], -180.0, epsilon = 1e-3);
    }

    #[test]
    fn test_deep_notch_is_not_clamped() {
        let frame = SweepFrame::parse_line("SWEEP 100 50 0.0001 0.00001 1").unwrap().unwrap();
        let db = frame.magnitudes_db();
        for (actual, expected) in db.iter().zip([-80.0, -100.0, 0.0]) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-3);
        }
        assert_eq!(frame.peak(), (200.0, 0.0));
    }

    #[test]
    fn test_non_finite_magnitude_rejected_by_constructor() {
        let err = SweepFrame::new(0.0, 10.0, vec![1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, DspError::InvalidInput(_)));
    }
}
