use serde_json::json;

use super::{Formatter, iso8601_timestamp};
use crate::sweep::SweepFrame;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, frame: &SweepFrame) -> String {
        let (peak_hz, peak_db) = frame.peak();
        json!({
            "ts": iso8601_timestamp(),
            "start_hz": frame.start_hz(),
            "step_hz": frame.step_hz(),
            "peak_hz": peak_hz,
            "peak_db": peak_db,
            "frequencies_hz": frame.frequencies(),
            "magnitudes_db": frame.magnitudes_db(),
        })
        .to_string()
    }
}
