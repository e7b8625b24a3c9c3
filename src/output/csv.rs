use super::{Formatter, iso8601_timestamp};
use crate::sweep::SweepFrame;

/// One row per sweep point, all rows of a frame share a timestamp
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, frame: &SweepFrame) -> String {
        let ts = iso8601_timestamp();
        frame
            .series()
            .iter()
            .map(|(freq, db)| format!("{},{:.1},{:.2}", ts, freq, db))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,frequency_hz,magnitude_db")
    }
}
