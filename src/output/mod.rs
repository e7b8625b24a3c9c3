//! Line formatters for the sweep monitor.

mod csv;
mod json;
mod text;

use chrono::Utc;

use crate::sweep::SweepFrame;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub trait Formatter: Send {
    /// Render one frame; may span several lines
    fn format(&self, frame: &SweepFrame) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> SweepFrame {
        SweepFrame::new(100.0, 50.0, vec![1.0, 2.0, 0.0]).unwrap()
    }

    #[test]
    fn test_text_summary_and_verbose() {
        let summary = create_formatter(OutputFormat::Text, false).format(&frame());
        assert!(summary.contains("3 points"), "{}", summary);
        assert!(summary.contains("150.0 Hz"), "{}", summary);

        let verbose = create_formatter(OutputFormat::Text, true).format(&frame());
        assert_eq!(verbose.lines().count(), 4);
        assert!(verbose.contains("-60.00 dB"), "{}", verbose);
    }

    #[test]
    fn test_csv_rows() {
        let formatter = create_formatter(OutputFormat::Csv, false);
        assert_eq!(formatter.header(), Some("ts,frequency_hz,magnitude_db"));
        let rows = formatter.format(&frame());
        let rows: Vec<&str> = rows.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].ends_with(",150.0,6.02"), "{}", rows[1]);
    }

    #[test]
    fn test_json_is_parseable() {
        let line = create_formatter(OutputFormat::Json, false).format(&frame());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["start_hz"], 100.0);
        assert_eq!(value["frequencies_hz"].as_array().unwrap().len(), 3);
        assert_eq!(value["magnitudes_db"][2], -60.0);
        assert!(value["ts"].as_str().unwrap().ends_with('Z'));
    }
}
