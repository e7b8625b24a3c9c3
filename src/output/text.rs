use super::Formatter;
use crate::sweep::SweepFrame;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, frame: &SweepFrame) -> String {
        let frequencies = frame.frequencies();
        let last_hz = frequencies.last().copied().unwrap_or(frame.start_hz());
        let (peak_hz, peak_db) = frame.peak();
        let summary = format!(
            "Sweep: {} points {:.1}-{:.1} Hz, peak {:>6.2} dB at {:.1} Hz",
            frame.len(),
            frame.start_hz(),
            last_hz,
            peak_db,
            peak_hz
        );
        if !self.verbose {
            return summary;
        }
        let mut lines = vec![summary];
        lines.extend(
            frame
                .series()
                .iter()
                .map(|(freq, db)| format!("  {:>8.1} Hz {:>7.2} dB", freq, db)),
        );
        lines.join("\n")
    }
}
