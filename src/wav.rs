//! Sample file helpers for the boundary binaries.
//!
//! Two formats are supported: WAV (any channel count, first channel used)
//! and plain text with one signed 16-bit PCM value per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, bail};
use hound::{WavReader, WavSpec, WavWriter};

use crate::signal_processing::SampleBuffer;

const PCM16_FULL_SCALE: f32 = 32768.0;

/// Load the first channel of a WAV file, scaled to [-1, 1)
pub fn load_wav<P: AsRef<Path>>(path: P) -> anyhow::Result<SampleBuffer> {
    let path = path.as_ref();
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = 2f32.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    if channels > 1 {
        log::info!(
            "{}: {} channels, using the first",
            path.display(),
            spec.channels
        );
    }
    let samples = interleaved.into_iter().step_by(channels).collect();
    Ok(SampleBuffer::new(samples, spec.sample_rate)?)
}

/// Write a mono 32-bit float WAV file
pub fn save_wav<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read one signed 16-bit PCM value per line; blank lines are skipped
pub fn load_text_samples<P: AsRef<Path>>(path: P, sample_rate: u32) -> anyhow::Result<SampleBuffer> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut samples = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: i32 = line
            .parse()
            .with_context(|| format!("{}:{}: '{}' is not an integer", path.display(), line_no + 1, line))?;
        if !(i16::MIN as i32..=i16::MAX as i32).contains(&value) {
            bail!("{}:{}: {} is outside the 16-bit range", path.display(), line_no + 1, value);
        }
        samples.push(value as f32 / PCM16_FULL_SCALE);
    }
    Ok(SampleBuffer::new(samples, sample_rate)?)
}

/// Write samples as signed 16-bit PCM values, one per line, clipping at full scale
pub fn save_text_samples<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for &sample in buffer.samples() {
        let value = (sample * PCM16_FULL_SCALE)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writeln!(writer, "{}", value)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("repeater_dsp_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_wav_round_trip() {
        let path = temp_path("round_trip.wav");
        let buffer = SampleBuffer::new(vec![0.0, 0.25, -0.5, 0.75], 8000).unwrap();
        save_wav(&path, &buffer).unwrap();
        let loaded = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_stereo_int_wav_uses_first_channel() {
        let path = temp_path("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 32000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(16384i16, -1i16), (-8192, 5)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.sample_rate(), 32000);
        assert_eq!(loaded.samples(), &[0.5, -0.25]);
    }

    #[test]
    fn test_32_bit_int_wav_scales_to_full_range() {
        let path = temp_path("int32.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 32000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [1i32 << 30, i32::MIN, 0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.samples(), &[0.5, -1.0, 0.0]);
    }

    #[test]
    fn test_text_samples() {
        let path = temp_path("samples.txt");
        std::fs::write(&path, "0\n16384\n\n-32768\n").unwrap();
        let loaded = load_text_samples(&path, 32000).unwrap();
        assert_eq!(loaded.samples(), &[0.0, 0.5, -1.0]);

        save_text_samples(&path, &SampleBuffer::new(vec![0.5, 2.0, -0.25], 8000).unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "16384\n32767\n-8192\n");

        std::fs::write(&path, "12\nabc\n").unwrap();
        assert!(load_text_samples(&path, 8000).is_err());
        std::fs::write(&path, "40000\n").unwrap();
        assert!(load_text_samples(&path, 8000).is_err());
        std::fs::remove_file(&path).ok();
    }
}
