use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use repeater_dsp::config::{ControllerConfig, CtcssRejection};
use repeater_dsp::constants::MAIN_RATE_HZ;
use repeater_dsp::signal_processing::SampleBuffer;
use repeater_dsp::wav::{load_text_samples, load_wav, save_wav};
use repeater_dsp::{AudioCore, RxMetrics};

#[derive(Parser, Debug)]
#[command(name = "analyze_wav")]
#[command(about = "Run recorded receiver audio through the repeater audio core", long_about = None)]
struct Args {
    /// 32 kHz recordings: WAV, or .txt with one 16-bit PCM value per line
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// CTCSS tone to decode in Hz
    #[arg(short = 't', long)]
    decode_hz: Option<f64>,

    /// How CTCSS is removed from the cross audio
    #[arg(short = 'r', long, value_enum)]
    rejection: Option<CtcssRejection>,

    /// Enable the CTCSS encoder on the transmit output
    #[arg(long)]
    encode: bool,

    /// Write the 32 kHz transmit output (cross audio + encoder) to this directory
    #[arg(long)]
    tx_output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    duration_secs: f64,
    blocks: usize,
    snr_db: Option<StatsSummary>,
    noise_rms: Option<StatsSummary>,
    signal_rms: Option<StatsSummary>,
    ctcss_level_db: Option<StatsSummary>,
    /// Fraction of blocks with the decode tone present
    ctcss_detected: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileAnalysis {
    fn failed(filename: String, error: String) -> Self {
        Self {
            filename,
            duration_secs: 0.0,
            blocks: 0,
            snr_db: None,
            noise_rms: None,
            signal_rms: None,
            ctcss_level_db: None,
            ctcss_detected: 0.0,
            error: Some(error),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(hz) = args.decode_hz {
        config.ctcss.decode_hz = hz;
    }
    if let Some(rejection) = args.rejection {
        config.filters.ctcss_rejection = rejection;
    }
    if args.encode {
        config.ctcss.encode_enabled = true;
    }

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.tx_output.as_deref()))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results, &config),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn analyze_file(path: &Path, config: &ControllerConfig, tx_output: Option<&Path>) -> FileAnalysis {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match analyze_file_impl(path, &filename, config, tx_output) {
        Ok(analysis) => analysis,
        Err(e) => FileAnalysis::failed(filename, e.to_string()),
    }
}

fn load_input(path: &Path) -> anyhow::Result<SampleBuffer> {
    let is_text = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_text {
        load_text_samples(path, MAIN_RATE_HZ)
    } else {
        load_wav(path)
    }
}

fn analyze_file_impl(
    path: &Path,
    filename: &str,
    config: &ControllerConfig,
    tx_output: Option<&Path>,
) -> anyhow::Result<FileAnalysis> {
    let input = load_input(path)?;
    input.expect_rate(MAIN_RATE_HZ)?;
    let duration_secs = input.duration_secs();

    let mut core = AudioCore::new(config)?;

    let block_size = config.audio.block_size;
    let whole_blocks = input.len() / block_size;
    if input.len() % block_size != 0 {
        log::debug!(
            "{}: ignoring {} trailing samples",
            filename,
            input.len() % block_size
        );
    }

    let mut snr_stats: Stats<f32> = Stats::new();
    let mut noise_stats: Stats<f32> = Stats::new();
    let mut signal_stats: Stats<f32> = Stats::new();
    let mut ctcss_stats: Stats<f32> = Stats::new();
    let mut detected_blocks = 0usize;
    let mut tx_samples: Vec<f32> = Vec::new();

    for block in input.samples().chunks_exact(block_size) {
        let cross = core.process_rx(SampleBuffer::new(block.to_vec(), MAIN_RATE_HZ)?)?;

        let RxMetrics {
            noise_rms,
            signal_rms,
            snr_db,
            ..
        } = *core.metrics();
        snr_stats.update(snr_db);
        noise_stats.update(noise_rms);
        signal_stats.update(signal_rms);
        ctcss_stats.update(core.metrics().ctcss_level_db());
        if core.is_ctcss_detected() {
            detected_blocks += 1;
        }

        if tx_output.is_some() {
            tx_samples.extend(core.process_tx(cross)?.into_samples());
        }
    }

    if let Some(dir) = tx_output {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let tx_path = dir.join(format!("{}_tx.wav", stem));
        eprintln!("Writing {} samples to {}", tx_samples.len(), tx_path.display());
        save_wav(&tx_path, &SampleBuffer::new(tx_samples, MAIN_RATE_HZ)?)?;
    }

    Ok(FileAnalysis {
        filename: filename.to_string(),
        duration_secs,
        blocks: whole_blocks,
        snr_db: StatsSummary::from_stats(&snr_stats),
        noise_rms: StatsSummary::from_stats(&noise_stats),
        signal_rms: StatsSummary::from_stats(&signal_stats),
        ctcss_level_db: StatsSummary::from_stats(&ctcss_stats),
        ctcss_detected: if whole_blocks == 0 {
            0.0
        } else {
            detected_blocks as f32 / whole_blocks as f32
        },
        error: None,
    })
}

fn mean_or_dash(stats: &Option<StatsSummary>, precision: usize) -> String {
    stats
        .as_ref()
        .map(|s| format!("{:.*}", precision, s.mean))
        .unwrap_or_else(|| "-".to_string())
}

fn print_text(results: &[FileAnalysis], config: &ControllerConfig) {
    eprintln!(
        "CTCSS decode {} Hz, rejection {:?}, {} samples per block",
        config.ctcss.decode_hz, config.filters.ctcss_rejection, config.audio.block_size
    );
    eprintln!();

    println!(
        "{:<40} {:>8} {:>8} {:>10} {:>10} {:>10} {:>8}",
        "File", "Secs", "SNR dB", "Noise", "Signal", "CTCSS dB", "Tone %"
    );
    println!("{}", "-".repeat(100));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }
        println!(
            "{:<40} {:>8.2} {:>8} {:>10} {:>10} {:>10} {:>8.1}",
            result.filename,
            result.duration_secs,
            mean_or_dash(&result.snr_db, 1),
            mean_or_dash(&result.noise_rms, 4),
            mean_or_dash(&result.signal_rms, 4),
            mean_or_dash(&result.ctcss_level_db, 1),
            100.0 * result.ctcss_detected
        );
    }

    for result in results {
        if let Some(ref snr) = result.snr_db {
            eprintln!();
            eprintln!("SNR for {}:", result.filename);
            eprintln!("  Mean: {:.1} dB", snr.mean);
            eprintln!("  Std dev: {:.1} dB", snr.std_dev);
            eprintln!("  Min: {:.1} dB", snr.min);
            eprintln!("  Max: {:.1} dB", snr.max);
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,duration_secs,blocks,snr_mean,snr_std,noise_rms,signal_rms,ctcss_level_db,ctcss_detected,error"
    );
    for result in results {
        let field = |stats: &Option<StatsSummary>, f: fn(&StatsSummary) -> f32| {
            stats
                .as_ref()
                .map(|s| format!("{:.4}", f(s)))
                .unwrap_or_default()
        };
        println!(
            "{},{:.3},{},{},{},{},{},{},{:.3},{}",
            result.filename,
            result.duration_secs,
            result.blocks,
            field(&result.snr_db, |s| s.mean),
            field(&result.snr_db, |s| s.std_dev),
            field(&result.noise_rms, |s| s.mean),
            field(&result.signal_rms, |s| s.mean),
            field(&result.ctcss_level_db, |s| s.mean),
            result.ctcss_detected,
            result.error.as_deref().unwrap_or("")
        );
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
