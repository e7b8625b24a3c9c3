use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use repeater_dsp::config::ControllerConfig;
use repeater_dsp::filter_design::{
    FilterDesign, FilterSpec, cascade_response, design_wideband_notch, fir_response,
    magnitude_db,
};
use repeater_dsp::signal_processing::BiquadCoefficients;

#[derive(Parser, Debug)]
#[command(name = "design_filters")]
#[command(about = "Design the repeater filter set and print coefficients", long_about = None)]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Output format: text, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print FIR taps oldest-first instead of newest-first
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Only design the filter with this name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Frequencies in Hz at which to report the response
    #[arg(short = 'a', long = "at", value_delimiter = ',', default_values_t = vec![0.0, 67.0, 123.0, 250.0, 300.0, 1000.0, 3000.0])]
    at_hz: Vec<f64>,

    /// Omit coefficients, print only response summaries
    #[arg(short = 's', long)]
    summary: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct ProbePoint {
    frequency_hz: f64,
    magnitude_db: f64,
}

#[derive(Debug, Clone, Serialize)]
struct DesignReport {
    name: String,
    sample_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    taps: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sections: Option<Vec<BiquadCoefficients>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deviation: Option<f64>,
    response: Vec<ProbePoint>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    config.validate()?;

    let mut reports = Vec::new();
    for (name, spec) in configured_specs(&config)? {
        if args.name.as_deref().is_some_and(|wanted| wanted != name) {
            continue;
        }
        log::info!("Designing {} ({:?})", name, spec.kind());
        let design = spec.design()?;
        reports.push(build_report(name, spec.sample_rate(), design, &args));
    }

    // The wideband notch is a cascade and has no single-spec form
    if args.name.as_deref().is_none_or(|wanted| wanted == "wideband_notch") {
        let notch = config.filters.notch_spec()?;
        log::info!("Designing wideband_notch");
        let sections = design_wideband_notch(&notch)?;
        reports.push(build_report(
            "wideband_notch",
            notch.sample_rate(),
            FilterDesign::Iir(sections),
            &args,
        ));
    }

    if reports.is_empty() {
        anyhow::bail!("no filter named {:?}", args.name.unwrap_or_default());
    }

    match args.format {
        OutputFormat::Text => print_text(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    Ok(())
}

fn configured_specs(config: &ControllerConfig) -> anyhow::Result<Vec<(&'static str, FilterSpec)>> {
    let filters = &config.filters;
    let mut specs: Vec<(&'static str, FilterSpec)> = vec![
        ("half_band", filters.half_band_spec()?.into()),
        ("noise_highpass", filters.noise_highpass_spec()?.into()),
        ("ctcss_highpass", filters.ctcss_highpass_spec()?.into()),
        ("ctcss_bandpass", filters.ctcss_bandpass_spec()?.into()),
        ("interpolation_lowpass", filters.interpolation_lowpass_spec()?.into()),
        ("notch", filters.notch_spec()?.into()),
    ];
    if let Some(spec) = config.audio.dc_block_spec()? {
        specs.push(("dc_block", spec.into()));
    }
    if let Some(spec) = filters.tx_lowpass_spec()? {
        specs.push(("tx_lowpass", spec.into()));
    }
    Ok(specs)
}

fn build_report(name: &str, sample_rate: f64, design: FilterDesign, args: &Args) -> DesignReport {
    let nyquist = sample_rate / 2.0;
    let points = args.at_hz.iter().copied().filter(|&f| (0.0..=nyquist).contains(&f));

    match design {
        FilterDesign::Fir(coeffs) => {
            let response = points
                .map(|f| ProbePoint {
                    frequency_hz: f,
                    magnitude_db: magnitude_db(fir_response(coeffs.taps(), f, sample_rate)),
                })
                .collect();
            let deviation = coeffs.deviation();
            let taps = if args.reverse {
                coeffs.reversed().into_taps()
            } else {
                coeffs.into_taps()
            };
            DesignReport {
                name: name.to_string(),
                sample_rate,
                taps: (!args.summary).then_some(taps),
                sections: None,
                deviation,
                response,
            }
        }
        FilterDesign::Iir(sections) => {
            let response = points
                .map(|f| ProbePoint {
                    frequency_hz: f,
                    magnitude_db: magnitude_db(cascade_response(&sections, f, sample_rate)),
                })
                .collect();
            DesignReport {
                name: name.to_string(),
                sample_rate,
                taps: None,
                sections: (!args.summary).then_some(sections),
                deviation: None,
                response,
            }
        }
    }
}

fn print_text(reports: &[DesignReport]) {
    for report in reports {
        println!("{} @ {} Hz", report.name, report.sample_rate);
        if let Some(deviation) = report.deviation {
            println!("  deviation: {:.6} ({:.1} dB)", deviation, 20.0 * deviation.log10());
        }
        if let Some(ref taps) = report.taps {
            println!("  taps ({}):", taps.len());
            for tap in taps {
                println!("    {:+.12e}", tap);
            }
        }
        if let Some(ref sections) = report.sections {
            for (i, s) in sections.iter().enumerate() {
                println!(
                    "  section {}: b = [{:+.12e}, {:+.12e}, {:+.12e}] a = [1, {:+.12e}, {:+.12e}]",
                    i, s.b0, s.b1, s.b2, s.a1, s.a2
                );
            }
        }
        println!("  response:");
        for point in &report.response {
            println!("    {:>8.1} Hz  {:>8.2} dB", point.frequency_hz, point.magnitude_db);
        }
        println!();
    }
}
