use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::thread;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender, bounded};

use repeater_dsp::SweepFrame;
use repeater_dsp::output::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "repeater-dsp")]
#[command(about = "Print frequency sweeps reported by the analyzer firmware")]
struct Args {
    /// Serial device or capture file to read (default: stdin)
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print every point of each sweep
    #[arg(short, long)]
    verbose: bool,

    /// Stop after this many sweeps
    #[arg(short = 'n', long)]
    max_frames: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let source: Box<dyn Read + Send> = match &args.input {
        Some(path) => {
            log::info!("Reading sweeps from {}", path.display());
            Box::new(File::open(path)?)
        }
        None => {
            log::info!("Reading sweeps from stdin");
            Box::new(std::io::stdin())
        }
    };

    let (line_tx, line_rx) = bounded(16);
    let reader = thread::spawn(move || read_lines(source, line_tx));

    run_monitor_loop(line_rx, &args)?;

    // A reader still blocked on a tty is left behind when the process exits
    if !reader.is_finished() {
        return Ok(());
    }
    match reader.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("line reader thread panicked"),
    }
}

/// Forward complete lines until end of input or until the receiver hangs up
///
/// Serial noise can put invalid UTF-8 on the line; such bytes are replaced
/// rather than ending the stream.
fn read_lines<R: Read>(source: R, line_tx: Sender<String>) -> anyhow::Result<()> {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                log::warn!("Replacing invalid UTF-8 in input line");
                String::from_utf8_lossy(&buf).into_owned()
            }
        };
        let line = line.trim_end_matches(['\r', '\n']).to_owned();
        if line_tx.send(line).is_err() {
            break;
        }
    }
    Ok(())
}

fn run_monitor_loop(line_rx: Receiver<String>, args: &Args) -> anyhow::Result<()> {
    let formatter = create_formatter(args.format, args.verbose);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let mut frames = 0usize;
    let mut rejected = 0usize;

    // Each line is independent; a bad record only costs that record
    while let Ok(line) = line_rx.recv() {
        match SweepFrame::parse_line(&line) {
            Ok(Some(frame)) => {
                println!("{}", formatter.format(&frame));
                frames += 1;
                if args.max_frames.is_some_and(|max| frames >= max) {
                    break;
                }
            }
            Ok(None) => log::trace!("Ignoring: {}", line),
            Err(e) => {
                rejected += 1;
                log::warn!("Skipping malformed sweep record: {}", e);
            }
        }
    }

    log::info!("{} sweeps, {} malformed records", frames, rejected);
    Ok(())
}
