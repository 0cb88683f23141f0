use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use crossbeam_channel::bounded;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use ecgmon::acquisition::SampleRing;
use ecgmon::constants::{ADC_MAX, BUFFER_SIZE};
use ecgmon::{BeatEvent, EcgProcessor, MonitorConfig};

#[derive(Parser, Debug)]
#[command(name = "ecgmon")]
#[command(about = "Real-time single-lead QRS detection and rhythm tracking", long_about = None)]
struct Args {
    /// Input trace: WAV record or text file with one ADC count per line
    /// ("-" reads counts from stdin)
    input: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable back-search recovery of overdue beats
    #[arg(short = 'b', long)]
    back_search: bool,

    /// Pace the producer at the acquisition rate instead of streaming as
    /// fast as possible
    #[arg(short = 'r', long)]
    realtime: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn format_text(beat: &BeatEvent) -> String {
    let rate = match beat.heart_rate_bpm {
        Some(bpm) => format!("{:>5.1} bpm", bpm),
        None => "   --    ".to_string(),
    };
    let rhythm = if beat.rr_average == 0.0 {
        "settling"
    } else if beat.regular {
        "regular"
    } else {
        "irregular"
    };
    format!(
        "Beat @ {:>8.2} s  RR avg: {:>5.1}  HR: {}  rhythm: {}",
        beat.time_secs, beat.rr_average, rate, rhythm
    )
}

fn format_json(beat: &BeatEvent) -> String {
    serde_json::json!({
        "ts": iso8601_timestamp(),
        "sample": beat.sample_index,
        "time_secs": beat.time_secs,
        "rr_average": beat.rr_average,
        "heart_rate_bpm": beat.heart_rate_bpm,
        "regular": beat.regular,
    })
    .to_string()
}

fn format_csv(beat: &BeatEvent) -> String {
    format!(
        "{},{},{:.3},{:.1},{},{}",
        iso8601_timestamp(),
        beat.sample_index,
        beat.time_secs,
        beat.rr_average,
        beat.heart_rate_bpm
            .map_or(String::new(), |bpm| format!("{:.1}", bpm)),
        beat.regular
    )
}

fn csv_header() -> &'static str {
    "ts,sample,time_secs,rr_average,heart_rate_bpm,regular"
}

fn format_beat(beat: &BeatEvent, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text(beat),
        OutputFormat::Json => format_json(beat),
        OutputFormat::Csv => format_csv(beat),
    }
}

fn parse_counts<R: BufRead>(reader: R) -> anyhow::Result<Vec<u16>> {
    let mut samples = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value: u32 = trimmed
            .parse()
            .with_context(|| format!("line {}: not an ADC count: {trimmed:?}", line_no + 1))?;
        samples.push(value.min(ADC_MAX as u32) as u16);
    }
    Ok(samples)
}

fn load_samples(input: &str, sample_rate: u32) -> anyhow::Result<Vec<u16>> {
    if input == "-" {
        let stdin = std::io::stdin();
        return parse_counts(stdin.lock());
    }
    let path = Path::new(input);
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("wav")) {
        Ok(ecgmon::load_trace(path, sample_rate)?)
    } else {
        let file = std::fs::File::open(path).with_context(|| format!("opening {input}"))?;
        parse_counts(std::io::BufReader::new(file))
    }
}

/// Drive the samples through the SPSC ring exactly the way the firmware
/// does: one thread stands in for the ADC interrupt, one runs the
/// detection loop, and the foreground prints beats as they arrive.
fn stream(
    samples: Vec<u16>,
    mut processor: EcgProcessor,
    chunk_size: usize,
    sample_rate: u32,
    realtime: bool,
    format: OutputFormat,
) -> EcgProcessor {
    let ring = SampleRing::new();
    let processed = AtomicU64::new(0);
    let (beat_tx, beat_rx) = bounded::<BeatEvent>(64);

    thread::scope(|s| {
        let ring = &ring;
        let processed = &processed;

        s.spawn(move || {
            for chunk in samples.chunks(chunk_size) {
                // Hold off instead of lapping the consumer.
                while ring.fill_index() + chunk.len() as u64
                    > processed.load(Ordering::Acquire) + BUFFER_SIZE as u64
                {
                    thread::yield_now();
                }
                for &sample in chunk {
                    ring.push(sample);
                }
                if realtime {
                    thread::sleep(Duration::from_secs_f32(
                        chunk.len() as f32 / sample_rate as f32,
                    ));
                }
            }
            ring.request_shutdown();
        });

        let detection = s.spawn(move || {
            let mut cursor = 0u64;
            let mut buffer: Vec<u16> = Vec::with_capacity(BUFFER_SIZE);
            loop {
                buffer.clear();
                if ring.drain_into(&mut cursor, &mut buffer) > 0 {
                    for beat in processor.process_buffer(&buffer) {
                        let _ = beat_tx.send(beat);
                    }
                    processed.store(cursor, Ordering::Release);
                } else if ring.is_shutdown() && cursor == ring.fill_index() {
                    break;
                } else {
                    thread::yield_now();
                }
            }
            processor
        });

        for beat in beat_rx.iter() {
            println!("{}", format_beat(&beat, format));
        }

        detection.join().expect("detection thread panicked")
    })
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
        Some(path) => MonitorConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if args.back_search {
        config.detector.back_search = true;
    }

    let sample_rate = config.sampling.sample_rate;
    let samples = load_samples(&args.input, sample_rate)?;

    let use_stderr_banner = matches!(args.format, OutputFormat::Json | OutputFormat::Csv);
    macro_rules! banner {
        ($($arg:tt)*) => {
            if use_stderr_banner {
                eprintln!($($arg)*);
            } else {
                println!($($arg)*);
            }
        };
    }

    banner!("=== ecgmon - single-lead QRS monitor ===");
    banner!("Sample rate: {} Hz", sample_rate);
    banner!(
        "Input: {} ({} samples, {:.1} s)",
        args.input,
        samples.len(),
        samples.len() as f32 / sample_rate as f32
    );
    banner!("Back-search: {}", if config.detector.back_search { "on" } else { "off" });
    banner!("");

    if matches!(args.format, OutputFormat::Csv) {
        println!("{}", csv_header());
    }

    let processor = EcgProcessor::new(&config)?;
    let processor = stream(
        samples,
        processor,
        config.sampling.chunk_size,
        sample_rate,
        args.realtime,
        args.format,
    );

    banner!("");
    banner!("Beats detected: {}", processor.beats_detected());
    match processor.heart_rate() {
        Some(bpm) => {
            banner!(
                "Heart rate: {:.1} bpm (mean {:.1} +/- {:.1})",
                bpm,
                processor.heart_rate_stats().mean,
                processor.heart_rate_stats().std_dev
            );
        }
        None => banner!("No settled heart rate (not enough beats)"),
    }

    Ok(())
}
