use anyhow::{Context, Result, ensure};
use clap::Parser;
use std::path::PathBuf;

use ecgmon::constants::SAMPLING_FREQUENCY;
use ecgmon::save_trace;
use ecgmon::simulation::{NoiseConfig, apply_noise, pulse_train, synthetic_ecg};

#[derive(Parser, Debug)]
#[command(name = "generate_ecg")]
#[command(about = "Generate synthetic ECG WAV records for detector testing")]
struct Args {
    /// Output WAV path
    #[arg(short, long, default_value = "data/synthetic/ecg.wav")]
    output: PathBuf,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 60.0)]
    duration: f32,

    /// Heart rate in bpm
    #[arg(long, default_value_t = 60.0)]
    bpm: f32,

    /// R-wave amplitude in ADC counts
    #[arg(long, default_value_t = 700.0)]
    amplitude: f32,

    /// Bare pulses instead of the PQRST morphology
    #[arg(long)]
    pulses: bool,

    /// AWGN SNR in dB
    #[arg(long)]
    snr: Option<f32>,

    /// Baseline wander amplitude in ADC counts (0.3 Hz)
    #[arg(long)]
    wander: Option<f32>,

    /// Mains hum amplitude in ADC counts (50 Hz)
    #[arg(long)]
    hum: Option<f32>,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.duration > 0.0, "duration must be positive");
    ensure!(args.bpm > 0.0, "bpm must be positive");

    let num_samples = (args.duration * SAMPLING_FREQUENCY as f32) as usize;
    let period = (60.0 / args.bpm * SAMPLING_FREQUENCY as f32).round() as usize;
    ensure!(period >= 1, "bpm {} is above the sampling rate", args.bpm);

    let mut trace = if args.pulses {
        pulse_train(num_samples, period, period, args.amplitude)
    } else {
        synthetic_ecg(num_samples, period, period, args.amplitude).0
    };

    let mut noise = NoiseConfig::default();
    if let Some(seed) = args.seed {
        noise = noise.with_seed(seed);
    }
    if let Some(snr) = args.snr {
        noise = noise.with_awgn(snr);
    }
    if let Some(wander) = args.wander {
        noise = noise.with_baseline_wander(wander, 0.3);
    }
    if let Some(hum) = args.hum {
        noise = noise.with_mains_hum(hum, 50.0);
    }
    apply_noise(&mut trace, &noise, SAMPLING_FREQUENCY as f32);

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    save_trace(&args.output, &trace, SAMPLING_FREQUENCY)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} samples ({:.1} s at {} Hz) to {}",
        trace.len(),
        args.duration,
        SAMPLING_FREQUENCY,
        args.output.display()
    );
    Ok(())
}
