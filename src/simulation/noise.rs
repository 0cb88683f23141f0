use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f32::consts::PI;

use crate::constants::{ADC_MAX, ADC_MIDSCALE};

/// Composable corruption of a clean ADC trace.
///
/// Models the usual single-lead nuisances: broadband amplifier noise,
/// respiratory baseline wander and mains pickup. Seed it for
/// reproducible test vectors.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub baseline_wander: Option<BaselineWanderConfig>,
    pub mains_hum: Option<MainsHumConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_baseline_wander(mut self, amplitude_counts: f32, frequency_hz: f32) -> Self {
        self.baseline_wander = Some(BaselineWanderConfig {
            amplitude_counts,
            frequency_hz,
        });
        self
    }

    pub fn with_mains_hum(mut self, amplitude_counts: f32, frequency_hz: f32) -> Self {
        self.mains_hum = Some(MainsHumConfig {
            amplitude_counts,
            frequency_hz,
        });
        self
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    /// SNR against the AC power of the clean trace, in dB.
    pub snr_db: f32,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct BaselineWanderConfig {
    pub amplitude_counts: f32,
    /// Respiration sits around 0.2-0.4 Hz.
    pub frequency_hz: f32,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct MainsHumConfig {
    pub amplitude_counts: f32,
    pub frequency_hz: f32,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// AC power of a trace, with the mid-scale offset removed.
pub fn signal_power(trace: &[u16]) -> f32 {
    if trace.is_empty() {
        return 0.0;
    }
    trace
        .iter()
        .map(|&v| {
            let x = v as f32 - ADC_MIDSCALE as f32;
            x * x
        })
        .sum::<f32>()
        / trace.len() as f32
}

/// Apply the configured corruptions to a trace in-place.
pub fn apply_noise(trace: &mut [u16], config: &NoiseConfig, sample_rate: f32) {
    let mut rng = create_rng(config.seed);
    let mut offsets = vec![0.0f32; trace.len()];

    if let Some(additive) = &config.additive {
        let power = signal_power(trace);
        if power > 0.0 {
            let snr_linear = 10.0_f32.powf(additive.snr_db / 10.0);
            let noise_std = (power / snr_linear).sqrt();
            let normal = Normal::new(0.0, noise_std as f64).unwrap();
            for offset in offsets.iter_mut() {
                *offset += normal.sample(&mut rng) as f32;
            }
        }
    }

    if let Some(wander) = &config.baseline_wander {
        let phase: f32 = rng.random::<f32>() * 2.0 * PI;
        for (i, offset) in offsets.iter_mut().enumerate() {
            let t = i as f32 / sample_rate;
            *offset += wander.amplitude_counts
                * (2.0 * PI * wander.frequency_hz * t + phase).sin();
        }
    }

    if let Some(hum) = &config.mains_hum {
        let phase: f32 = rng.random::<f32>() * 2.0 * PI;
        for (i, offset) in offsets.iter_mut().enumerate() {
            let t = i as f32 / sample_rate;
            *offset += hum.amplitude_counts * (2.0 * PI * hum.frequency_hz * t + phase).sin();
        }
    }

    for (sample, offset) in trace.iter_mut().zip(offsets) {
        *sample = (*sample as f32 + offset).round().clamp(0.0, ADC_MAX as f32) as u16;
    }
}
