use crate::constants::{ADC_MAX, ADC_MIDSCALE};
use std::f32::consts::PI;

/// Width of the raised-cosine pulse used by [`pulse_train`], in samples
/// (~60 ms at 200 Hz, the sharp end of physiological QRS widths).
pub const PULSE_WIDTH: usize = 12;

/// Ground-truth beat positions for a periodic train.
pub fn pulse_positions(num_samples: usize, first_beat: usize, period: usize) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut p = first_beat;
    while p < num_samples {
        positions.push(p);
        p += period;
    }
    positions
}

/// Flat mid-scale trace with one raised-cosine pulse per beat.
///
/// The crudest useful stand-in for a lead: no P or T waves, just an
/// R-like spike of the given amplitude (in ADC counts) centered on every
/// position that `pulse_positions` reports for the same arguments.
pub fn pulse_train(
    num_samples: usize,
    first_beat: usize,
    period: usize,
    amplitude: f32,
) -> Vec<u16> {
    let mut trace = vec![0.0f32; num_samples];
    for center in pulse_positions(num_samples, first_beat, period) {
        add_raised_cosine(&mut trace, center, PULSE_WIDTH, amplitude);
    }
    quantize(&trace)
}

/// Synthetic single-lead ECG built from Gaussian waves.
///
/// Each beat is the sum of P, Q, R, S and T components placed relative to
/// the R-peak, with timings and relative amplitudes in the usual
/// physiological ballpark. `amplitude` scales the R wave in ADC counts.
/// Returns the trace and the ground-truth R positions.
pub fn synthetic_ecg(
    num_samples: usize,
    first_beat: usize,
    period: usize,
    amplitude: f32,
) -> (Vec<u16>, Vec<usize>) {
    // (offset from R in samples, relative amplitude, width)
    const WAVES: [(f32, f32, f32); 5] = [
        (-36.0, 0.15, 8.0),  // P
        (-5.0, -0.12, 2.0),  // Q
        (0.0, 1.0, 2.2),     // R
        (5.0, -0.20, 2.5),   // S
        (40.0, 0.30, 12.0),  // T
    ];

    let positions = pulse_positions(num_samples, first_beat, period);
    let mut trace = vec![0.0f32; num_samples];

    for &center in &positions {
        for &(offset, relative, sigma) in &WAVES {
            add_gaussian(&mut trace, center as f32 + offset, relative * amplitude, sigma);
        }
    }

    (quantize(&trace), positions)
}

fn add_raised_cosine(trace: &mut [f32], center: usize, width: usize, amplitude: f32) {
    let half = width / 2;
    for k in 0..width {
        let idx = center + k;
        if idx < half || idx - half >= trace.len() {
            continue;
        }
        let phase = 2.0 * PI * k as f32 / (width - 1) as f32;
        trace[idx - half] += 0.5 * (1.0 - phase.cos()) * amplitude;
    }
}

fn add_gaussian(trace: &mut [f32], center: f32, amplitude: f32, sigma: f32) {
    let reach = (4.0 * sigma).ceil() as i64;
    let c = center.round() as i64;
    for idx in (c - reach)..=(c + reach) {
        if idx < 0 || idx as usize >= trace.len() {
            continue;
        }
        let dt = idx as f32 - center;
        trace[idx as usize] += amplitude * (-dt * dt / (2.0 * sigma * sigma)).exp();
    }
}

fn quantize(trace: &[f32]) -> Vec<u16> {
    trace
        .iter()
        .map(|&v| (v + ADC_MIDSCALE as f32).round().clamp(0.0, ADC_MAX as f32) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_positions_periodic() {
        let positions = pulse_positions(1000, 100, 250);
        assert_eq!(positions, vec![100, 350, 600, 850]);
    }

    #[test]
    fn test_pulse_train_peaks_at_positions() {
        let trace = pulse_train(1000, 100, 250, 800.0);
        assert_eq!(trace.len(), 1000);
        // Baseline between beats, peak near each center.
        assert_eq!(trace[50], ADC_MIDSCALE);
        for center in [100usize, 350, 600, 850] {
            let local_max = trace[center - 8..center + 8].iter().max().unwrap();
            assert!(*local_max > ADC_MIDSCALE + 700);
        }
    }

    #[test]
    fn test_synthetic_ecg_r_dominates() {
        let (trace, positions) = synthetic_ecg(2000, 300, 200, 700.0);
        assert!(!positions.is_empty());
        for &r in &positions {
            let r_value = trace[r] as i32;
            // The T wave tops out well below the R wave.
            let t_value = trace[r + 40] as i32;
            assert!(r_value - ADC_MIDSCALE as i32 > 600);
            assert!(t_value < r_value);
        }
    }

    #[test]
    fn test_quantize_stays_in_adc_range() {
        let (trace, _) = synthetic_ecg(3000, 100, 150, 3000.0);
        assert!(trace.iter().all(|&v| v <= ADC_MAX));
    }
}
