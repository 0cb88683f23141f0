//! WAV records of raw ADC traces.
//!
//! Captured leads are stored as mono 16-bit PCM at the acquisition rate;
//! each sample is the unsigned 12-bit ADC count. Good enough for feeding
//! recordings back through the detector and for inspecting traces in any
//! audio tool.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use crate::constants::ADC_MAX;
use crate::error::{EcgError, Result};

/// Write a raw ADC trace as a mono 16-bit PCM WAV record.
pub fn save_trace<P: AsRef<Path>>(path: P, samples: &[u16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Load a mono WAV record of raw ADC counts.
///
/// The record must match the expected acquisition rate exactly; the core
/// does not resample. Values outside the 12-bit ADC range are clamped.
pub fn load_trace<P: AsRef<Path>>(path: P, expected_rate: u32) -> Result<Vec<u16>> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(EcgError::SampleFormat(format!(
            "expected a mono record, got {} channels",
            spec.channels
        )));
    }
    if spec.sample_rate != expected_rate {
        return Err(EcgError::SampleFormat(format!(
            "record is {} Hz, expected {} Hz (resampling is not supported)",
            spec.sample_rate, expected_rate
        )));
    }
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(EcgError::SampleFormat(format!(
            "expected 16-bit integer samples, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    reader
        .samples::<i16>()
        .map(|s| Ok(s?.clamp(0, ADC_MAX as i16) as u16))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SAMPLING_FREQUENCY;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ecgmon-wav-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round-trip.wav");
        let samples: Vec<u16> = (0..1000).map(|i| 2048 + (i % 97) as u16).collect();

        save_trace(&path, &samples, SAMPLING_FREQUENCY).unwrap();
        let loaded = load_trace(&path, SAMPLING_FREQUENCY).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(samples, loaded);
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let path = temp_path("rate-mismatch.wav");
        save_trace(&path, &[2048; 100], 500).unwrap();

        let result = load_trace(&path, SAMPLING_FREQUENCY);
        std::fs::remove_file(&path).ok();

        match result {
            Err(EcgError::SampleFormat(msg)) => assert!(msg.contains("Hz")),
            other => panic!("expected a sample-format error, got {:?}", other.map(|v| v.len())),
        }
    }
}
