//! Configuration for the ECG monitor core.
//!
//! The defaults reproduce the canonical 200 Hz Pan-Tompkins tuning from
//! `constants`. Values can be overridden from a TOML file; everything is
//! validated before a detector is built, so an out-of-range value surfaces
//! as a `Config` error instead of a misbehaving pipeline.

use serde::Deserialize;
use std::path::Path;

use crate::constants::{
    BUFFER_SIZE, RR_HIGH_INIT, RR_LOW_INIT, RR_SKIP, SAMPLING_FREQUENCY, SLOPE_WINDOW, T200, T360,
    WARMUP, WINDOW_SIZE,
};
use crate::error::{EcgError, Result};

/// System-wide configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub sampling: SamplingConfig,
    pub detector: DetectorConfig,
    pub rr: RrConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// ADC sample rate in Hz.
    pub sample_rate: u32,
    /// Samples handed to the processor per chunk in streaming mode.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples discarded before detection begins.
    pub warmup: u64,
    /// Hard refractory period in samples.
    pub refractory: u64,
    /// Soft refractory period in samples; a peak inside it must pass the
    /// slope check.
    pub t_wave_window: u64,
    /// Moving-window integral length in samples.
    pub integration_window: usize,
    /// Lookback of the steep-slope search over the squared derivative.
    pub slope_window: usize,
    /// Re-scan recent history with relaxed thresholds when a beat is
    /// overdue.
    pub back_search: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RrConfig {
    /// Initial RR intervals discarded while the thresholds settle.
    pub startup_skip: u32,
    /// Acceptance bounds, in samples, before the first normal-range
    /// average exists.
    pub low_init: f32,
    pub high_init: f32,
    /// Tolerated |rr_avg1 - rr_avg2| gap, in samples, for the rhythm to
    /// count as regular.
    pub regularity_tolerance: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLING_FREQUENCY,
            chunk_size: 256,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            warmup: WARMUP,
            refractory: T200,
            t_wave_window: T360,
            integration_window: WINDOW_SIZE,
            slope_window: SLOPE_WINDOW,
            back_search: false,
        }
    }
}

impl Default for RrConfig {
    fn default() -> Self {
        Self {
            startup_skip: RR_SKIP,
            low_init: RR_LOW_INIT,
            high_init: RR_HIGH_INIT,
            regularity_tolerance: 2.0,
        }
    }
}

impl MonitorConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MonitorConfig =
            toml::from_str(&text).map_err(|e| EcgError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling.sample_rate == 0 {
            return Err(EcgError::Config("sample_rate must be non-zero".into()));
        }
        if self.sampling.chunk_size == 0 || self.sampling.chunk_size > BUFFER_SIZE {
            return Err(EcgError::Config(format!(
                "chunk_size must be in 1..={}, got {}",
                BUFFER_SIZE, self.sampling.chunk_size
            )));
        }
        let d = &self.detector;
        if d.integration_window == 0 || d.integration_window > BUFFER_SIZE {
            return Err(EcgError::Config(format!(
                "integration_window must be in 1..={}, got {}",
                BUFFER_SIZE, d.integration_window
            )));
        }
        if d.slope_window == 0 || d.slope_window >= BUFFER_SIZE {
            return Err(EcgError::Config(format!(
                "slope_window must be in 1..{}, got {}",
                BUFFER_SIZE, d.slope_window
            )));
        }
        if d.refractory == 0 {
            return Err(EcgError::Config("refractory must be non-zero".into()));
        }
        if d.t_wave_window <= d.refractory {
            return Err(EcgError::Config(format!(
                "t_wave_window ({}) must exceed refractory ({})",
                d.t_wave_window, d.refractory
            )));
        }
        if d.t_wave_window >= BUFFER_SIZE as u64 {
            return Err(EcgError::Config(format!(
                "t_wave_window must stay below the ring capacity ({})",
                BUFFER_SIZE
            )));
        }
        let rr = &self.rr;
        if rr.low_init <= 0.0 || rr.high_init <= rr.low_init {
            return Err(EcgError::Config(format!(
                "RR acceptance bounds must satisfy 0 < low ({}) < high ({})",
                rr.low_init, rr.high_init
            )));
        }
        if rr.regularity_tolerance < 0.0 {
            return Err(EcgError::Config(
                "regularity_tolerance must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_integration_window_rejected() {
        let mut config = MonitorConfig::default();
        config.detector.integration_window = BUFFER_SIZE + 1;
        match config.validate() {
            Err(EcgError::Config(msg)) => assert!(msg.contains("integration_window")),
            other => panic!("Expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_inverted_refractories_rejected() {
        let mut config = MonitorConfig::default();
        config.detector.t_wave_window = config.detector.refractory;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_rr_bounds_rejected() {
        let mut config = MonitorConfig::default();
        config.rr.low_init = 300.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_text = r#"
            [detector]
            back_search = true

            [rr]
            startup_skip = 3
        "#;
        let config: MonitorConfig = toml::from_str(toml_text).unwrap();
        assert!(config.detector.back_search);
        assert_eq!(config.rr.startup_skip, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.sampling.sample_rate, SAMPLING_FREQUENCY);
        assert_eq!(config.detector.refractory, T200);
        assert_eq!(config.detector.t_wave_window, T360);
        assert!(config.validate().is_ok());
    }
}
