//! Deterministic ECG-like test signals and noise models.
//!
//! Everything here produces raw ADC traces the way the front-end would
//! deliver them: unsigned 12-bit counts around mid-scale at 200 Hz. The
//! generators also return ground-truth R positions so detection accuracy
//! can be measured.

mod ecg;
mod noise;

pub use ecg::{PULSE_WIDTH, pulse_positions, pulse_train, synthetic_ecg};
pub use noise::{
    AdditiveNoiseConfig, BaselineWanderConfig, MainsHumConfig, NoiseConfig, apply_noise,
    signal_power,
};
