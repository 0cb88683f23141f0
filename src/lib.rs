pub mod acquisition;
pub mod config;
pub mod constants;
pub mod error;
pub mod processing;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::MonitorConfig;
pub use error::{EcgError, Result};
pub use processing::{BeatEvent, EcgProcessor};
pub use signal_processing::{QrsDetector, RhythmAssessment, SampleResult};
pub use wav::{load_trace, save_trace};
