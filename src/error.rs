use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcgError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sample stream error: {0}")]
    SampleFormat(String),

    #[error("Non-monotonic sample index: expected {expected}, got {got}")]
    NonMonotonic { expected: u64, got: u64 },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EcgError>;
