use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid filter spec: {0}")]
    InvalidSpec(String),

    #[error("Filter design did not converge: {0}")]
    DesignDidNotConverge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DspError>;
