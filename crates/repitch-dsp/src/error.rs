//! Error types for repitch-dsp.

/// Result type alias using [`ShiftError`].
pub type Result<T> = std::result::Result<T, ShiftError>;

/// Reasons the pitch-shift capability rejects a request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShiftError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Signal shorter than one analysis window.
    #[error("signal too short: {len} samples, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// Shift amount is NaN or infinite.
    #[error("shift amount is not finite: {0}")]
    NonFinite(f64),

    /// Analysis parameters the vocoder cannot work with.
    #[error("invalid analysis parameters: {0}")]
    InvalidParameters(String),

    /// The resampler failed to build or run.
    #[error("resampling failed: {0}")]
    Resample(String),
}
