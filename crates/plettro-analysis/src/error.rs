//! Error types for plettro-analysis.

use thiserror::Error;

/// Error type for detector construction.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid sample rate: must be greater than zero")]
    InvalidSampleRate,

    #[error(
        "Invalid period search range {min_period}..{max_period} at {sample_rate} Hz; \
         the frequency bounds are too close or too high for this rate"
    )]
    InvalidSearchRange {
        min_period: usize,
        max_period: usize,
        sample_rate: u32,
    },

    #[error("Tuning has no strings")]
    EmptyTuning,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
