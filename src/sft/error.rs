//! Input errors raised by the comparison toolkit
//!
//! These are caller mistakes (bad parameters, empty samples), never
//! expected-vs-actual mismatches. Mismatches are reported as `BAD:` lines.

use thiserror::Error;

/// Errors that can occur while setting up a statistical comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SftError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty sample: {0}")]
    EmptySample(String),

    #[error("Unsupported distribution for {test}: {distribution}")]
    UnsupportedDistribution {
        test: &'static str,
        distribution: String,
    },

    #[error("Length mismatch: actual has {actual} values, expected has {expected}")]
    LengthMismatch { actual: usize, expected: usize },
}

/// Result type for toolkit operations
pub type Result<T> = std::result::Result<T, SftError>;
