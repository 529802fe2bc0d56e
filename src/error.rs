//! Structured errors for verification runs.

use thiserror::Error;

use crate::compare::Mismatch;

/// Outcome of a verification entry point.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// One or more scalar comparisons exceeded their tolerance bound.
    ///
    /// Carries every mismatch collected across all channels; channels are
    /// checked independently, so one violation never hides another.
    #[error("{}: {} comparison(s) out of tolerance", .context, .mismatches.len())]
    Tolerance {
        /// Short description of the failing configuration.
        context: String,
        /// All collected diagnostics, in channel order.
        mismatches: Vec<Mismatch>,
    },

    /// The configuration and buffer set are inconsistent, or the requested
    /// precision/mode combination is unsupported. Detected before any
    /// computation runs.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
