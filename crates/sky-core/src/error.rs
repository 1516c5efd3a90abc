//! Error types for Skyline

use thiserror::Error;

/// Skyline error type
///
/// Degenerate likelihoods are deliberately *not* errors: they propagate as
/// an ordinary `f64::NEG_INFINITY` value so the external sampler rejects
/// the proposal through its normal acceptance rule.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid trajectory or grid configuration; fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Interval/partition bookkeeping inconsistent with tree structure;
    /// caller-misuse class, fails loud and early
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
