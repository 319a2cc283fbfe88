//! src/error.rs
//!
//! Error taxonomy for the augmentation pipeline.
//!
//! Every detected violation is fatal to the current call: a misconfiguration
//! will recur on every sample, so nothing here is retried. Silently skipping
//! a malformed sample would change batch composition behind the caller's
//! back, which is worse than aborting.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = TransformError> = std::result::Result<T, E>;

/// Errors produced by the augmentation pipeline.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Contradictory or out-of-range configuration (both force flags set,
    /// crop size exceeding image dimensions, mismatched resize bounds, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was requested that the active path cannot perform,
    /// e.g. decoding an encoded sample where only raw data is supported.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A random draw was requested while no generator was initialized.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// An invariant thought unreachable was violated. Signals a pipeline bug.
    #[error("internal pipeline error: {0}")]
    Internal(String),

    /// The image codec failed to decode an encoded sample.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

impl TransformError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        TransformError::InvalidConfig(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        TransformError::UnsupportedOperation(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        TransformError::Internal(msg.into())
    }
}

/// Returns an `InvalidConfig` error unless the condition holds.
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::TransformError::InvalidConfig(format!($($arg)*)));
        }
    };
}

pub(crate) use ensure_config;
