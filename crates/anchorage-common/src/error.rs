//! Unified error types for the Anchorage workspace.
//!
//! Collaborator backends (builders, publishers) report failures as boxed
//! errors; the pipeline wraps them with the reference they were working on.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error type used at the Builder/Publisher capability boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum AnchorageError {
    /// A document in the input stream could not be parsed as YAML.
    #[error("parse error in document {index}: {source}")]
    Parse {
        /// Zero-based ordinal of the offending document in the input stream.
        index: usize,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// A selector expression is malformed.
    #[error("invalid selector: {message}")]
    Selector {
        /// Description of the malformed expression.
        message: String,
    },

    /// The builder failed for a reference.
    #[error("build failed for {reference}: {source}")]
    Build {
        /// The reference that was being built.
        reference: String,
        /// Underlying builder error.
        source: BoxError,
    },

    /// The publisher failed for an artifact/reference pair.
    #[error("publish failed for {reference}: {source}")]
    Publish {
        /// The reference whose artifact was being published.
        reference: String,
        /// Underlying publisher error.
        source: BoxError,
    },

    /// Publisher finalization failed after otherwise successful publishes.
    #[error("publisher finalization failed: {source}")]
    Finalize {
        /// Underlying publisher error.
        source: BoxError,
    },

    /// An in-place rewrite could not be applied faithfully.
    #[error("cannot rewrite {reference} in document {index}: {message}")]
    Rewrite {
        /// The reference being rewritten.
        reference: String,
        /// Zero-based ordinal of the document being rewritten.
        index: usize,
        /// Why the substitution was refused.
        message: String,
    },

    /// A worker task ended abnormally (panicked or was aborted).
    #[error("build worker failed: {source}")]
    Worker {
        /// Underlying join error.
        source: BoxError,
    },

    /// The run was cancelled before completion.
    #[error("resolution cancelled: {reason}")]
    Cancelled {
        /// What triggered the cancellation.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

impl AnchorageError {
    /// Returns true for errors raised purely because the run was cancelled.
    ///
    /// Used to prefer a real build/publish failure over the cancellation
    /// errors reported by sibling jobs aborted while waiting for a slot.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AnchorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_mentions_reference() {
        let err = AnchorageError::Build {
            reference: "anc://example.com/app".into(),
            source: "compiler exploded".into(),
        };
        assert!(err.to_string().contains("anc://example.com/app"));
    }

    #[test]
    fn cancelled_is_cancellation() {
        let err = AnchorageError::Cancelled {
            reason: "caller".into(),
        };
        assert!(err.is_cancellation());
    }

    #[test]
    fn build_error_is_not_cancellation() {
        let err = AnchorageError::Build {
            reference: "anc://x".into(),
            source: "boom".into(),
        };
        assert!(!err.is_cancellation());
    }
}
