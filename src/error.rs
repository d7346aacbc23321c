//! Error types for the guided cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the guided cache.
///
/// Only caller-facing operations surface errors. Sweep and reconciliation
/// failures are contained inside the sweep coordinator and logged there;
/// they never interrupt a concurrent caller's get or put.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cached value does not deserialize into the requested type
    #[error("cached value for key '{key}' does not match requested type {expected}: {detail}")]
    TypeMismatch {
        /// The key whose value was requested
        key: String,
        /// Type name the caller asked for
        expected: &'static str,
        /// Deserializer diagnostic
        detail: String,
    },

    /// A user-supplied value loader failed; nothing was cached
    #[error("value loader {loader} failed for key '{key}': {reason}")]
    Loader {
        /// The key being loaded
        key: String,
        /// Type name of the loader closure
        loader: &'static str,
        /// The loader's own error
        reason: anyhow::Error,
    },

    /// Value handed to put could not be serialized
    #[error("value for key '{key}' is not serializable: {detail}")]
    Serialization {
        /// The key being written
        key: String,
        /// Serializer diagnostic
        detail: String,
    },

    /// Underlying store or guard provider failure
    #[error("cache backend error: {0}")]
    Backend(String),
}

// == Result Type Alias ==
/// Convenience Result type for the guided cache.
pub type Result<T> = std::result::Result<T, CacheError>;
