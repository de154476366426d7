//! Cache error types.

use thiserror::Error;

/// Errors raised by a key-value [`Store`](crate::Store) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open a connection to the backend.
    #[error("Failed to connect to store: {0}")]
    Connection(String),

    /// A backend command failed.
    #[error("Store operation `{op}` failed: {message}")]
    Command {
        /// Name of the primitive that failed (e.g. `GET`).
        op: &'static str,
        /// Backend-provided detail.
        message: String,
    },
}

impl StoreError {
    /// Build a command error for the given primitive.
    pub fn command(op: &'static str, message: impl Into<String>) -> Self {
        Self::Command {
            op,
            message: message.into(),
        }
    }
}

/// Errors returned by the [`CacheManager`](crate::CacheManager).
///
/// A missing key is not an error: lookups return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failed to serialize a value before writing it.
    #[error("Serialization error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The cached value is not valid JSON for the requested type.
    #[error("Failed to decode cached value for key `{key}`: {source}")]
    Decode {
        /// Cache key that was read.
        key: String,
        /// The undecoded value as stored.
        raw: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Key not found where a value was required.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The cached value is not a JSON object.
    #[error("Cached value for key `{0}` is not a mapping")]
    NotAMapping(String),
}

impl CacheError {
    /// Raw stored value, if this is a decode failure.
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            Self::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the error originated in the backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
