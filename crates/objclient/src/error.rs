//! Error types for the object storage client.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used for wrapped provider failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the object storage client.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied insufficient or contradictory parameters.
    /// Always detected before any I/O is attempted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The operation context was cancelled, its deadline passed, or the
    /// stall watchdog aborted the transfer.
    #[error("Operation canceled: {0}")]
    Canceled(String),

    /// Any other provider-reported failure
    #[error("{op} {key} failed: {source}")]
    Backend {
        /// Operation name (GET, PUT, HEAD, ...)
        op: &'static str,
        /// Object key or prefix the operation targeted
        key: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// A multi-key removal where at least one key failed
    #[error("Failed to remove {key}: {source}")]
    PartialBatchFailure {
        /// First key (in input order) that could not be removed
        key: String,
        /// Why it could not be removed
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a provider failure with the operation and key it belongs to.
    pub fn backend(
        op: &'static str,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::Backend {
            op,
            key: key.into(),
            source: source.into(),
        }
    }

    /// Recover an [`Error`] that was tunnelled through `std::io::Error`.
    ///
    /// Stream readers can only report `io::Error`, so cancellation and
    /// provider errors travel wrapped. Anything else becomes a backend error.
    pub fn from_io(op: &'static str, key: &str, err: std::io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(recovered) = inner.downcast::<Error>() {
                    return *recovered;
                }
            }
            return Error::backend(op, key, "io error without payload");
        }
        Error::backend(op, key, err)
    }

    /// Wrap this error into an `io::Error` so it can cross an `AsyncRead`.
    pub fn into_io(self) -> std::io::Error {
        std::io::Error::other(self)
    }

    /// Returns true if the object was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the operation was cancelled (by the caller, a
    /// deadline, or the stall watchdog).
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled(_))
    }

    /// Whether retrying the same call without changes may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Canceled(_) | Error::Backend { .. } => true,
            Error::InvalidArgument(_) | Error::NotFound(_) => false,
            Error::PartialBatchFailure { source, .. } => source.is_retryable(),
        }
    }
}
