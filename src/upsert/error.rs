use std::error::Error;

use crate::store::StoreError;

/// Error type for upsert operations.
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// Missing or invalid identifier. Raised before the store is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The document already exists (strict insert).
    #[error("{id} already exists")]
    AlreadyExists { id: String },
    /// Every write attempt lost against a concurrent writer.
    #[error("gave up on {id} after {attempts} conflicting write attempts")]
    RetryExhausted { id: String, attempts: u32 },
    /// Store error other than a recovered not-found or conflict.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Error raised by a caller-supplied diff function, passed through as-is.
    #[error(transparent)]
    Diff(Box<dyn Error + Send + Sync>),
}

impl UpsertError {
    /// Wrap an arbitrary error raised inside a diff function.
    pub fn diff(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        UpsertError::Diff(err.into())
    }

    /// A diff function refusing the change with a plain message.
    pub fn rejected(message: impl Into<String>) -> Self {
        let message: String = message.into();
        UpsertError::Diff(message.into())
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            UpsertError::InvalidArgument(_) => 400,
            UpsertError::AlreadyExists { .. } => 409,
            UpsertError::RetryExhausted { .. } => 409,
            UpsertError::Store(e) => e.status_code(),
            UpsertError::Diff(_) => 500,
        }
    }

    /// Short machine-readable error name.
    pub fn name(&self) -> &'static str {
        match self {
            UpsertError::InvalidArgument(_) => "invalid_argument",
            UpsertError::AlreadyExists { .. } => "already_exists",
            UpsertError::RetryExhausted { .. } => "retry_exhausted",
            UpsertError::Store(e) => e.name(),
            UpsertError::Diff(_) => "diff_error",
        }
    }
}
