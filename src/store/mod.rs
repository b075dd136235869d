//! Document stores - the revisioned storage the upsert engine writes through.
//!
//! The engine only needs two operations: `get` (failing with
//! [`StoreError::NotFound`] when nothing is stored) and a conditional `put`
//! (failing with [`StoreError::Conflict`] when the supplied `_rev` no longer
//! matches). Anything else a backend reports is passed through untouched.

mod in_memory;
mod store;

use serde::{Deserialize, Serialize};

use crate::document::Revision;

/// Result of a write, or of an upsert that decided nothing needed writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// `false` only when the diff function asked for no change.
    pub ok: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<Revision>,
}

/// Options forwarded to [`DocumentStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PutOptions {
    /// When `false` the store accepts the supplied revision verbatim instead of
    /// checking it against the stored one and minting a new one. The revision
    /// comes from `_rev`, or from the `_revisions` history hint.
    pub new_edits: bool,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self { new_edits: true }
    }
}

impl PutOptions {
    /// Options for replication-style writes that keep the supplied revision.
    pub fn replicated() -> Self {
        Self { new_edits: false }
    }
}

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored under this id.
    #[error("document not found: {id}")]
    NotFound { id: String },
    /// The supplied revision does not match the stored one.
    #[error(
        "document update conflict on {id} (expected {}, actual {})",
        describe_rev(.expected),
        describe_rev(.actual)
    )]
    Conflict {
        id: String,
        expected: Option<Revision>,
        actual: Option<Revision>,
    },
    /// The request itself was malformed (missing id, unparsable revision).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Serialization/deserialization error.
    #[error("document serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("document storage error: {0}")]
    Storage(String),
}

fn describe_rev(rev: &Option<Revision>) -> String {
    match rev {
        Some(rev) => rev.to_string(),
        None => "none".to_string(),
    }
}

impl StoreError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::Conflict { .. } => 409,
            StoreError::InvalidArgument(_) => 400,
            StoreError::Serde(_) => 500,
            StoreError::Storage(_) => 500,
        }
    }

    /// Short machine-readable error name.
    pub fn name(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Conflict { .. } => "conflict",
            StoreError::InvalidArgument(_) => "bad_request",
            StoreError::Serde(_) => "serialization_error",
            StoreError::Storage(_) => "storage_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

pub use in_memory::InMemoryDocumentStore;
pub use store::DocumentStore;
