//! DocumentStore - Abstract revisioned storage for documents.

use super::{PutOptions, StoreError, WriteOutcome};
use crate::document::Document;

/// Abstract revisioned document storage.
///
/// Implementations might wrap a CouchDB HTTP endpoint, an embedded KV engine,
/// or the in-memory map used for tests.
pub trait DocumentStore: Send + Sync {
    /// Get the current document by ID, including its `_id` and `_rev`.
    /// Fails with `StoreError::NotFound` when nothing is stored.
    fn get(&self, id: &str) -> Result<Document, StoreError>;

    /// Conditionally write a document.
    ///
    /// With `new_edits` on, the write succeeds only if the document's `_rev`
    /// matches the stored revision (or both are absent); otherwise it fails
    /// with `StoreError::Conflict`.
    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        (**self).get(id)
    }

    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        (**self).put(doc, options)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        (**self).get(id)
    }

    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        (**self).put(doc, options)
    }
}
