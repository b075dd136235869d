//! Upserter - Typed accessor for the upsert operations of one store.

use super::{engine, UpsertError, UpsertOptions};
use crate::document::Document;
use crate::store::{DocumentStore, PutOptions, WriteOutcome};

/// Upsert operations bound to a store and a set of options.
pub struct Upserter<'a, S> {
    store: &'a S,
    options: UpsertOptions,
}

impl<'a, S: DocumentStore> Upserter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            options: UpsertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UpsertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.options.max_attempts = max_attempts;
        self
    }

    pub fn put_options(mut self, put: PutOptions) -> Self {
        self.options.put = put;
        self
    }

    pub fn options(&self) -> &UpsertOptions {
        &self.options
    }

    /// Apply `diff` to the current document under `id` and write the result.
    pub fn upsert_ex<F>(&self, id: &str, diff: F) -> Result<WriteOutcome, UpsertError>
    where
        F: FnMut(Document) -> Result<Option<Document>, UpsertError>,
    {
        engine::upsert_with(self.store, id, diff, &self.options)
    }

    /// Write `doc` whole, replacing whatever is stored under its `_id`.
    pub fn upsert(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        let id = required_id(&doc)?;
        self.upsert_ex(&id, |_| Ok(Some(doc.clone())))
    }

    /// Write `doc` under `id` unless a document already exists there.
    /// An existing document is left alone and the outcome has `ok: false`.
    pub fn put_if_not_exists(&self, id: &str, doc: Document) -> Result<WriteOutcome, UpsertError> {
        self.upsert_ex(id, |existing| {
            if existing.has_revision() {
                return Ok(None);
            }
            Ok(Some(doc.clone()))
        })
    }

    /// Like [`put_if_not_exists`](Self::put_if_not_exists), taking the id from `doc`.
    pub fn put_document_if_not_exists(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        let id = required_id(&doc)?;
        self.put_if_not_exists(&id, doc)
    }

    /// Insert `doc` under its `_id`, failing with `AlreadyExists` (409) if a
    /// document is already stored there.
    pub fn post_ex(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        let id = required_id(&doc)?;
        self.upsert_ex(&id, |existing| {
            if existing.has_revision() {
                return Err(UpsertError::AlreadyExists {
                    id: existing.id().unwrap_or(id.as_str()).to_string(),
                });
            }
            Ok(Some(doc.clone()))
        })
    }
}

fn required_id(doc: &Document) -> Result<String, UpsertError> {
    doc.id()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| UpsertError::InvalidArgument("missing _id".into()))
}

/// Extension trait adding upsert operations to any DocumentStore.
pub trait UpsertExt: DocumentStore + Sized {
    /// Get an upserter with default options.
    fn upserter(&self) -> Upserter<'_, Self> {
        Upserter::new(self)
    }

    fn upsert_ex<F>(&self, id: &str, diff: F) -> Result<WriteOutcome, UpsertError>
    where
        F: FnMut(Document) -> Result<Option<Document>, UpsertError>,
    {
        self.upserter().upsert_ex(id, diff)
    }

    fn upsert(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        self.upserter().upsert(doc)
    }

    fn put_if_not_exists(&self, id: &str, doc: Document) -> Result<WriteOutcome, UpsertError> {
        self.upserter().put_if_not_exists(id, doc)
    }

    fn put_document_if_not_exists(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        self.upserter().put_document_if_not_exists(doc)
    }

    fn post_ex(&self, doc: Document) -> Result<WriteOutcome, UpsertError> {
        self.upserter().post_ex(doc)
    }
}

impl<S: DocumentStore> UpsertExt for S {}
