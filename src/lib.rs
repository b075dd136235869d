mod document;
mod store;
mod upsert;

pub use document::{Document, Revision, RevisionParseError, ID_FIELD, REVISIONS_FIELD, REV_FIELD};
pub use store::{DocumentStore, InMemoryDocumentStore, PutOptions, StoreError, WriteOutcome};
pub use upsert::{
    upsert_with, UpsertError, UpsertExt, UpsertOptions, Upserter, DEFAULT_MAX_ATTEMPTS,
};
