//! Upserts - read, diff, conditional write, retry on conflict.
//!
//! Every operation here reduces to one loop: read the current document (an
//! empty one if nothing is stored), hand it to a diff function, and write the
//! result conditionally on the revision that was read. When another writer
//! got there first the loop re-reads and re-runs the diff, so a successful
//! write is never based on stale data.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_upsert::{InMemoryDocumentStore, UpsertExt};
//!
//! let store = InMemoryDocumentStore::new();
//! store.upsert_ex("counter", |mut doc| {
//!     let hits = doc.get("hits").and_then(|v| v.as_u64()).unwrap_or(0);
//!     doc.insert("hits", hits + 1);
//!     Ok(Some(doc))
//! })?;
//!
//! // Retry at most twice on conflicts
//! store.upserter().max_attempts(2).post_ex(doc)?;
//! ```

mod engine;
mod error;
mod options;
mod upserter;

pub use engine::upsert_with;
pub use error::UpsertError;
pub use options::{UpsertOptions, DEFAULT_MAX_ATTEMPTS};
pub use upserter::{UpsertExt, Upserter};
