//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::trace;
use uuid::Uuid;

use super::{DocumentStore, PutOptions, StoreError, WriteOutcome};
use crate::document::{Document, Revision, ID_FIELD, REVISIONS_FIELD, REV_FIELD};

/// Internal stored representation of a document. Reserved fields are kept
/// out of `bytes` and re-attached on read.
struct StoredDocument {
    bytes: Vec<u8>,
    rev: Revision,
}

/// In-memory document store backed by a HashMap.
///
/// Revisions are `<generation>-<uuid>`, starting at generation 1.
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    storage: Arc<RwLock<HashMap<String, StoredDocument>>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        Ok(storage.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn fresh_hash() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn body_bytes(doc: &Document) -> Result<Vec<u8>, StoreError> {
        let body: Map<String, Value> = doc
            .as_map()
            .iter()
            .filter(|(field, _)| !matches!(field.as_str(), ID_FIELD | REV_FIELD | REVISIONS_FIELD))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        Ok(serde_json::to_vec(&body)?)
    }

    fn supplied_revision(doc: &Document) -> Result<Option<Revision>, StoreError> {
        match doc.get(REV_FIELD) {
            None => Ok(None),
            Some(Value::String(token)) => {
                let rev =
                    Revision::parse(token).map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
                if !rev.is_generational() {
                    return Err(StoreError::InvalidArgument(format!(
                        "revision {:?} is not of the form <generation>-<hash>",
                        token
                    )));
                }
                Ok(Some(rev))
            }
            Some(other) => Err(StoreError::InvalidArgument(format!(
                "_rev must be a string, got {}",
                other
            ))),
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let stored = storage
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut doc: Document = serde_json::from_slice(&stored.bytes)?;
        doc.set_id(id);
        doc.set_revision(&stored.rev);
        Ok(doc)
    }

    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        let id = doc
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::InvalidArgument("missing _id".into()))?
            .to_string();
        let bytes = Self::body_bytes(doc)?;

        if !options.new_edits {
            let rev = match Self::supplied_revision(doc)? {
                Some(rev) => rev,
                None => doc.revision_from_history().ok_or_else(|| {
                    StoreError::InvalidArgument(
                        "new_edits=false requires _rev or _revisions".into(),
                    )
                })?,
            };

            let mut storage = self
                .storage
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

            // The higher (generation, hash) stays the winning revision.
            let supersedes = storage.get(&id).map_or(true, |current| {
                (rev.generation(), rev.hash()) > (current.rev.generation(), current.rev.hash())
            });
            if supersedes {
                storage.insert(
                    id.clone(),
                    StoredDocument {
                        bytes,
                        rev: rev.clone(),
                    },
                );
            }
            trace!(id = %id, rev = %rev, supersedes, "replicated document write");

            return Ok(WriteOutcome {
                ok: true,
                id,
                rev: Some(rev),
            });
        }

        let expected = Self::supplied_revision(doc)?;
        if expected.as_ref().and_then(Revision::generation) == Some(u64::MAX) {
            return Err(StoreError::InvalidArgument(
                "revision generation overflow".into(),
            ));
        }

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let actual = storage.get(&id).map(|stored| stored.rev.clone());
        if expected != actual {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual,
            });
        }

        let new_rev = match actual {
            Some(current) => current.next(Self::fresh_hash()).ok_or_else(|| {
                StoreError::InvalidArgument("revision generation overflow".into())
            })?,
            None => Revision::new(1, Self::fresh_hash()),
        };
        storage.insert(
            id.clone(),
            StoredDocument {
                bytes,
                rev: new_rev.clone(),
            },
        );
        trace!(id = %id, rev = %new_rev, "document written");

        Ok(WriteOutcome {
            ok: true,
            id,
            rev: Some(new_rev),
        })
    }
}
