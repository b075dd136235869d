//! Store wrappers used to force conflicts and failures deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::RwLock;

use docstore_upsert::{
    Document, DocumentStore, InMemoryDocumentStore, PutOptions, Revision, StoreError,
    WriteOutcome, ID_FIELD, REVISIONS_FIELD, REV_FIELD,
};
use serde_json::{Map, Value};

/// Wraps an in-memory store and, right after each of the next `n` reads,
/// lets a competing writer update the same id. The caller's following write
/// is then based on a stale revision and conflicts.
pub struct ContendedStore {
    pub inner: InMemoryDocumentStore,
    interferences: AtomicU32,
    competitor_writes: AtomicU32,
    puts: AtomicUsize,
}

impl ContendedStore {
    pub fn new(inner: InMemoryDocumentStore, interferences: u32) -> Self {
        Self {
            inner,
            interferences: AtomicU32::new(interferences),
            competitor_writes: AtomicU32::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    /// Writes issued through this wrapper, not counting competitor writes.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn competitor_writes(&self) -> u32 {
        self.competitor_writes.load(Ordering::SeqCst)
    }

    fn take_interference(&self) -> bool {
        self.interferences
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn compete(&self, id: &str, read: &Result<Document, StoreError>) {
        let n = self.competitor_writes.fetch_add(1, Ordering::SeqCst) + 1;
        let mut doc = match read {
            Ok(doc) => doc.clone(),
            Err(_) => Document::with_id(id),
        };
        doc.insert("competitor", n);
        self.inner
            .put(&doc, &PutOptions::default())
            .expect("competitor write should succeed");
    }
}

impl DocumentStore for ContendedStore {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        let read = self.inner.get(id);
        if self.take_interference() {
            self.compete(id, &read);
        }
        read
    }

    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(doc, options)
    }
}

/// A store whose reads or writes fail with a fixed error.
pub struct FailingStore {
    pub inner: InMemoryDocumentStore,
    pub fail_get: Option<StoreError>,
    pub fail_put: Option<StoreError>,
    puts: AtomicUsize,
}

impl FailingStore {
    pub fn on_get(err: StoreError) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            fail_get: Some(err),
            fail_put: None,
            puts: AtomicUsize::new(0),
        }
    }

    pub fn on_put(err: StoreError) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            fail_get: None,
            fail_put: Some(err),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl DocumentStore for FailingStore {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        match &self.fail_get {
            Some(err) => Err(err.clone()),
            None => self.inner.get(id),
        }
    }

    fn put(&self, doc: &Document, options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        match &self.fail_put {
            Some(err) => Err(err.clone()),
            None => self.inner.put(doc, options),
        }
    }
}

/// A store whose revisions are bare tokens (`r1`, `r2`, ...) with no
/// generation prefix. Writes must carry the current token verbatim.
#[derive(Default)]
pub struct OpaqueRevisionStore {
    docs: RwLock<HashMap<String, (Map<String, Value>, String)>>,
    issued: AtomicU32,
    puts: AtomicUsize,
}

impl OpaqueRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Store `body` under `id` outside of any upsert, returning the new token.
    pub fn seed(&self, id: &str, body: Value) -> String {
        let mut doc = doc(body);
        doc.set_id(id);
        if let Some(rev) = self.get(id).ok().and_then(|c| c.get(REV_FIELD).cloned()) {
            doc.insert(REV_FIELD, rev);
        }
        let outcome = self
            .put(&doc, &PutOptions::default())
            .expect("seed write should succeed");
        outcome.rev.expect("seed write issues a revision").to_string()
    }

    fn next_token(&self) -> String {
        format!("r{}", self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl DocumentStore for OpaqueRevisionStore {
    fn get(&self, id: &str) -> Result<Document, StoreError> {
        let docs = self.docs.read().expect("lock poisoned");
        let (body, token) = docs
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut doc = Document::from(body.clone());
        doc.set_id(id);
        doc.insert(REV_FIELD, token.clone());
        Ok(doc)
    }

    fn put(&self, doc: &Document, _options: &PutOptions) -> Result<WriteOutcome, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let id = doc
            .id()
            .ok_or_else(|| StoreError::InvalidArgument("missing _id".into()))?
            .to_string();
        let supplied = doc.get(REV_FIELD).and_then(Value::as_str).map(str::to_string);

        let mut docs = self.docs.write().expect("lock poisoned");
        let current = docs.get(&id).map(|(_, token)| token.clone());
        if supplied != current {
            return Err(StoreError::Conflict {
                id,
                expected: doc.revision(),
                actual: current.as_deref().and_then(|t| Revision::parse(t).ok()),
            });
        }

        let body: Map<String, Value> = doc
            .as_map()
            .iter()
            .filter(|(field, _)| !matches!(field.as_str(), ID_FIELD | REV_FIELD | REVISIONS_FIELD))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        let token = self.next_token();
        docs.insert(id.clone(), (body, token.clone()));

        Ok(WriteOutcome {
            ok: true,
            id,
            rev: Revision::parse(&token).ok(),
        })
    }
}

/// Build a document from a `json!` literal.
pub fn doc(value: Value) -> Document {
    Document::from_value(value).expect("document literal must be an object")
}

/// The stored document with `_rev` removed, as a JSON value.
pub fn without_rev(mut doc: Document) -> Value {
    doc.remove_revision();
    doc.into_value()
}
