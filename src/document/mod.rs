//! Documents - JSON objects with reserved identity and revision fields.
//!
//! A document fetched from a store always carries `_id` and `_rev`. A document
//! synthesized because nothing was stored under an id carries neither.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_upsert::Document;
//! use serde_json::json;
//!
//! let mut doc = Document::from_value(json!({"_id": "user-1", "name": "Ada"}))?;
//! doc.insert("visits", 1);
//! assert_eq!(doc.id(), Some("user-1"));
//! ```

mod revision;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

pub use revision::{Revision, RevisionParseError};

/// Reserved field holding the caller-assigned identity.
pub const ID_FIELD: &str = "_id";
/// Reserved field holding the store-assigned revision token.
pub const REV_FIELD: &str = "_rev";
/// Store-internal revision history hint (`{"start": n, "ids": [...]}`).
pub const REVISIONS_FIELD: &str = "_revisions";

/// A JSON object stored under an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// An empty document with no identity and no revision.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// An empty document carrying only `_id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.set_id(id);
        doc
    }

    /// Build a document from a JSON value. Fails unless the value is an object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value).map(Self)
    }

    /// Serialize any struct into a document.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Deserialize the document into a typed struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0))
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// Whether a `_rev` field is present at all, well-formed or not.
    pub fn has_revision(&self) -> bool {
        self.0.contains_key(REV_FIELD)
    }

    /// The `_rev` field as an opaque token. A missing, empty or non-string
    /// `_rev` reads as `None`.
    pub fn revision(&self) -> Option<Revision> {
        self.0
            .get(REV_FIELD)
            .and_then(Value::as_str)
            .and_then(|token| Revision::parse(token).ok())
    }

    pub fn set_revision(&mut self, rev: &Revision) {
        self.0
            .insert(REV_FIELD.to_string(), Value::String(rev.to_string()));
    }

    pub fn remove_revision(&mut self) -> Option<Value> {
        self.0.remove(REV_FIELD)
    }

    /// Remove the store-internal `_revisions` history hint.
    pub fn remove_revision_history(&mut self) -> Option<Value> {
        self.0.remove(REVISIONS_FIELD)
    }

    /// The revision described by a `_revisions` hint: `<start>-<ids[0]>`.
    pub fn revision_from_history(&self) -> Option<Revision> {
        let history = self.0.get(REVISIONS_FIELD)?.as_object()?;
        let start = history.get("start")?.as_u64()?;
        let latest = history.get("ids")?.as_array()?.first()?.as_str()?;
        Some(Revision::new(start, latest)).filter(Revision::is_generational)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}
