use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a revision token is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed revision {token:?}: {reason}")]
pub struct RevisionParseError {
    pub token: String,
    pub reason: &'static str,
}

/// Store-assigned revision token.
///
/// The token is opaque to the upsert engine. Stores that follow the
/// `<generation>-<hash>` convention (generation starting at 1 and growing by
/// one per accepted write) can read it back through [`generation`](Self::generation)
/// and [`hash`](Self::hash); for any other token those return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// A `<generation>-<hash>` revision.
    pub fn new(generation: u64, hash: impl AsRef<str>) -> Self {
        Self(format!("{}-{}", generation, hash.as_ref()))
    }

    /// Accept any non-empty token.
    pub fn parse(token: &str) -> Result<Self, RevisionParseError> {
        if token.is_empty() {
            return Err(RevisionParseError {
                token: String::new(),
                reason: "empty token",
            });
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Option<(u64, &str)> {
        let (generation, hash) = self.0.split_once('-')?;
        let generation: u64 = generation.parse().ok()?;
        if generation == 0 || hash.is_empty() {
            return None;
        }
        Some((generation, hash))
    }

    /// Whether the token has the `<generation>-<hash>` shape.
    pub fn is_generational(&self) -> bool {
        self.parts().is_some()
    }

    pub fn generation(&self) -> Option<u64> {
        self.parts().map(|(generation, _)| generation)
    }

    pub fn hash(&self) -> Option<&str> {
        self.parts().map(|(_, hash)| hash)
    }

    /// The revision that follows this one, carrying a fresh hash.
    /// `None` for opaque tokens and when the generation cannot grow.
    pub fn next(&self, hash: impl AsRef<str>) -> Option<Self> {
        let generation = self.generation()?.checked_add(1)?;
        Some(Self::new(generation, hash))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Revision {
    type Err = RevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Revision {
    type Error = RevisionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}
