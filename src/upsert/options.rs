use serde::{Deserialize, Serialize};

use crate::store::PutOptions;

/// Default number of write attempts per upsert call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Options for a single upsert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertOptions {
    /// Total write attempts, the first one included. Zero behaves as one.
    pub max_attempts: u32,
    /// Forwarded to every store write.
    pub put: PutOptions,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            put: PutOptions::default(),
        }
    }
}

impl UpsertOptions {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_put_options(mut self, put: PutOptions) -> Self {
        self.put = put;
        self
    }

    pub(crate) fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
