//! Last-verdict storage.

use parking_lot::RwLock;

/// Holds the most recent accepted verdict JSON.
///
/// Replace-on-write: each accepted check overwrites the previous value.
pub trait VerdictStore: Send + Sync {
    /// Overwrite the stored verdict.
    fn replace(&self, verdict_json: String);

    /// The stored verdict, if any check has been accepted.
    fn last(&self) -> Option<String>;
}

/// Process-local store. Last write wins.
#[derive(Debug, Default)]
pub struct InMemoryVerdictStore {
    last: RwLock<Option<String>>,
}

impl InMemoryVerdictStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerdictStore for InMemoryVerdictStore {
    fn replace(&self, verdict_json: String) {
        *self.last.write() = Some(verdict_json);
    }

    fn last(&self) -> Option<String> {
        self.last.read().clone()
    }
}
