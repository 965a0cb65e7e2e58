//! Last-write-wins merge.

use crate::data::KeyValue;

/// Keeps the record with the highest sequence number.
///
/// Emits nothing when that record retracts the key.
#[derive(Debug, Clone, Default)]
pub struct DeduplicateMergeFunction {
    latest: Option<KeyValue>,
    ignore_delete: bool,
}

impl DeduplicateMergeFunction {
    /// Creates the merge function; with `ignore_delete`, retractions are skipped.
    pub fn new(ignore_delete: bool) -> Self {
        Self { latest: None, ignore_delete }
    }

    pub(crate) fn reset(&mut self) {
        self.latest = None;
    }

    pub(crate) fn add(&mut self, kv: KeyValue) {
        if self.ignore_delete && kv.kind().is_retract() {
            return;
        }
        self.latest = Some(kv);
    }

    pub(crate) fn result(&mut self) -> Option<KeyValue> {
        self.latest.take().filter(|kv| kv.kind().is_add())
    }
}
