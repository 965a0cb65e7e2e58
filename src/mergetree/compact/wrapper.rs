use crate::data::KeyValue;
use crate::error::Result;

use super::MergeFunction;

/// Drives a [`MergeFunction`] one key group at a time.
///
/// A group of a single record is returned as-is without touching the merge
/// function, so a lone retraction survives to the delete-drop stage.
#[derive(Debug, Clone)]
pub struct ReducerMergeFunctionWrapper {
    function: MergeFunction,
    first: Option<KeyValue>,
    merging: bool,
}

impl ReducerMergeFunctionWrapper {
    /// Wraps `function`.
    pub fn new(function: MergeFunction) -> Self {
        Self { function, first: None, merging: false }
    }

    /// Starts a new key group.
    pub fn reset(&mut self) {
        self.first = None;
        self.merging = false;
    }

    /// Adds the next record of the current group.
    pub fn add(&mut self, kv: KeyValue) -> Result<()> {
        if self.merging {
            return self.function.add(kv);
        }
        match self.first.take() {
            None => self.first = Some(kv),
            Some(first) => {
                self.merging = true;
                self.function.reset();
                self.function.add(first)?;
                self.function.add(kv)?;
            }
        }
        Ok(())
    }

    /// Result of the current group.
    pub fn get_result(&mut self) -> Result<Option<KeyValue>> {
        if self.merging {
            self.function.result()
        } else {
            Ok(self.first.take())
        }
    }
}
