//! Keep-first merge.

use crate::data::KeyValue;

/// Keeps the first added record of a key group, the one with the lowest
/// sequence number. Retractions never reach the accumulator.
#[derive(Debug, Clone, Default)]
pub struct FirstRowMergeFunction {
    first: Option<KeyValue>,
}

impl FirstRowMergeFunction {
    /// Creates an empty merge function.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.first = None;
    }

    pub(crate) fn add(&mut self, kv: KeyValue) {
        if self.first.is_none() && kv.kind().is_add() {
            self.first = Some(kv);
        }
    }

    pub(crate) fn result(&mut self) -> Option<KeyValue> {
        self.first.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_keeps_first_add() {
        let mut f = FirstRowMergeFunction::new();
        f.add(KeyValue::delete(row![1], 1, row![0]));
        f.add(KeyValue::insert(row![1], 2, row![20]));
        f.add(KeyValue::insert(row![1], 3, row![30]));
        let out = f.result().unwrap();
        assert_eq!(out.sequence_number(), 2);
        assert_eq!(out.value(), &row![20]);
        assert!(f.result().is_none());
    }

    #[test]
    fn test_only_retractions() {
        let mut f = FirstRowMergeFunction::new();
        f.add(KeyValue::delete(row![1], 1, row![0]));
        assert!(f.result().is_none());
    }
}
