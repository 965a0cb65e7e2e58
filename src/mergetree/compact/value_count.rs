//! Row-count merge for tables without a primary key.

use crate::data::{Datum, KeyValue, Row, RowKind};
use crate::error::{Error, Result};

/// Sums the BIGINT count stored in value column 0.
///
/// The whole row is the key. Retractions subtract their count; a total of
/// zero means the row no longer exists.
#[derive(Debug, Clone, Default)]
pub struct ValueCountMergeFunction {
    latest: Option<KeyValue>,
    total: i64,
}

impl ValueCountMergeFunction {
    /// Creates an empty merge function.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.latest = None;
        self.total = 0;
    }

    pub(crate) fn add(&mut self, kv: KeyValue) -> Result<()> {
        let count = count_of(&kv)?;
        self.total = if kv.kind().is_add() {
            self.total.wrapping_add(count)
        } else {
            self.total.wrapping_sub(count)
        };
        self.latest = Some(kv);
        Ok(())
    }

    pub(crate) fn result(&mut self) -> Option<KeyValue> {
        let latest = self.latest.take()?;
        if self.total == 0 {
            return None;
        }
        let (key, seq, _, _) = latest.into_parts();
        Some(KeyValue::new(key, seq, RowKind::Insert, Row::new(vec![Datum::Int(self.total)])))
    }
}

fn count_of(kv: &KeyValue) -> Result<i64> {
    kv.value().get(0).and_then(Datum::as_int).ok_or_else(|| {
        Error::corruption(format!(
            "value-count record for key {} has no BIGINT count: {}",
            kv.key(),
            kv.value()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_sums_counts() {
        let mut f = ValueCountMergeFunction::new();
        f.add(KeyValue::insert(row![1, "a"], 1, row![2])).unwrap();
        f.add(KeyValue::insert(row![1, "a"], 2, row![3])).unwrap();
        f.add(KeyValue::delete(row![1, "a"], 3, row![1])).unwrap();
        let out = f.result().unwrap();
        assert_eq!(out.value(), &row![4]);
        assert_eq!(out.sequence_number(), 3);
        assert_eq!(out.kind(), RowKind::Insert);
    }

    #[test]
    fn test_zero_total_emits_nothing() {
        let mut f = ValueCountMergeFunction::new();
        f.add(KeyValue::insert(row![1], 1, row![2])).unwrap();
        f.add(KeyValue::delete(row![1], 2, row![2])).unwrap();
        assert!(f.result().is_none());
    }

    #[test]
    fn test_negative_total_is_kept() {
        let mut f = ValueCountMergeFunction::new();
        f.add(KeyValue::delete(row![1], 1, row![1])).unwrap();
        assert_eq!(f.result().unwrap().value(), &row![-1]);
    }

    #[test]
    fn test_non_integer_count() {
        let mut f = ValueCountMergeFunction::new();
        assert!(matches!(
            f.add(KeyValue::insert(row![1], 1, row!["x"])),
            Err(Error::Corruption(_))
        ));
    }
}
