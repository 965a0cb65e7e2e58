//! Drops retractions from merged output.

use crate::data::KeyValue;
use crate::error::Result;
use crate::reader::RecordReader;

/// Skips every record whose kind retracts a row.
///
/// After a merge, a surviving retraction means the key no longer exists.
pub struct DropDeleteReader {
    inner: RecordReader,
}

impl DropDeleteReader {
    /// Wraps a merged reader.
    pub fn new(inner: RecordReader) -> Self {
        Self { inner }
    }
}

impl Iterator for DropDeleteReader {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(kv) if kv.kind().is_retract() => continue,
                other => return Some(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RowKind;
    use crate::reader::from_records;
    use crate::row;

    #[test]
    fn test_drops_every_retract_kind() {
        let reader = from_records(vec![
            KeyValue::insert(row![1], 1, row![1]),
            KeyValue::delete(row![2], 2, row![2]),
            KeyValue::new(row![3], 3, RowKind::UpdateBefore, row![3]),
            KeyValue::new(row![4], 4, RowKind::UpdateAfter, row![4]),
        ]);
        let out: Vec<KeyValue> = DropDeleteReader::new(reader).map(|r| r.unwrap()).collect();
        let keys: Vec<_> = out.iter().map(|kv| kv.key().clone()).collect();
        assert_eq!(keys, vec![row![1], row![4]]);
    }

    #[test]
    fn test_all_deleted() {
        let reader = from_records(vec![KeyValue::delete(row![1], 1, row![1])]);
        assert_eq!(DropDeleteReader::new(reader).count(), 0);
    }
}
