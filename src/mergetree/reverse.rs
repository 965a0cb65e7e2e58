//! Reversed incremental output.

use std::vec::IntoIter;

use crate::data::KeyValue;
use crate::error::Result;
use crate::reader::RecordReader;

/// Emits the records of an incremental read newest-first.
///
/// The inner reader is drained on the first pull; every record is held in
/// memory, so memory use grows with the size of the split. An error from the
/// inner reader is returned at once.
pub struct ReverseReader {
    inner: Option<RecordReader>,
    buffered: IntoIter<KeyValue>,
}

impl ReverseReader {
    /// Wraps `inner`.
    pub fn new(inner: RecordReader) -> Self {
        Self { inner: Some(inner), buffered: Vec::new().into_iter() }
    }

    fn fill(&mut self, inner: RecordReader) -> Result<()> {
        let mut records = inner.collect::<Result<Vec<KeyValue>>>()?;
        records.reverse();
        self.buffered = records.into_iter();
        Ok(())
    }
}

impl Iterator for ReverseReader {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(inner) = self.inner.take() {
            if let Err(e) = self.fill(inner) {
                return Some(Err(e));
            }
        }
        self.buffered.next().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reader::from_records;
    use crate::row;

    #[test]
    fn test_reverses_order_and_keeps_kinds() {
        let reader = from_records(vec![
            KeyValue::insert(row![1], 1, row![10]),
            KeyValue::delete(row![1], 2, row![10]),
            KeyValue::insert(row![2], 3, row![20]),
        ]);
        let out: Vec<KeyValue> = ReverseReader::new(reader).map(|r| r.unwrap()).collect();
        let seqs: Vec<u64> = out.iter().map(|kv| kv.sequence_number()).collect();
        assert_eq!(seqs, vec![3, 2, 1]);
        assert!(out[1].kind().is_retract());
    }

    #[test]
    fn test_error_is_surfaced_once() {
        let inner: RecordReader = Box::new(
            vec![Ok(KeyValue::insert(row![1], 1, row![1])), Err(Error::corruption("bad"))].into_iter(),
        );
        let results: Vec<Result<KeyValue>> = ReverseReader::new(inner).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::Corruption(_))));
    }
}
