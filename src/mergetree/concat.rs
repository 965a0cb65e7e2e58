//! Lazy concatenation of record sources.

use std::collections::VecDeque;

use crate::data::KeyValue;
use crate::error::Result;
use crate::reader::{ReaderSupplier, RecordReader};

/// Chains record sources, opening each one only when the previous is exhausted.
///
/// The exhausted reader is dropped before the next supplier runs, so at most
/// one source is open at a time. Output order equals supplier order. The first
/// error ends the sequence.
pub struct ConcatRecordReader {
    suppliers: VecDeque<ReaderSupplier>,
    current: Option<RecordReader>,
    failed: bool,
}

impl ConcatRecordReader {
    /// Creates a concatenation of `suppliers`.
    pub fn new(suppliers: Vec<ReaderSupplier>) -> Self {
        Self { suppliers: suppliers.into(), current: None, failed: false }
    }

    /// Boxes a concatenation of `suppliers`.
    pub fn create(suppliers: Vec<ReaderSupplier>) -> RecordReader {
        Box::new(Self::new(suppliers))
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.suppliers.len()
    }
}

impl Iterator for ConcatRecordReader {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(Ok(kv)) => return Some(Ok(kv)),
                    Some(Err(e)) => {
                        self.failed = true;
                        self.current = None;
                        self.suppliers.clear();
                        return Some(Err(e));
                    }
                    None => {
                        // release before opening the next source
                        self.current = None;
                    }
                }
            }

            let supplier = self.suppliers.pop_front()?;
            match supplier() {
                Ok(reader) => self.current = Some(reader),
                Err(e) => {
                    self.failed = true;
                    self.suppliers.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::error::Error;
    use crate::reader::from_records;
    use crate::row;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts live readers; decremented on drop.
    struct Tracked {
        inner: RecordReader,
        open: Arc<AtomicUsize>,
    }

    impl Iterator for Tracked {
        type Item = Result<KeyValue>;
        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next()
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn tracked_supplier(
        keys: Vec<i64>,
        open: Arc<AtomicUsize>,
        max_open: Arc<AtomicUsize>,
        opened: Arc<AtomicUsize>,
    ) -> ReaderSupplier {
        Box::new(move || {
            let now = open.fetch_add(1, Ordering::SeqCst) + 1;
            max_open.fetch_max(now, Ordering::SeqCst);
            opened.fetch_add(1, Ordering::SeqCst);
            let records = keys.into_iter().map(|k| KeyValue::insert(row![k], k as u64, row![k])).collect();
            Ok(Box::new(Tracked { inner: from_records(records), open }) as RecordReader)
        })
    }

    #[test]
    fn test_concat_in_order_one_open_at_a_time() {
        let open = Arc::new(AtomicUsize::new(0));
        let max_open = Arc::new(AtomicUsize::new(0));
        let opened = Arc::new(AtomicUsize::new(0));
        let suppliers = vec![
            tracked_supplier(vec![1, 2], open.clone(), max_open.clone(), opened.clone()),
            tracked_supplier(vec![], open.clone(), max_open.clone(), opened.clone()),
            tracked_supplier(vec![3], open.clone(), max_open.clone(), opened.clone()),
        ];
        let reader = ConcatRecordReader::new(suppliers);
        assert_eq!(reader.remaining(), 3);
        assert_eq!(opened.load(Ordering::SeqCst), 0, "suppliers must not run eagerly");

        let keys: Vec<Row> = reader.map(|r| r.unwrap().key().clone()).collect();
        assert_eq!(keys, vec![row![1], row![2], row![3]]);
        assert_eq!(max_open.load(Ordering::SeqCst), 1);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_early_drop_releases_current_source() {
        let open = Arc::new(AtomicUsize::new(0));
        let max_open = Arc::new(AtomicUsize::new(0));
        let opened = Arc::new(AtomicUsize::new(0));
        let mut reader = ConcatRecordReader::new(vec![
            tracked_supplier(vec![1, 2], open.clone(), max_open.clone(), opened.clone()),
            tracked_supplier(vec![3], open.clone(), max_open.clone(), opened.clone()),
        ]);
        assert!(reader.next().is_some());
        assert_eq!(open.load(Ordering::SeqCst), 1);
        drop(reader);
        assert_eq!(open.load(Ordering::SeqCst), 0);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_error_stops_sequence() {
        let suppliers: Vec<ReaderSupplier> = vec![
            Box::new(|| Ok(from_records(vec![KeyValue::insert(row![1], 1, row![1])]))),
            Box::new(|| Err(Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")))),
            Box::new(|| Ok(from_records(vec![KeyValue::insert(row![2], 2, row![2])]))),
        ];
        let results: Vec<Result<KeyValue>> = ConcatRecordReader::new(suppliers).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Io(_))));
    }

    #[test]
    fn test_empty() {
        assert_eq!(ConcatRecordReader::new(vec![]).count(), 0);
    }
}
