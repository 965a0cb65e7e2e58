use std::cmp::Ordering;
use std::vec::IntoIter;

use crate::data::{KeyComparator, KeyValue};
use crate::error::Result;
use crate::reader::RecordReader;

use super::{compare_records, KeyGroupStream};

/// Key groups from an in-memory sort of the whole section.
///
/// Every run is drained on the first call; the section must fit in memory.
pub struct BufferedStream {
    readers: Option<Vec<RecordReader>>,
    sorted: std::iter::Peekable<IntoIter<(KeyValue, usize)>>,
    comparator: KeyComparator,
}

impl BufferedStream {
    /// Wraps the runs without reading them.
    pub fn new(readers: Vec<RecordReader>, comparator: KeyComparator) -> Self {
        Self { readers: Some(readers), sorted: Vec::new().into_iter().peekable(), comparator }
    }

    fn load(&mut self, readers: Vec<RecordReader>) -> Result<()> {
        let mut records = Vec::new();
        for (run, reader) in readers.into_iter().enumerate() {
            for kv in reader {
                records.push((kv?, run));
            }
        }
        let comparator = &self.comparator;
        records.sort_by(|(a, ra), (b, rb)| compare_records(comparator, a, *ra, b, *rb));
        self.sorted = records.into_iter().peekable();
        Ok(())
    }
}

impl KeyGroupStream for BufferedStream {
    fn next_group(&mut self, group: &mut Vec<KeyValue>) -> Result<bool> {
        if let Some(readers) = self.readers.take() {
            self.load(readers)?;
        }
        let Some((first, _)) = self.sorted.next() else {
            return Ok(false);
        };
        group.push(first);
        while let Some((kv, _)) = self.sorted.peek() {
            if self.comparator.compare(kv.key(), group[0].key()) != Ordering::Equal {
                break;
            }
            if let Some((kv, _)) = self.sorted.next() {
                group.push(kv);
            }
        }
        Ok(true)
    }
}
