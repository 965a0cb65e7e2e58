use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::data::{KeyComparator, KeyValue};
use crate::error::Result;
use crate::reader::RecordReader;

use super::{compare_records, KeyGroupStream, RunCursor};

/// Entry in the merge heap
struct HeapEntry {
    kv: KeyValue,
    run: usize,
    comparator: KeyComparator,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        compare_records(&self.comparator, &other.kv, other.run, &self.kv, self.run)
    }
}

/// Key groups from a binary min-heap holding the head of every run.
pub struct MinHeapStream {
    heap: BinaryHeap<HeapEntry>,
    cursors: Vec<RunCursor>,
    comparator: KeyComparator,
}

impl MinHeapStream {
    /// Reads the first record of every run.
    pub fn new(readers: Vec<RecordReader>, comparator: KeyComparator) -> Result<Self> {
        let mut cursors = Vec::with_capacity(readers.len());
        let mut heap = BinaryHeap::with_capacity(readers.len());
        for (run, reader) in readers.into_iter().enumerate() {
            let mut cursor = RunCursor::open(reader)?;
            if let Some(kv) = cursor.pop()? {
                heap.push(HeapEntry { kv, run, comparator: comparator.clone() });
            }
            cursors.push(cursor);
        }
        Ok(Self { heap, cursors, comparator })
    }

    fn pop(&mut self) -> Result<Option<KeyValue>> {
        let Some(entry) = self.heap.pop() else {
            return Ok(None);
        };
        if let Some(kv) = self.cursors[entry.run].pop()? {
            self.heap.push(HeapEntry { kv, run: entry.run, comparator: self.comparator.clone() });
        }
        Ok(Some(entry.kv))
    }
}

impl KeyGroupStream for MinHeapStream {
    fn next_group(&mut self, group: &mut Vec<KeyValue>) -> Result<bool> {
        let Some(first) = self.pop()? else {
            return Ok(false);
        };
        group.push(first);
        while let Some(top) = self.heap.peek() {
            if self.comparator.compare(top.kv.key(), group[0].key()) != Ordering::Equal {
                break;
            }
            if let Some(kv) = self.pop()? {
                group.push(kv);
            }
        }
        Ok(true)
    }
}
