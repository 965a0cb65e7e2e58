//! Sort-merge of overlapping sorted runs.
//!
//! Each run yields records in key order. A [`KeyGroupStream`] interleaves the
//! runs and hands out all records of the smallest remaining key, ordered by
//! `(sequence_number, run index)`. [`SortMergeReader`] reduces every group
//! with the configured merge function.
//!
//! The three engines produce the same groups:
//!
//! - [`MinHeapStream`]: binary heap over run heads
//! - [`LoserTreeStream`]: tournament tree, one comparison per level per record
//! - [`BufferedStream`]: drains every run and sorts in memory

mod buffered;
mod loser_tree;
mod min_heap;

pub use buffered::BufferedStream;
pub use loser_tree::LoserTreeStream;
pub use min_heap::MinHeapStream;

use std::cmp::Ordering;

use crate::data::{KeyComparator, KeyValue};
use crate::error::Result;
use crate::mergetree::compact::{MergeFunction, ReducerMergeFunctionWrapper};
use crate::options::SortEngine;
use crate::reader::RecordReader;

/// Yields the records of one key at a time.
pub trait KeyGroupStream: Send {
    /// Appends the next key group to `group`; `false` once every run is drained.
    fn next_group(&mut self, group: &mut Vec<KeyValue>) -> Result<bool>;
}

/// The next unread record of one run.
pub(crate) struct RunCursor {
    reader: RecordReader,
    head: Option<KeyValue>,
}

impl RunCursor {
    pub(crate) fn open(mut reader: RecordReader) -> Result<Self> {
        let head = reader.next().transpose()?;
        Ok(Self { reader, head })
    }

    pub(crate) fn head(&self) -> Option<&KeyValue> {
        self.head.as_ref()
    }

    /// Takes the head and reads the one after it.
    pub(crate) fn pop(&mut self) -> Result<Option<KeyValue>> {
        let next = self.reader.next().transpose()?;
        Ok(std::mem::replace(&mut self.head, next))
    }
}

/// Total order of records inside a merge: key, then sequence number, then run.
pub(crate) fn compare_records(
    comparator: &KeyComparator,
    a: &KeyValue,
    a_run: usize,
    b: &KeyValue,
    b_run: usize,
) -> Ordering {
    comparator
        .compare(a.key(), b.key())
        .then_with(|| a.sequence_number().cmp(&b.sequence_number()))
        .then_with(|| a_run.cmp(&b_run))
}

/// Builds the key-group stream for `engine`.
pub fn create_stream(
    engine: SortEngine,
    readers: Vec<RecordReader>,
    comparator: KeyComparator,
) -> Result<Box<dyn KeyGroupStream>> {
    Ok(match engine {
        SortEngine::MinHeap => Box::new(MinHeapStream::new(readers, comparator)?),
        SortEngine::LoserTree => Box::new(LoserTreeStream::new(readers, comparator)?),
        SortEngine::Buffered => Box::new(BufferedStream::new(readers, comparator)),
    })
}

/// Merges overlapping runs into one record per key.
///
/// Groups whose merge result is empty are skipped. The reader stops after
/// the first error.
pub struct SortMergeReader {
    stream: Box<dyn KeyGroupStream>,
    wrapper: ReducerMergeFunctionWrapper,
    group: Vec<KeyValue>,
    failed: bool,
}

impl SortMergeReader {
    /// Opens every run and positions it on its first record.
    pub fn new(
        readers: Vec<RecordReader>,
        comparator: KeyComparator,
        function: MergeFunction,
        engine: SortEngine,
    ) -> Result<Self> {
        log::trace!(
            "sort-merging {} runs with {} using {}",
            readers.len(),
            engine,
            function.name()
        );
        Ok(Self {
            stream: create_stream(engine, readers, comparator)?,
            wrapper: ReducerMergeFunctionWrapper::new(function),
            group: Vec::new(),
            failed: false,
        })
    }

    fn merge_next(&mut self) -> Result<Option<KeyValue>> {
        loop {
            self.group.clear();
            if !self.stream.next_group(&mut self.group)? {
                return Ok(None);
            }
            self.wrapper.reset();
            for kv in self.group.drain(..) {
                self.wrapper.add(kv)?;
            }
            if let Some(kv) = self.wrapper.get_result()? {
                return Ok(Some(kv));
            }
        }
    }
}

impl Iterator for SortMergeReader {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.merge_next() {
            Ok(kv) => kv.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mergetree::compact::DeduplicateMergeFunction;
    use crate::reader::from_records;
    use crate::row;

    const ENGINES: [SortEngine; 3] = [SortEngine::MinHeap, SortEngine::LoserTree, SortEngine::Buffered];

    fn runs() -> Vec<Vec<KeyValue>> {
        vec![
            vec![
                KeyValue::insert(row![1], 1, row![1, "a"]),
                KeyValue::insert(row![3], 2, row![3, "a"]),
                KeyValue::insert(row![5], 3, row![5, "a"]),
            ],
            vec![
                KeyValue::insert(row![1], 4, row![1, "b"]),
                KeyValue::delete(row![3], 5, row![3, "b"]),
                KeyValue::insert(row![4], 6, row![4, "b"]),
            ],
            vec![KeyValue::insert(row![2], 7, row![2, "c"]), KeyValue::insert(row![5], 8, row![5, "c"])],
        ]
    }

    fn groups(engine: SortEngine, runs: Vec<Vec<KeyValue>>) -> Vec<Vec<(i64, u64)>> {
        let readers = runs.into_iter().map(from_records).collect();
        let mut stream = create_stream(engine, readers, KeyComparator::natural()).unwrap();
        let mut out = Vec::new();
        let mut group = Vec::new();
        while stream.next_group(&mut group).unwrap() {
            out.push(
                group
                    .drain(..)
                    .map(|kv| (kv.key().get(0).and_then(|d| d.as_int()).unwrap(), kv.sequence_number()))
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn test_engines_produce_identical_groups() {
        let expected = vec![
            vec![(1, 1), (1, 4)],
            vec![(2, 7)],
            vec![(3, 2), (3, 5)],
            vec![(4, 6)],
            vec![(5, 3), (5, 8)],
        ];
        for engine in ENGINES {
            assert_eq!(groups(engine, runs()), expected, "engine {}", engine);
        }
    }

    #[test]
    fn test_group_ordered_by_sequence_across_runs() {
        let runs = vec![
            vec![KeyValue::insert(row![1], 9, row![1])],
            vec![KeyValue::insert(row![1], 2, row![1])],
            vec![KeyValue::insert(row![1], 5, row![1])],
        ];
        for engine in ENGINES {
            assert_eq!(groups(engine, runs.clone()), vec![vec![(1, 2), (1, 5), (1, 9)]]);
        }
    }

    #[test]
    fn test_merge_reader_deduplicates() {
        for engine in ENGINES {
            let readers = runs().into_iter().map(from_records).collect();
            let reader = SortMergeReader::new(
                readers,
                KeyComparator::natural(),
                MergeFunction::Deduplicate(DeduplicateMergeFunction::new(false)),
                engine,
            )
            .unwrap();
            let out: Vec<KeyValue> = reader.map(|r| r.unwrap()).collect();
            let values: Vec<_> = out.iter().map(|kv| kv.value().clone()).collect();
            assert_eq!(
                values,
                vec![row![1, "b"], row![2, "c"], row![4, "b"], row![5, "c"]],
                "engine {}",
                engine
            );
        }
    }

    #[test]
    fn test_empty_and_single_run() {
        for engine in ENGINES {
            assert!(groups(engine, vec![]).is_empty());
            assert!(groups(engine, vec![vec![], vec![]]).is_empty());
            assert_eq!(
                groups(engine, vec![vec![KeyValue::insert(row![1], 1, row![1])]]),
                vec![vec![(1, 1)]]
            );
        }
    }

    #[test]
    fn test_error_stops_reader() {
        for engine in ENGINES {
            let failing: RecordReader = Box::new(
                vec![Ok(KeyValue::insert(row![1], 1, row![1])), Err(Error::corruption("broken run"))]
                    .into_iter(),
            );
            let readers = vec![failing, from_records(vec![KeyValue::insert(row![2], 2, row![2])])];
            let results: Vec<Result<KeyValue>> = match SortMergeReader::new(
                readers,
                KeyComparator::natural(),
                MergeFunction::Deduplicate(DeduplicateMergeFunction::new(false)),
                engine,
            ) {
                Ok(reader) => reader.collect(),
                Err(e) => vec![Err(e)],
            };
            assert!(results.iter().any(|r| matches!(r, Err(Error::Corruption(_)))));
            assert!(matches!(results.last(), Some(Err(_))));
        }
    }
}
