//! Interval partitioning of a split's files.
//!
//! Each file's `[min_key, max_key]` is a closed interval. Files are swept in
//! key order and grouped into sections: connected components of the interval
//! overlap graph. Sections are pairwise disjoint and come out in key order.
//!
//! Inside a section, files are packed greedily into the fewest sorted runs:
//! a file is appended to the run whose last file ends first, provided that
//! run ends strictly before the file starts; otherwise it opens a new run.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SortedRun;
use crate::data::{KeyComparator, Row};
use crate::meta::DataFileMeta;

/// Sorted runs whose key ranges form one connected interval group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    runs: Vec<SortedRun>,
}

impl Section {
    /// Creates a section from its runs.
    pub fn new(runs: Vec<SortedRun>) -> Self {
        Self { runs }
    }

    /// The runs of this section.
    pub fn runs(&self) -> &[SortedRun] {
        &self.runs
    }

    /// True when the section holds more than one run and must be merged.
    pub fn is_overlapping(&self) -> bool {
        self.runs.len() > 1
    }

    /// Iterates every file of the section.
    pub fn files(&self) -> impl Iterator<Item = &DataFileMeta> {
        self.runs.iter().flat_map(|r| r.files().iter())
    }

    /// Smallest and largest key of the section.
    pub fn key_range(&self, comparator: &KeyComparator) -> Option<(&Row, &Row)> {
        let mut files = self.files();
        let first = files.next()?;
        let (mut min, mut max) = (&first.min_key, &first.max_key);
        for f in files {
            if comparator.compare(&f.min_key, min).is_lt() {
                min = &f.min_key;
            }
            if comparator.compare(&f.max_key, max).is_gt() {
                max = &f.max_key;
            }
        }
        Some((min, max))
    }
}

/// Groups files into disjoint sections of sorted runs.
pub struct IntervalPartition {
    files: Vec<DataFileMeta>,
    comparator: KeyComparator,
}

impl IntervalPartition {
    /// Sorts `files` by `min_key`, breaking ties by level, then minimum
    /// sequence number, then `max_key`.
    pub fn new(mut files: Vec<DataFileMeta>, comparator: KeyComparator) -> Self {
        files.sort_by(|a, b| {
            comparator
                .compare(&a.min_key, &b.min_key)
                .then_with(|| a.level.cmp(&b.level))
                .then_with(|| a.min_sequence_number.cmp(&b.min_sequence_number))
                .then_with(|| comparator.compare(&a.max_key, &b.max_key))
        });
        Self { files, comparator }
    }

    /// Returns the sections, in key order.
    pub fn partition(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current: Vec<DataFileMeta> = Vec::new();
        let mut bound: Option<&Row> = None;

        for file in &self.files {
            if let Some(b) = bound {
                if self.comparator.compare(&file.min_key, b).is_gt() {
                    // no open interval reaches this file
                    sections.push(self.partition_section(std::mem::take(&mut current)));
                    bound = None;
                }
            }
            current.push(file.clone());
            bound = match bound {
                Some(b) if self.comparator.compare(&file.max_key, b).is_le() => Some(b),
                _ => Some(&file.max_key),
            };
        }
        if !current.is_empty() {
            sections.push(self.partition_section(current));
        }
        sections
    }

    fn partition_section(&self, files: Vec<DataFileMeta>) -> Section {
        let mut runs: Vec<Vec<DataFileMeta>> = Vec::new();
        let mut tails: BinaryHeap<RunTail> = BinaryHeap::new();

        for file in files {
            if let Some(mut top) = tails.peek_mut() {
                if self.comparator.compare(&top.tail, &file.min_key).is_lt() {
                    top.tail = file.max_key.clone();
                    runs[top.run].push(file);
                    continue;
                }
            }
            tails.push(RunTail {
                tail: file.max_key.clone(),
                run: runs.len(),
                comparator: self.comparator.clone(),
            });
            runs.push(vec![file]);
        }

        Section::new(runs.into_iter().map(SortedRun::from_sorted).collect())
    }
}

/// Max key of a run's last file. Ordered so that `BinaryHeap` pops the smallest tail.
struct RunTail {
    tail: Row,
    run: usize,
    comparator: KeyComparator,
}

impl PartialEq for RunTail {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RunTail {}

impl PartialOrd for RunTail {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunTail {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap; earlier runs win ties
        self.comparator
            .compare(&other.tail, &self.tail)
            .then_with(|| other.run.cmp(&self.run))
    }
}
