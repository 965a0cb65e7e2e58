//! Sorted runs of data files.

use crate::data::KeyComparator;
use crate::meta::DataFileMeta;

/// Files ordered by key whose key ranges do not overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedRun {
    files: Vec<DataFileMeta>,
    total_size: u64,
}

impl SortedRun {
    fn new(files: Vec<DataFileMeta>) -> Self {
        let total_size = files.iter().map(|f| f.file_size).sum();
        Self { files, total_size }
    }

    /// A run of one file.
    pub fn from_single(file: DataFileMeta) -> Self {
        Self::new(vec![file])
    }

    /// A run of files already sorted by key.
    pub fn from_sorted(files: Vec<DataFileMeta>) -> Self {
        Self::new(files)
    }

    /// A run of non-overlapping files in any order.
    pub fn from_unsorted(mut files: Vec<DataFileMeta>, comparator: &KeyComparator) -> Self {
        files.sort_by(|a, b| comparator.compare(&a.min_key, &b.min_key));
        let run = Self::new(files);
        debug_assert!(run.is_valid(comparator), "files of a sorted run overlap");
        run
    }

    /// The files, in key order.
    pub fn files(&self) -> &[DataFileMeta] {
        &self.files
    }

    /// Sum of the file sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Checks every file starts after the previous file ends and has `min_key <= max_key`.
    pub fn is_valid(&self, comparator: &KeyComparator) -> bool {
        self.files.iter().all(|f| comparator.compare(&f.min_key, &f.max_key).is_le())
            && self
                .files
                .windows(2)
                .all(|w| comparator.compare(&w[0].max_key, &w[1].min_key).is_lt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn file(name: &str, min: i64, max: i64, size: u64) -> DataFileMeta {
        DataFileMeta::new(name, size, 1, row![min], row![max], 0, 0, 0, 1)
    }

    #[test]
    fn test_from_unsorted_orders_by_min_key() {
        let cmp = KeyComparator::natural();
        let run = SortedRun::from_unsorted(
            vec![file("c", 20, 29, 3), file("a", 0, 9, 1), file("b", 10, 19, 2)],
            &cmp,
        );
        let names: Vec<&str> = run.files().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(run.total_size(), 6);
        assert!(run.is_valid(&cmp));
    }

    #[test]
    fn test_touching_ranges_are_invalid() {
        let cmp = KeyComparator::natural();
        let run = SortedRun::from_sorted(vec![file("a", 0, 10, 1), file("b", 10, 19, 1)]);
        assert!(!run.is_valid(&cmp));
    }
}
