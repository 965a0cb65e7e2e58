//! Input splits.

use crate::data::Row;
use crate::meta::DataFileMeta;

/// The files of one partition and bucket, handed to
/// [`SplitRead::create_reader`](crate::read::SplitRead::create_reader).
#[derive(Debug, Clone)]
pub struct DataSplit {
    /// Partition values.
    pub partition: Row,
    /// Bucket number.
    pub bucket: u32,
    /// Data files of the split.
    pub files: Vec<DataFileMeta>,
    /// Read raw file contents without merging.
    pub is_incremental: bool,
    /// Emit incremental records in reverse order.
    pub reverse_row_kind: bool,
}

impl DataSplit {
    /// A split read through the merge tree.
    pub fn merged(partition: Row, bucket: u32, files: Vec<DataFileMeta>) -> Self {
        Self { partition, bucket, files, is_incremental: false, reverse_row_kind: false }
    }

    /// A split whose files are concatenated as-is.
    pub fn incremental(partition: Row, bucket: u32, files: Vec<DataFileMeta>) -> Self {
        Self { partition, bucket, files, is_incremental: true, reverse_row_kind: false }
    }

    /// Sets the reverse flag.
    pub fn with_reverse_row_kind(mut self, reverse: bool) -> Self {
        self.reverse_row_kind = reverse;
        self
    }

    /// Total records across the split's files, according to metadata.
    pub fn row_count(&self) -> u64 {
        self.files.iter().map(|f| f.row_count).sum()
    }
}
