//! Data file metadata.

use serde::{Deserialize, Serialize};

use crate::data::Row;

/// Metadata for one immutable data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFileMeta {
    /// File name, relative to the bucket directory.
    pub file_name: String,
    /// Size of the file in bytes.
    pub file_size: u64,
    /// Number of records in the file.
    pub row_count: u64,
    /// Smallest key in the file.
    pub min_key: Row,
    /// Largest key in the file.
    pub max_key: Row,
    /// Smallest sequence number in the file.
    pub min_sequence_number: u64,
    /// Largest sequence number in the file.
    pub max_sequence_number: u64,
    /// Schema the file was written with.
    pub schema_id: u64,
    /// LSM level; level 0 files may overlap each other.
    pub level: u32,
    /// Auxiliary files written alongside this one (e.g. a changelog file).
    #[serde(default)]
    pub extra_files: Vec<String>,
}

impl DataFileMeta {
    /// Creates metadata without extra files.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_name: impl Into<String>,
        file_size: u64,
        row_count: u64,
        min_key: Row,
        max_key: Row,
        min_sequence_number: u64,
        max_sequence_number: u64,
        schema_id: u64,
        level: u32,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            row_count,
            min_key,
            max_key,
            min_sequence_number,
            max_sequence_number,
            schema_id,
            level,
            extra_files: Vec::new(),
        }
    }

    /// Returns a copy with `extra_files` replaced.
    pub fn with_extra_files(mut self, extra_files: Vec<String>) -> Self {
        self.extra_files = extra_files;
        self
    }

    /// First extra file whose name starts with `prefix`.
    pub fn changelog_file(&self, prefix: &str) -> Option<&str> {
        self.extra_files.iter().find(|f| f.starts_with(prefix)).map(String::as_str)
    }
}
