//! Data file locations.

use std::path::{Path, PathBuf};

use crate::data::Row;

/// Maps a partition, bucket and file name to a physical location.
pub trait DataFilePathFactory: Send + Sync {
    /// Location of `file_name` in `partition` / `bucket`.
    fn to_path(&self, partition: &Row, bucket: u32, file_name: &str) -> PathBuf;
}

/// Lays files out as `<root>/<k1=v1>/.../bucket-<n>/<file>`.
#[derive(Debug, Clone)]
pub struct FileStorePathFactory {
    root: PathBuf,
    partition_keys: Vec<String>,
}

impl FileStorePathFactory {
    /// Creates a path factory rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P, partition_keys: Vec<String>) -> Self {
        Self { root: root.as_ref().to_path_buf(), partition_keys }
    }

    /// Directory holding the files of `partition` / `bucket`.
    pub fn bucket_path(&self, partition: &Row, bucket: u32) -> PathBuf {
        let mut path = self.root.clone();
        for (name, value) in self.partition_keys.iter().zip(partition.fields()) {
            path.push(format!("{}={}", name, value));
        }
        path.push(format!("bucket-{}", bucket));
        path
    }
}

impl DataFilePathFactory for FileStorePathFactory {
    fn to_path(&self, partition: &Row, bucket: u32, file_name: &str) -> PathBuf {
        self.bucket_path(partition, bucket).join(file_name)
    }
}
