//! File-format collaborator interfaces.
//!
//! The merge engine never decodes files itself. It asks a
//! [`ReaderFactoryBuilder`] for a [`KeyValueFileReaderFactory`] configured
//! with projections and pushed-down filters, then opens files through it.
//! [`json`] provides a JSON-lines implementation.

pub mod json;
pub mod path;

pub use json::{JsonFileWriter, JsonReaderFactoryBuilder};
pub use path::{DataFilePathFactory, FileStorePathFactory};

use std::sync::Arc;

use crate::data::{Projection, Row};
use crate::error::Result;
use crate::predicate::Predicate;
use crate::reader::RecordReader;

/// Opens the records of one data file.
pub trait KeyValueFileReaderFactory: Send + Sync {
    /// Opens `file_name`, written with `schema_id`, at `level`.
    ///
    /// # Errors
    ///
    /// I/O and decode failures are returned as-is; the caller does not retry.
    fn create_record_reader(&self, schema_id: u64, file_name: &str, level: u32)
        -> Result<RecordReader>;
}

/// Parameters fixed when a reader factory is built.
#[derive(Debug, Clone, Copy)]
pub struct ReaderFactoryParams<'a> {
    /// Partition of the split.
    pub partition: &'a Row,
    /// Bucket of the split.
    pub bucket: u32,
    /// Apply `key_projection` inside the file reader.
    ///
    /// Only safe when records are not sorted or merged afterwards.
    pub project_keys: bool,
    /// Key projection, if any.
    pub key_projection: Option<&'a Projection>,
    /// Value projection pushed into the file reader, if any.
    pub value_projection: Option<&'a Projection>,
    /// Filters the file reader may apply.
    pub filters: &'a [Predicate],
}

/// Builds reader factories for one table.
pub trait ReaderFactoryBuilder: Send + Sync {
    /// Builds a factory for the given partition, bucket, projections and filters.
    fn build(&self, params: &ReaderFactoryParams<'_>) -> Result<Arc<dyn KeyValueFileReaderFactory>>;
}
