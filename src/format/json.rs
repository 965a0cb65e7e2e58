//! JSON-lines data files.
//!
//! ## File Format
//!
//! ```text
//! {"key":[...],"value":[...],"sequence_number":1,"kind":"Insert"}\n
//! {"key":[...],"value":[...],"sequence_number":2,"kind":"Delete"}\n
//! ...
//! ```
//!
//! One [`KeyValue`] per line, sorted by key. Blank lines are skipped.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::sync::Arc;

use super::{DataFilePathFactory, KeyValueFileReaderFactory, ReaderFactoryBuilder, ReaderFactoryParams};
use crate::data::{KeyValue, Projection, Row};
use crate::error::{Error, Result};
use crate::meta::DataFileMeta;
use crate::predicate::Predicate;
use crate::reader::RecordReader;
use crate::schema::SchemaManager;

/// Writes JSON-lines data files into one partition and bucket.
pub struct JsonFileWriter {
    path_factory: Arc<dyn DataFilePathFactory>,
    partition: Row,
    bucket: u32,
}

impl JsonFileWriter {
    /// Creates a writer for `partition` / `bucket`.
    pub fn new(path_factory: Arc<dyn DataFilePathFactory>, partition: Row, bucket: u32) -> Self {
        Self { path_factory, partition, bucket }
    }

    /// Writes `records` to `file_name` and returns the file's metadata.
    ///
    /// Records are written in the given order; the caller keeps them sorted.
    pub fn write_file(
        &self,
        file_name: &str,
        schema_id: u64,
        level: u32,
        records: &[KeyValue],
    ) -> Result<DataFileMeta> {
        let (first, rest) = records
            .split_first()
            .ok_or_else(|| Error::invalid_argument("cannot write an empty data file"))?;

        let path = self.path_factory.to_path(&self.partition, self.bucket, file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        let mut min_key = first.key();
        let mut max_key = first.key();
        let mut min_seq = first.sequence_number();
        let mut max_seq = first.sequence_number();
        for kv in rest {
            min_key = min_key.min(kv.key());
            max_key = max_key.max(kv.key());
            min_seq = min_seq.min(kv.sequence_number());
            max_seq = max_seq.max(kv.sequence_number());
        }
        for kv in records {
            serde_json::to_writer(&mut writer, kv)
                .map_err(|e| Error::internal(format!("failed to encode record: {}", e)))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        drop(writer);

        let file_size = fs::metadata(&path)?.len();
        log::trace!("Wrote {} records to {}", records.len(), path.display());

        Ok(DataFileMeta::new(
            file_name,
            file_size,
            records.len() as u64,
            min_key.clone(),
            max_key.clone(),
            min_seq,
            max_seq,
            schema_id,
            level,
        ))
    }
}

/// Builds [`JsonReaderFactory`] instances.
pub struct JsonReaderFactoryBuilder {
    path_factory: Arc<dyn DataFilePathFactory>,
    schema_manager: Arc<dyn SchemaManager>,
}

impl JsonReaderFactoryBuilder {
    /// Creates a builder resolving paths and schemas through the given collaborators.
    pub fn new(
        path_factory: Arc<dyn DataFilePathFactory>,
        schema_manager: Arc<dyn SchemaManager>,
    ) -> Self {
        Self { path_factory, schema_manager }
    }
}

impl ReaderFactoryBuilder for JsonReaderFactoryBuilder {
    fn build(&self, params: &ReaderFactoryParams<'_>) -> Result<Arc<dyn KeyValueFileReaderFactory>> {
        let key_projection = if params.project_keys { params.key_projection.cloned() } else { None };
        Ok(Arc::new(JsonReaderFactory {
            path_factory: Arc::clone(&self.path_factory),
            schema_manager: Arc::clone(&self.schema_manager),
            partition: params.partition.clone(),
            bucket: params.bucket,
            key_projection,
            value_projection: params.value_projection.cloned(),
            filters: params.filters.into(),
        }))
    }
}

/// Opens JSON-lines files, applying filters and then projections per record.
pub struct JsonReaderFactory {
    path_factory: Arc<dyn DataFilePathFactory>,
    schema_manager: Arc<dyn SchemaManager>,
    partition: Row,
    bucket: u32,
    key_projection: Option<Projection>,
    value_projection: Option<Projection>,
    filters: Arc<[Predicate]>,
}

impl KeyValueFileReaderFactory for JsonReaderFactory {
    fn create_record_reader(
        &self,
        schema_id: u64,
        file_name: &str,
        level: u32,
    ) -> Result<RecordReader> {
        let schema = self.schema_manager.schema(schema_id)?;
        let path = self.path_factory.to_path(&self.partition, self.bucket, file_name);
        log::trace!("Opening level {} file {}", level, path.display());
        let file = File::open(&path)?;

        Ok(Box::new(JsonRecordReader {
            lines: BufReader::new(file).lines(),
            file_name: file_name.to_string(),
            line_no: 0,
            filters: Arc::clone(&self.filters),
            filter_on_key: schema.is_value_count_mode(),
            key_projection: self.key_projection.clone(),
            value_projection: self.value_projection.clone(),
            done: false,
        }))
    }
}

struct JsonRecordReader {
    lines: Lines<BufReader<File>>,
    file_name: String,
    line_no: usize,
    filters: Arc<[Predicate]>,
    filter_on_key: bool,
    key_projection: Option<Projection>,
    value_projection: Option<Projection>,
    done: bool,
}

impl JsonRecordReader {
    fn accepts(&self, kv: &KeyValue) -> bool {
        let row = if self.filter_on_key { kv.key() } else { kv.value() };
        self.filters.iter().all(|f| f.test(row))
    }

    fn project(&self, mut kv: KeyValue) -> KeyValue {
        if let Some(p) = &self.key_projection {
            let key = p.apply(kv.key());
            kv = kv.replace_key(key);
        }
        if let Some(p) = &self.value_projection {
            let value = p.apply(kv.value());
            kv = kv.replace_value(value);
        }
        kv
    }
}

impl Iterator for JsonRecordReader {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let kv: KeyValue = match serde_json::from_str(&line) {
                Ok(kv) => kv,
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::corruption(format!(
                        "{} line {}: {}",
                        self.file_name, self.line_no, e
                    ))));
                }
            };
            if self.accepts(&kv) {
                return Some(Ok(self.project(kv)));
            }
        }
    }
}
