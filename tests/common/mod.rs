// Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use mergetree::format::{FileStorePathFactory, JsonFileWriter, JsonReaderFactoryBuilder};
use mergetree::reader;
use mergetree::schema::{DataField, DataType, SchemaRegistry, TableSchema};
use mergetree::{row, DataFileMeta, DataSplit, KeyValue, Row, SplitRead, SplitReadBuilder};
use tempfile::TempDir;

/// A table of `(id BIGINT, name STRING, amount BIGINT)` stored as JSON lines
/// in a temporary directory.
pub struct TestTable {
    pub dir: TempDir,
    pub schemas: Arc<SchemaRegistry>,
    writer: JsonFileWriter,
    readers: Arc<JsonReaderFactoryBuilder>,
    next_file: usize,
}

impl TestTable {
    /// A table keyed by `id`.
    pub fn keyed(options: &[(&str, &str)]) -> Self {
        Self::new(&["id"], options)
    }

    /// A table without primary key, counting duplicate rows.
    pub fn value_count() -> Self {
        Self::new(&[], &[])
    }

    pub fn new(primary_keys: &[&str], options: &[(&str, &str)]) -> Self {
        env_logger::try_init().ok();
        let dir = TempDir::new().unwrap();
        let schemas = Arc::new(SchemaRegistry::new());
        schemas.register(
            TableSchema::new(
                0,
                vec![
                    DataField::new(0, "id", DataType::BigInt),
                    DataField::new(1, "name", DataType::String),
                    DataField::new(2, "amount", DataType::BigInt),
                ],
                vec![],
                primary_keys.iter().map(|s| s.to_string()).collect(),
                options
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            )
            .unwrap(),
        );
        let paths = Arc::new(FileStorePathFactory::new(dir.path(), vec![]));
        let writer = JsonFileWriter::new(paths.clone(), Row::empty(), 0);
        let readers = Arc::new(JsonReaderFactoryBuilder::new(paths, schemas.clone()));
        Self { dir, schemas, writer, readers, next_file: 0 }
    }

    /// Writes a data file at `level`.
    pub fn write(&mut self, level: u32, records: &[KeyValue]) -> DataFileMeta {
        self.next_file += 1;
        let name = format!("data-{}.json", self.next_file);
        self.writer.write_file(&name, 0, level, records).unwrap()
    }

    /// Writes a file that is only referenced as a changelog.
    pub fn write_named(&self, name: &str, records: &[KeyValue]) -> DataFileMeta {
        self.writer.write_file(name, 0, 0, records).unwrap()
    }

    pub fn try_builder(&self) -> mergetree::Result<SplitReadBuilder> {
        SplitReadBuilder::new(self.schemas.as_ref(), 0, self.readers.clone())
    }

    pub fn builder(&self) -> SplitReadBuilder {
        self.try_builder().unwrap()
    }

    pub fn merged(&self, read: &SplitRead, files: &[DataFileMeta]) -> Vec<KeyValue> {
        let split = DataSplit::merged(Row::empty(), 0, files.to_vec());
        reader::collect(read.create_reader(&split).unwrap()).unwrap()
    }

    pub fn incremental(&self, read: &SplitRead, files: &[DataFileMeta], reverse: bool) -> Vec<KeyValue> {
        let split =
            DataSplit::incremental(Row::empty(), 0, files.to_vec()).with_reverse_row_kind(reverse);
        reader::collect(read.create_reader(&split).unwrap()).unwrap()
    }
}

/// `+I` record of a keyed table.
pub fn put(id: i64, seq: u64, name: &str, amount: i64) -> KeyValue {
    KeyValue::insert(row![id], seq, row![id, name, amount])
}

/// `-D` record of a keyed table.
pub fn del(id: i64, seq: u64) -> KeyValue {
    KeyValue::delete(row![id], seq, row![id, "", 0])
}

/// `(id, amount)` pairs of merged output.
pub fn id_amounts(records: &[KeyValue]) -> Vec<(i64, i64)> {
    records
        .iter()
        .map(|kv| {
            (
                kv.key().get(0).and_then(|d| d.as_int()).unwrap(),
                kv.value().get(2).and_then(|d| d.as_int()).unwrap(),
            )
        })
        .collect()
}
