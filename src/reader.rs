//! Pull-based record readers.
//!
//! Every stage of the read path is an iterator of `Result<KeyValue>`. The
//! consumer drives it; dropping a reader releases whatever it holds open.

use crate::data::{KeyValue, Projection};
use crate::error::Result;

/// A boxed, single-consumer record sequence.
pub type RecordReader = Box<dyn Iterator<Item = Result<KeyValue>> + Send>;

/// Opens a record sequence on demand.
pub type ReaderSupplier = Box<dyn FnOnce() -> Result<RecordReader> + Send>;

/// Wraps an in-memory list of records, mostly for tests and demos.
pub fn from_records(records: Vec<KeyValue>) -> RecordReader {
    Box::new(records.into_iter().map(Ok))
}

/// Applies `projection` to the key of every record.
pub fn project_keys(reader: RecordReader, projection: Projection) -> RecordReader {
    Box::new(reader.map(move |kv| {
        kv.map(|kv| {
            let key = projection.apply(kv.key());
            kv.replace_key(key)
        })
    }))
}

/// Applies `projection` to the value of every record.
pub fn project_values(reader: RecordReader, projection: Projection) -> RecordReader {
    Box::new(reader.map(move |kv| {
        kv.map(|kv| {
            let value = projection.apply(kv.value());
            kv.replace_value(value)
        })
    }))
}

/// Drains a reader, stopping at the first error.
pub fn collect(reader: RecordReader) -> Result<Vec<KeyValue>> {
    reader.collect()
}
