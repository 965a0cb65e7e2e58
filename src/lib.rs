//! # mergetree - Merge-on-Read for Leveled Table Files
//!
//! mergetree reads the data files of one partition bucket of a primary-key
//! table and produces a single key-ordered record stream in which each key
//! appears at most once. Files written at different times may overlap in key
//! range; the newest state of every key is reconstructed at read time.
//!
//! ## Architecture
//!
//! The read path consists of several key components:
//!
//! - **Interval Partition**: groups files into key-disjoint sections of sorted runs
//! - **Sort Engines**: k-way merge of overlapping runs (min-heap, loser tree, buffered)
//! - **Merge Functions**: deduplicate, partial-update, aggregation, first-row, value-count
//! - **Filter Pushdown**: value filters only reach sections without overlapping runs
//! - **Split Read**: immutable read configuration, shareable across threads
//!
//! File decoding is delegated to a [`format::ReaderFactoryBuilder`];
//! [`format::json`] is a JSON-lines implementation.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mergetree::format::{FileStorePathFactory, JsonReaderFactoryBuilder};
//! use mergetree::schema::{DataField, DataType, SchemaRegistry, TableSchema};
//! use mergetree::{DataSplit, Row, SplitReadBuilder};
//!
//! # fn main() -> Result<(), mergetree::Error> {
//! let schemas = Arc::new(SchemaRegistry::new());
//! schemas.register(TableSchema::new(
//!     0,
//!     vec![DataField::new(0, "id", DataType::BigInt), DataField::new(1, "v", DataType::String)],
//!     vec![],
//!     vec!["id".to_string()],
//!     Default::default(),
//! )?);
//!
//! let paths = Arc::new(FileStorePathFactory::new("./table", vec![]));
//! let readers = Arc::new(JsonReaderFactoryBuilder::new(paths, schemas.clone()));
//! let read = SplitReadBuilder::new(schemas.as_ref(), 0, readers)?.build();
//!
//! let split = DataSplit::merged(Row::empty(), 0, vec![/* file metas */]);
//! for kv in read.create_reader(&split)? {
//!     println!("{}", kv?);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod data;
pub mod error;
pub mod format;
pub mod meta;
pub mod mergetree;
pub mod options;
pub mod predicate;
pub mod read;
pub mod reader;
pub mod schema;
pub mod split;

// Re-exports
pub use data::{Datum, KeyComparator, KeyValue, Projection, Row, RowKind};
pub use error::{Error, Result};
pub use meta::DataFileMeta;
pub use options::{CoreOptions, MergeEngine, SortEngine};
pub use predicate::{Predicate, PredicateBuilder};
pub use read::{SplitRead, SplitReadBuilder};
pub use reader::RecordReader;
pub use split::DataSplit;
