//! Builds record readers for sorted runs and sections.

use std::sync::Arc;

use crate::data::KeyComparator;
use crate::error::Result;
use crate::format::KeyValueFileReaderFactory;
use crate::options::SortEngine;
use crate::reader::{ReaderSupplier, RecordReader};

use super::compact::MergeFunction;
use super::concat::ConcatRecordReader;
use super::interval::Section;
use super::sort::SortMergeReader;
use super::sorted_run::SortedRun;

/// Reads the files of one run back to back, opening each on demand.
pub fn read_for_sorted_run(
    run: &SortedRun,
    reader_factory: &Arc<dyn KeyValueFileReaderFactory>,
) -> RecordReader {
    let suppliers = run
        .files()
        .iter()
        .map(|file| {
            let factory = Arc::clone(reader_factory);
            let schema_id = file.schema_id;
            let level = file.level;
            let file_name = file.file_name.clone();
            let supplier: ReaderSupplier =
                Box::new(move || factory.create_record_reader(schema_id, &file_name, level));
            supplier
        })
        .collect();
    ConcatRecordReader::create(suppliers)
}

/// Reads one section, merging its runs when it has more than one.
///
/// `merge_function` must be fresh; it is owned by the returned reader.
pub fn read_for_section(
    section: &Section,
    reader_factory: &Arc<dyn KeyValueFileReaderFactory>,
    comparator: &KeyComparator,
    merge_function: MergeFunction,
    sort_engine: SortEngine,
) -> Result<RecordReader> {
    log::trace!(
        "reading section of {} runs, {} files",
        section.runs().len(),
        section.files().count()
    );
    if let [run] = section.runs() {
        return Ok(read_for_sorted_run(run, reader_factory));
    }
    let readers = section
        .runs()
        .iter()
        .map(|run| read_for_sorted_run(run, reader_factory))
        .collect();
    Ok(Box::new(SortMergeReader::new(readers, comparator.clone(), merge_function, sort_engine)?))
}
