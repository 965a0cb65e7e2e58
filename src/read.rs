//! Split reads: plans and opens the record stream of one [`DataSplit`].
//!
//! A [`SplitReadBuilder`] resolves the table schema, parses its options and
//! fixes projections and filters. The resulting [`SplitRead`] is immutable
//! and can serve any number of splits, from any number of threads.
//!
//! ```text
//! incremental:  files -> concat -> [reverse] -> [outer projection]
//! merged:       files -> sections -> sort-merge -> concat -> drop-delete
//!                     -> [key projection] -> [outer projection]
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::data::{KeyComparator, Projection};
use crate::error::Result;
use crate::format::{KeyValueFileReaderFactory, ReaderFactoryBuilder, ReaderFactoryParams};
use crate::mergetree::{
    read_for_section, AdjustedProjection, ConcatRecordReader, DropDeleteReader, IntervalPartition,
    MergeFunctionFactory, ReverseReader,
};
use crate::options::CoreOptions;
use crate::predicate::{split_and, Predicate};
use crate::reader::{self, ReaderSupplier, RecordReader};
use crate::schema::{SchemaManager, TableSchema};
use crate::split::DataSplit;

/// Configures a [`SplitRead`].
pub struct SplitReadBuilder {
    schema: Arc<TableSchema>,
    options: CoreOptions,
    merge_factory: MergeFunctionFactory,
    reader_factory_builder: Arc<dyn ReaderFactoryBuilder>,
    comparator: KeyComparator,
    key_projection: Option<Projection>,
    value_projection: AdjustedProjection,
    filters_for_overlapped_section: Vec<Predicate>,
    filters_for_non_overlapped_section: Vec<Predicate>,
}

impl SplitReadBuilder {
    /// Starts a read of the table at `schema_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaNotFound`](crate::Error::SchemaNotFound) if the schema is unknown
    /// - [`Error::Config`](crate::Error::Config) if the table options are malformed
    pub fn new(
        schema_manager: &dyn SchemaManager,
        schema_id: u64,
        reader_factory_builder: Arc<dyn ReaderFactoryBuilder>,
    ) -> Result<Self> {
        let schema = schema_manager.schema(schema_id)?;
        let options = CoreOptions::from_map(schema.options())?;
        Self::with_options(schema, options, reader_factory_builder)
    }

    /// Starts a read of `schema` with explicit options, ignoring the schema's own.
    pub fn with_options(
        schema: Arc<TableSchema>,
        options: CoreOptions,
        reader_factory_builder: Arc<dyn ReaderFactoryBuilder>,
    ) -> Result<Self> {
        options.validate()?;
        let merge_factory = MergeFunctionFactory::from_schema(&schema, &options)?;
        Ok(Self {
            schema,
            options,
            merge_factory,
            reader_factory_builder,
            comparator: KeyComparator::natural(),
            key_projection: None,
            value_projection: AdjustedProjection::default(),
            filters_for_overlapped_section: Vec::new(),
            filters_for_non_overlapped_section: Vec::new(),
        })
    }

    /// Orders keys with `comparator` instead of the natural order.
    pub fn with_key_comparator(mut self, comparator: KeyComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Projects every output key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`](crate::Error::Projection) for an index
    /// outside the key row or a duplicated index.
    pub fn with_key_projection(mut self, projection: Projection) -> Result<Self> {
        projection.validate(self.schema.key_arity())?;
        self.key_projection = Some(projection);
        Ok(self)
    }

    /// Projects every output value.
    ///
    /// Depending on the merge engine, the projection is pushed into the file
    /// readers or applied after merging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`](crate::Error::Projection) when the merge
    /// engine cannot honor the projection.
    pub fn with_value_projection(mut self, projection: Projection) -> Result<Self> {
        self.value_projection = self.merge_factory.adjust_projection(Some(&projection))?;
        Ok(self)
    }

    /// Pushes `predicate` down to the file readers.
    ///
    /// Value filters may hide older versions of a key from a merge, so
    /// sections with overlapping runs only receive clauses on primary-key
    /// columns. Replaces any earlier filter.
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        let primary_keys: HashSet<&str> = self.schema.trimmed_primary_keys().into_iter().collect();
        let non_primary_keys: HashSet<String> = self
            .schema
            .field_names()
            .into_iter()
            .filter(|name| !primary_keys.contains(name))
            .map(str::to_string)
            .collect();

        let all = split_and(&predicate);
        let key_filters: Vec<Predicate> =
            all.iter().filter(|p| !p.contains_fields(&non_primary_keys)).cloned().collect();

        self.filters_for_overlapped_section =
            if self.schema.is_value_count_mode() { all.clone() } else { key_filters };
        self.filters_for_non_overlapped_section = all;
        self
    }

    /// Freezes the configuration.
    pub fn build(self) -> SplitRead {
        SplitRead {
            schema: self.schema,
            options: self.options,
            merge_factory: self.merge_factory,
            reader_factory_builder: self.reader_factory_builder,
            comparator: self.comparator,
            key_projection: self.key_projection,
            value_projection: self.value_projection,
            filters_for_overlapped_section: self.filters_for_overlapped_section,
            filters_for_non_overlapped_section: self.filters_for_non_overlapped_section,
        }
    }
}

/// An immutable, shareable read configuration.
pub struct SplitRead {
    schema: Arc<TableSchema>,
    options: CoreOptions,
    merge_factory: MergeFunctionFactory,
    reader_factory_builder: Arc<dyn ReaderFactoryBuilder>,
    comparator: KeyComparator,
    key_projection: Option<Projection>,
    value_projection: AdjustedProjection,
    filters_for_overlapped_section: Vec<Predicate>,
    filters_for_non_overlapped_section: Vec<Predicate>,
}

impl SplitRead {
    /// Table schema of the read.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Parsed table options.
    pub fn options(&self) -> &CoreOptions {
        &self.options
    }

    /// Value projection applied inside the file readers.
    pub fn pushdown_projection(&self) -> Option<&Projection> {
        self.value_projection.pushdown.as_ref()
    }

    /// Value projection applied to the final records.
    pub fn outer_projection(&self) -> Option<&Projection> {
        self.value_projection.outer.as_ref()
    }

    /// Filters pushed into sections with more than one run, and into
    /// incremental reads.
    pub fn filters_for_overlapped_section(&self) -> &[Predicate] {
        &self.filters_for_overlapped_section
    }

    /// Filters pushed into single-run sections.
    pub fn filters_for_non_overlapped_section(&self) -> &[Predicate] {
        &self.filters_for_non_overlapped_section
    }

    /// Opens the records of `split`.
    ///
    /// No file is opened before the returned reader is first pulled.
    pub fn create_reader(&self, split: &DataSplit) -> Result<RecordReader> {
        let reader = if split.is_incremental {
            self.create_incremental_reader(split)?
        } else {
            self.create_merged_reader(split)?
        };
        Ok(match &self.value_projection.outer {
            Some(outer) => reader::project_values(reader, outer.clone()),
            None => reader,
        })
    }

    fn reader_factory(
        &self,
        split: &DataSplit,
        project_keys: bool,
        filters: &[Predicate],
    ) -> Result<Arc<dyn KeyValueFileReaderFactory>> {
        self.reader_factory_builder.build(&ReaderFactoryParams {
            partition: &split.partition,
            bucket: split.bucket,
            project_keys,
            key_projection: self.key_projection.as_ref(),
            value_projection: self.value_projection.pushdown.as_ref(),
            filters,
        })
    }

    fn create_incremental_reader(&self, split: &DataSplit) -> Result<RecordReader> {
        let factory = self.reader_factory(split, true, &self.filters_for_overlapped_section)?;
        log::debug!(
            "Planning incremental read of partition {} bucket {}: {} files",
            split.partition,
            split.bucket,
            split.files.len()
        );

        let suppliers: Vec<ReaderSupplier> = split
            .files
            .iter()
            .map(|file| {
                let file_name = match file.changelog_file(&self.options.changelog_file_prefix) {
                    Some(changelog) => {
                        log::warn!("Reading changelog {} in place of {}", changelog, file.file_name);
                        changelog.to_string()
                    }
                    None => file.file_name.clone(),
                };
                let factory = Arc::clone(&factory);
                let (schema_id, level) = (file.schema_id, file.level);
                let supplier: ReaderSupplier =
                    Box::new(move || factory.create_record_reader(schema_id, &file_name, level));
                supplier
            })
            .collect();

        let reader = ConcatRecordReader::create(suppliers);
        Ok(if split.reverse_row_kind { Box::new(ReverseReader::new(reader)) } else { reader })
    }

    fn create_merged_reader(&self, split: &DataSplit) -> Result<RecordReader> {
        // keys stay whole until after the merge; it sorts on them
        let overlapped = self.reader_factory(split, false, &self.filters_for_overlapped_section)?;
        let non_overlapped =
            self.reader_factory(split, false, &self.filters_for_non_overlapped_section)?;

        let sections =
            IntervalPartition::new(split.files.clone(), self.comparator.clone()).partition();
        log::debug!(
            "Planning merged read of partition {} bucket {}: {} files, {} sections ({} overlapping)",
            split.partition,
            split.bucket,
            split.files.len(),
            sections.len(),
            sections.iter().filter(|s| s.is_overlapping()).count()
        );

        let suppliers: Vec<ReaderSupplier> = sections
            .into_iter()
            .map(|section| {
                let factory = Arc::clone(if section.is_overlapping() {
                    &overlapped
                } else {
                    &non_overlapped
                });
                let comparator = self.comparator.clone();
                let function = self.merge_factory.create(self.value_projection.pushdown.as_ref());
                let sort_engine = self.options.sort_engine;
                let supplier: ReaderSupplier = Box::new(move || {
                    read_for_section(&section, &factory, &comparator, function, sort_engine)
                });
                supplier
            })
            .collect();

        let reader: RecordReader =
            Box::new(DropDeleteReader::new(ConcatRecordReader::create(suppliers)));
        Ok(match &self.key_projection {
            Some(projection) => reader::project_keys(reader, projection.clone()),
            None => reader,
        })
    }
}
