//! Table options consumed by the read path.
//!
//! Options arrive as the string map stored on a table schema and are parsed
//! once, when a [`SplitRead`](crate::read::SplitRead) is built.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Option key selecting the merge engine.
pub const MERGE_ENGINE: &str = "merge-engine";
/// Option key selecting the sort-merge strategy.
pub const SORT_ENGINE: &str = "sort-engine";
/// Option key for the changelog file name prefix.
pub const CHANGELOG_FILE_PREFIX: &str = "changelog-file-prefix";
/// Option key to skip retract records during merge.
pub const IGNORE_DELETE: &str = "ignore-delete";

/// Default prefix recognising changelog files among a file's extra files.
pub const DEFAULT_CHANGELOG_FILE_PREFIX: &str = "changelog-";

const FIELDS_PREFIX: &str = "fields.";
const AGG_FUNCTION_SUFFIX: &str = ".aggregate-function";
const LIST_AGG_DELIMITER_SUFFIX: &str = ".list-agg-delimiter";

/// How records sharing a key are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeEngine {
    /// Keep the newest record.
    #[default]
    Deduplicate,
    /// Overlay non-null columns in sequence order.
    PartialUpdate,
    /// Fold per-column aggregate functions.
    Aggregation,
    /// Keep the oldest record.
    FirstRow,
}

impl MergeEngine {
    /// The option value naming this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeEngine::Deduplicate => "deduplicate",
            MergeEngine::PartialUpdate => "partial-update",
            MergeEngine::Aggregation => "aggregation",
            MergeEngine::FirstRow => "first-row",
        }
    }
}

impl FromStr for MergeEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deduplicate" => Ok(MergeEngine::Deduplicate),
            "partial-update" => Ok(MergeEngine::PartialUpdate),
            "aggregation" => Ok(MergeEngine::Aggregation),
            "first-row" => Ok(MergeEngine::FirstRow),
            other => Err(Error::config(format!("unknown {} '{}'", MERGE_ENGINE, other))),
        }
    }
}

impl fmt::Display for MergeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy used to merge the sorted runs of an overlapping section.
///
/// All strategies produce the same records in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortEngine {
    /// Binary min-heap over run cursors.
    MinHeap,
    /// Tournament tree over run cursors.
    #[default]
    LoserTree,
    /// Drain the section, sort it, then group equal keys.
    #[serde(rename = "sort-merge")]
    Buffered,
}

impl SortEngine {
    /// The option value naming this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortEngine::MinHeap => "min-heap",
            SortEngine::LoserTree => "loser-tree",
            SortEngine::Buffered => "sort-merge",
        }
    }
}

impl FromStr for SortEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min-heap" => Ok(SortEngine::MinHeap),
            "loser-tree" => Ok(SortEngine::LoserTree),
            "sort-merge" => Ok(SortEngine::Buffered),
            other => Err(Error::config(format!("unknown {} '{}'", SORT_ENGINE, other))),
        }
    }
}

impl fmt::Display for SortEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed table options.
#[derive(Debug, Clone)]
pub struct CoreOptions {
    /// Merge engine for primary-key tables.
    /// Default: MergeEngine::Deduplicate
    pub merge_engine: MergeEngine,

    /// Strategy for merging overlapping sections.
    /// Default: SortEngine::LoserTree
    pub sort_engine: SortEngine,

    /// Prefix of changelog files listed in `DataFileMeta::extra_files`.
    /// Default: "changelog-"
    pub changelog_file_prefix: String,

    /// Skip retract records while merging.
    /// Default: false
    pub ignore_delete: bool,

    raw: HashMap<String, String>,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            merge_engine: MergeEngine::default(),
            sort_engine: SortEngine::default(),
            changelog_file_prefix: DEFAULT_CHANGELOG_FILE_PREFIX.to_string(),
            ignore_delete: false,
            raw: HashMap::new(),
        }
    }
}

impl CoreOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a schema's option map.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut opts = Self { raw: map.clone(), ..Self::default() };
        if let Some(v) = map.get(MERGE_ENGINE) {
            opts.merge_engine = v.parse()?;
        }
        if let Some(v) = map.get(SORT_ENGINE) {
            opts.sort_engine = v.parse()?;
        }
        if let Some(v) = map.get(CHANGELOG_FILE_PREFIX) {
            opts.changelog_file_prefix = v.clone();
        }
        if let Some(v) = map.get(IGNORE_DELETE) {
            opts.ignore_delete = parse_bool(IGNORE_DELETE, v)?;
        }
        opts.validate()?;
        Ok(opts)
    }

    /// Sets the merge engine.
    pub fn merge_engine(mut self, engine: MergeEngine) -> Self {
        self.merge_engine = engine;
        self
    }

    /// Sets the sort engine.
    pub fn sort_engine(mut self, engine: SortEngine) -> Self {
        self.sort_engine = engine;
        self
    }

    /// Sets the changelog file prefix.
    pub fn changelog_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.changelog_file_prefix = prefix.into();
        self
    }

    /// Enables or disables skipping of retract records.
    pub fn ignore_delete(mut self, value: bool) -> Self {
        self.ignore_delete = value;
        self
    }

    /// Sets the aggregate function of one field.
    pub fn field_aggregate_function(mut self, field: &str, function: &str) -> Self {
        self.raw
            .insert(format!("{}{}{}", FIELDS_PREFIX, field, AGG_FUNCTION_SUFFIX), function.into());
        self
    }

    /// The configured aggregate function of `field`, if any.
    pub fn aggregate_function_of(&self, field: &str) -> Option<&str> {
        self.raw
            .get(&format!("{}{}{}", FIELDS_PREFIX, field, AGG_FUNCTION_SUFFIX))
            .map(String::as_str)
    }

    /// The configured `listagg` delimiter of `field`, if any.
    pub fn list_agg_delimiter_of(&self, field: &str) -> Option<&str> {
        self.raw
            .get(&format!("{}{}{}", FIELDS_PREFIX, field, LIST_AGG_DELIMITER_SUFFIX))
            .map(String::as_str)
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.changelog_file_prefix.is_empty() {
            return Err(Error::config(format!("{} must not be empty", CHANGELOG_FILE_PREFIX)));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::config(format!("{} expects true or false, got '{}'", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_default_options() {
        let opts = CoreOptions::default();
        assert_eq!(opts.merge_engine, MergeEngine::Deduplicate);
        assert_eq!(opts.sort_engine, SortEngine::LoserTree);
        assert_eq!(opts.changelog_file_prefix, "changelog-");
        assert!(!opts.ignore_delete);
    }

    #[test]
    fn test_from_map() {
        let opts = CoreOptions::from_map(&map(&[
            ("merge-engine", "partial-update"),
            ("sort-engine", "min-heap"),
            ("ignore-delete", "TRUE"),
            ("fields.v.aggregate-function", "sum"),
        ]))
        .unwrap();
        assert_eq!(opts.merge_engine, MergeEngine::PartialUpdate);
        assert_eq!(opts.sort_engine, SortEngine::MinHeap);
        assert!(opts.ignore_delete);
        assert_eq!(opts.aggregate_function_of("v"), Some("sum"));
        assert_eq!(opts.aggregate_function_of("w"), None);
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        let err = CoreOptions::from_map(&map(&[("merge-engine", "newest-wins")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CoreOptions::from_map(&map(&[("sort-engine", "quick")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CoreOptions::from_map(&map(&[("ignore-delete", "yes")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CoreOptions::from_map(&map(&[("changelog-file-prefix", "")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_options_builder() {
        let opts = CoreOptions::new()
            .merge_engine(MergeEngine::Aggregation)
            .sort_engine(SortEngine::Buffered)
            .field_aggregate_function("total", "max");
        assert_eq!(opts.merge_engine, MergeEngine::Aggregation);
        assert_eq!(opts.sort_engine.as_str(), "sort-merge");
        assert_eq!(opts.aggregate_function_of("total"), Some("max"));
    }

    #[test]
    fn test_engine_serde_names() {
        assert_eq!(serde_json::to_string(&MergeEngine::FirstRow).unwrap(), "\"first-row\"");
        assert_eq!(serde_json::to_string(&SortEngine::Buffered).unwrap(), "\"sort-merge\"");
        assert_eq!(serde_json::to_string(&SortEngine::LoserTree).unwrap(), "\"loser-tree\"");
    }
}
