//! Table schemas and the schema-manager collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the single value field of a table without primary keys.
pub const VALUE_COUNT_FIELD: &str = "_VALUE_COUNT";

/// Logical column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean.
    Boolean,
    /// 64-bit integer.
    BigInt,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// Raw bytes.
    Bytes,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    /// Stable field id.
    pub id: u32,
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
}

impl DataField {
    /// Creates a new field.
    pub fn new(id: u32, name: impl Into<String>, data_type: DataType) -> Self {
        Self { id, name: name.into(), data_type }
    }
}

/// A versioned table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    id: u64,
    fields: Vec<DataField>,
    partition_keys: Vec<String>,
    primary_keys: Vec<String>,
    options: HashMap<String, String>,
}

impl TableSchema {
    /// Creates a schema, checking that key columns name existing fields.
    pub fn new(
        id: u64,
        fields: Vec<DataField>,
        partition_keys: Vec<String>,
        primary_keys: Vec<String>,
        options: HashMap<String, String>,
    ) -> Result<Self> {
        for name in partition_keys.iter().chain(primary_keys.iter()) {
            if !fields.iter().any(|f| &f.name == name) {
                return Err(Error::config(format!("key column '{}' is not a table field", name)));
            }
        }
        for p in &partition_keys {
            if !primary_keys.is_empty() && !primary_keys.contains(p) {
                return Err(Error::config(format!(
                    "primary keys must contain partition key '{}'",
                    p
                )));
            }
        }
        if !primary_keys.is_empty() && primary_keys.iter().all(|k| partition_keys.contains(k)) {
            return Err(Error::config(format!(
                "primary keys {:?} must not be the same as partition keys {:?}",
                primary_keys, partition_keys
            )));
        }
        Ok(Self { id, fields, partition_keys, primary_keys, options })
    }

    /// Schema id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// All fields, in table order. This is the layout of a value row.
    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    /// Field names, in table order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Position of `name` among the fields.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Partition key names.
    pub fn partition_keys(&self) -> &[String] {
        &self.partition_keys
    }

    /// Primary key names.
    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// Primary keys without the partition keys; the layout of a key row.
    ///
    /// Never empty for a keyed table; [`TableSchema::new`] rejects primary
    /// keys that are all partition keys.
    pub fn trimmed_primary_keys(&self) -> Vec<&str> {
        self.primary_keys
            .iter()
            .filter(|k| !self.partition_keys.contains(k))
            .map(String::as_str)
            .collect()
    }

    /// True for tables without primary keys, whose records count duplicates.
    pub fn is_value_count_mode(&self) -> bool {
        self.primary_keys.is_empty()
    }

    /// Number of fields in a key row.
    pub fn key_arity(&self) -> usize {
        if self.is_value_count_mode() {
            self.fields.len()
        } else {
            self.trimmed_primary_keys().len()
        }
    }

    /// Number of fields in a value row.
    pub fn value_arity(&self) -> usize {
        if self.is_value_count_mode() {
            1
        } else {
            self.fields.len()
        }
    }

    /// Names of the fields in a value row.
    pub fn value_field_names(&self) -> Vec<&str> {
        if self.is_value_count_mode() {
            vec![VALUE_COUNT_FIELD]
        } else {
            self.field_names()
        }
    }

    /// Raw table options.
    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }
}

/// Resolves schema ids to schemas.
pub trait SchemaManager: Send + Sync {
    /// Returns the schema with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaNotFound`] for an unknown id.
    fn schema(&self, id: u64) -> Result<Arc<TableSchema>>;
}

/// In-memory [`SchemaManager`].
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<u64, Arc<TableSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema, replacing any schema with the same id.
    pub fn register(&self, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        self.schemas.write().insert(schema.id(), Arc::clone(&schema));
        schema
    }
}

impl SchemaManager for SchemaRegistry {
    fn schema(&self, id: u64) -> Result<Arc<TableSchema>> {
        self.schemas.read().get(&id).cloned().ok_or(Error::SchemaNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<DataField> {
        vec![
            DataField::new(0, "dt", DataType::String),
            DataField::new(1, "k", DataType::BigInt),
            DataField::new(2, "v", DataType::BigInt),
        ]
    }

    #[test]
    fn test_trimmed_primary_keys() {
        let schema = TableSchema::new(
            0,
            fields(),
            vec!["dt".into()],
            vec!["dt".into(), "k".into()],
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(schema.trimmed_primary_keys(), vec!["k"]);
        assert_eq!(schema.key_arity(), 1);
        assert_eq!(schema.value_arity(), 3);
        assert!(!schema.is_value_count_mode());
    }

    #[test]
    fn test_value_count_layout() {
        let schema = TableSchema::new(0, fields(), vec![], vec![], HashMap::new()).unwrap();
        assert!(schema.is_value_count_mode());
        assert_eq!(schema.key_arity(), 3);
        assert_eq!(schema.value_field_names(), vec![VALUE_COUNT_FIELD]);
    }

    #[test]
    fn test_primary_keys_equal_to_partition_keys() {
        let err = TableSchema::new(0, fields(), vec!["dt".into()], vec!["dt".into()], HashMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_key_column() {
        let err =
            TableSchema::new(0, fields(), vec![], vec!["id".into()], HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SchemaRegistry::new();
        registry.register(TableSchema::new(3, fields(), vec![], vec![], HashMap::new()).unwrap());
        assert_eq!(registry.schema(3).unwrap().id(), 3);
        assert!(matches!(registry.schema(4), Err(Error::SchemaNotFound(4))));
    }
}
