//! The key-value record, the unit of merge.

use serde::{Deserialize, Serialize};

use super::Row;

/// Kind of change a record carries.
///
/// `Insert` and `UpdateAfter` add a row; `UpdateBefore` and `Delete` retract one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    /// A new row.
    Insert,
    /// The previous image of an updated row.
    UpdateBefore,
    /// The new image of an updated row.
    UpdateAfter,
    /// A deleted row.
    Delete,
}

impl RowKind {
    /// Returns true for kinds that add a row.
    pub fn is_add(self) -> bool {
        matches!(self, RowKind::Insert | RowKind::UpdateAfter)
    }

    /// Returns true for kinds that retract a row.
    pub fn is_retract(self) -> bool {
        !self.is_add()
    }

    /// Short form used in logs and debug output.
    pub fn short_string(self) -> &'static str {
        match self {
            RowKind::Insert => "+I",
            RowKind::UpdateBefore => "-U",
            RowKind::UpdateAfter => "+U",
            RowKind::Delete => "-D",
        }
    }
}

/// A versioned key-value record.
///
/// Records with equal keys are ordered by `sequence_number`; the higher one is newer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    key: Row,
    value: Row,
    sequence_number: u64,
    kind: RowKind,
}

impl KeyValue {
    /// Creates a new record.
    pub fn new(key: Row, sequence_number: u64, kind: RowKind, value: Row) -> Self {
        Self { key, value, sequence_number, kind }
    }

    /// Shorthand for an `Insert` record.
    pub fn insert(key: Row, sequence_number: u64, value: Row) -> Self {
        Self::new(key, sequence_number, RowKind::Insert, value)
    }

    /// Shorthand for a `Delete` record.
    pub fn delete(key: Row, sequence_number: u64, value: Row) -> Self {
        Self::new(key, sequence_number, RowKind::Delete, value)
    }

    /// The key row.
    pub fn key(&self) -> &Row {
        &self.key
    }

    /// The value row.
    pub fn value(&self) -> &Row {
        &self.value
    }

    /// The write-order sequence number.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// The row kind.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Returns the record with its key replaced.
    pub fn replace_key(self, key: Row) -> Self {
        Self { key, ..self }
    }

    /// Returns the record with its value replaced.
    pub fn replace_value(self, value: Row) -> Self {
        Self { value, ..self }
    }

    /// Splits the record into `(key, sequence_number, kind, value)`.
    pub fn into_parts(self) -> (Row, u64, RowKind, Row) {
        (self.key, self.sequence_number, self.kind, self.value)
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} seq={} {}",
            self.kind.short_string(),
            self.key,
            self.sequence_number,
            self.value
        )
    }
}
