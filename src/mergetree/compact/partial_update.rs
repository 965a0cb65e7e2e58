//! Column-wise overlay merge.

use crate::data::{Datum, KeyValue, Row, RowKind};

/// Overlays the non-null columns of each record, in sequence order.
///
/// A retraction clears the accumulated row; a later add starts over. With
/// `ignore_delete`, retractions are skipped instead.
#[derive(Debug, Clone)]
pub struct PartialUpdateMergeFunction {
    arity: usize,
    ignore_delete: bool,
    key: Option<Row>,
    sequence_number: u64,
    row: Option<Vec<Datum>>,
}

impl PartialUpdateMergeFunction {
    /// Creates the merge function for value rows of `arity` fields.
    pub fn new(arity: usize, ignore_delete: bool) -> Self {
        Self { arity, ignore_delete, key: None, sequence_number: 0, row: None }
    }

    pub(crate) fn reset(&mut self) {
        self.key = None;
        self.sequence_number = 0;
        self.row = None;
    }

    pub(crate) fn add(&mut self, kv: KeyValue) {
        if kv.kind().is_retract() {
            if self.ignore_delete {
                return;
            }
            self.row = None;
        } else {
            let arity = self.arity;
            let acc = self.row.get_or_insert_with(|| vec![Datum::Null; arity]);
            for (slot, datum) in acc.iter_mut().zip(kv.value().fields()) {
                if !datum.is_null() {
                    *slot = datum.clone();
                }
            }
        }
        self.sequence_number = kv.sequence_number();
        self.key = Some(kv.key().clone());
    }

    pub(crate) fn result(&mut self) -> Option<KeyValue> {
        let key = self.key.take()?;
        let row = self.row.take()?;
        Some(KeyValue::new(key, self.sequence_number, RowKind::Insert, Row::new(row)))
    }
}
