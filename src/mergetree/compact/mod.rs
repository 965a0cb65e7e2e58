//! Merge functions: reduce all records of one key to at most one record.

mod aggregate;
mod deduplicate;
mod factory;
mod first_row;
mod partial_update;
mod value_count;
mod wrapper;

pub use aggregate::{AggregateKind, AggregateMergeFunction, FieldAggregator};
pub use deduplicate::DeduplicateMergeFunction;
pub use factory::{AdjustedProjection, MergeFunctionFactory};
pub use first_row::FirstRowMergeFunction;
pub use partial_update::PartialUpdateMergeFunction;
pub use value_count::ValueCountMergeFunction;
pub use wrapper::ReducerMergeFunctionWrapper;

use crate::data::KeyValue;
use crate::error::Result;

/// The closed set of merge semantics.
///
/// Records of one key arrive in ascending sequence order through [`add`];
/// [`result`] yields the reduced record, if the key still exists.
///
/// [`add`]: MergeFunction::add
/// [`result`]: MergeFunction::result
#[derive(Debug, Clone)]
pub enum MergeFunction {
    /// Highest sequence number wins.
    Deduplicate(DeduplicateMergeFunction),
    /// Non-null columns overlay in sequence order.
    PartialUpdate(PartialUpdateMergeFunction),
    /// Each column folds with its own aggregate.
    Aggregate(AggregateMergeFunction),
    /// Lowest sequence number wins.
    FirstRow(FirstRowMergeFunction),
    /// Counts are summed.
    ValueCount(ValueCountMergeFunction),
}

impl MergeFunction {
    /// Clears the accumulated state for a new key.
    pub fn reset(&mut self) {
        match self {
            MergeFunction::Deduplicate(f) => f.reset(),
            MergeFunction::PartialUpdate(f) => f.reset(),
            MergeFunction::Aggregate(f) => f.reset(),
            MergeFunction::FirstRow(f) => f.reset(),
            MergeFunction::ValueCount(f) => f.reset(),
        }
    }

    /// Feeds the next record of the current key.
    pub fn add(&mut self, kv: KeyValue) -> Result<()> {
        match self {
            MergeFunction::Deduplicate(f) => f.add(kv),
            MergeFunction::PartialUpdate(f) => f.add(kv),
            MergeFunction::Aggregate(f) => return f.add(kv),
            MergeFunction::FirstRow(f) => f.add(kv),
            MergeFunction::ValueCount(f) => return f.add(kv),
        }
        Ok(())
    }

    /// Takes the reduced record; `None` when the key is gone.
    pub fn result(&mut self) -> Result<Option<KeyValue>> {
        Ok(match self {
            MergeFunction::Deduplicate(f) => f.result(),
            MergeFunction::PartialUpdate(f) => f.result(),
            MergeFunction::Aggregate(f) => f.result(),
            MergeFunction::FirstRow(f) => f.result(),
            MergeFunction::ValueCount(f) => f.result(),
        })
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            MergeFunction::Deduplicate(_) => "deduplicate",
            MergeFunction::PartialUpdate(_) => "partial-update",
            MergeFunction::Aggregate(_) => "aggregation",
            MergeFunction::FirstRow(_) => "first-row",
            MergeFunction::ValueCount(_) => "value-count",
        }
    }
}
