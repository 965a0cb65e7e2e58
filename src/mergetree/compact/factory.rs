use crate::data::Projection;
use crate::error::{Error, Result};
use crate::options::{CoreOptions, MergeEngine};
use crate::schema::TableSchema;

use super::{
    AggregateKind, AggregateMergeFunction, DeduplicateMergeFunction, FirstRowMergeFunction,
    MergeFunction, PartialUpdateMergeFunction, ValueCountMergeFunction,
};

const DEFAULT_AGGREGATE_FUNCTION: &str = "last_non_null_value";

/// Value projections split between the file readers and the final output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjustedProjection {
    /// Projection applied while reading files, before merging.
    pub pushdown: Option<Projection>,
    /// Projection applied to merged records.
    pub outer: Option<Projection>,
}

#[derive(Debug, Clone)]
enum Engine {
    Deduplicate,
    PartialUpdate,
    Aggregate(Vec<AggregateKind>),
    FirstRow,
    ValueCount,
}

/// Builds [`MergeFunction`]s for one table schema.
///
/// Aggregate functions are resolved once here, so a misconfigured table fails
/// when the read is built rather than on the first record.
#[derive(Debug, Clone)]
pub struct MergeFunctionFactory {
    engine: Engine,
    value_arity: usize,
    ignore_delete: bool,
}

impl MergeFunctionFactory {
    /// Resolves the merge engine of `schema`.
    ///
    /// Tables without primary keys always count values, whatever the
    /// configured engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown aggregate function.
    pub fn from_schema(schema: &TableSchema, options: &CoreOptions) -> Result<Self> {
        let engine = if schema.is_value_count_mode() {
            Engine::ValueCount
        } else {
            match options.merge_engine {
                MergeEngine::Deduplicate => Engine::Deduplicate,
                MergeEngine::PartialUpdate => Engine::PartialUpdate,
                MergeEngine::FirstRow => Engine::FirstRow,
                MergeEngine::Aggregation => Engine::Aggregate(aggregate_kinds(schema, options)?),
            }
        };
        Ok(Self { engine, value_arity: schema.value_arity(), ignore_delete: options.ignore_delete })
    }

    /// Number of fields in an unprojected value row.
    pub fn value_arity(&self) -> usize {
        self.value_arity
    }

    /// Decides which part of a requested value projection can be pushed into
    /// the file readers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] for an out-of-range or duplicated index,
    /// or for any non-identity projection in value-count mode.
    pub fn adjust_projection(&self, requested: Option<&Projection>) -> Result<AdjustedProjection> {
        let Some(requested) = requested else {
            return Ok(AdjustedProjection::default());
        };
        requested.validate(self.value_arity)?;
        Ok(match self.engine {
            Engine::Deduplicate | Engine::FirstRow | Engine::Aggregate(_) => {
                AdjustedProjection { pushdown: Some(requested.clone()), outer: None }
            }
            // every column may be filled by a different record
            Engine::PartialUpdate => AdjustedProjection { pushdown: None, outer: Some(requested.clone()) },
            Engine::ValueCount => {
                if !requested.is_identity(self.value_arity) {
                    return Err(Error::projection(format!(
                        "value-count tables only accept the projection [0], got {:?}",
                        requested.indices()
                    )));
                }
                AdjustedProjection { pushdown: Some(requested.clone()), outer: None }
            }
        })
    }

    /// Creates a fresh merge function for value rows laid out by `pushdown`.
    pub fn create(&self, pushdown: Option<&Projection>) -> MergeFunction {
        match &self.engine {
            Engine::Deduplicate => {
                MergeFunction::Deduplicate(DeduplicateMergeFunction::new(self.ignore_delete))
            }
            Engine::PartialUpdate => {
                let arity = pushdown.map_or(self.value_arity, Projection::len);
                MergeFunction::PartialUpdate(PartialUpdateMergeFunction::new(arity, self.ignore_delete))
            }
            Engine::Aggregate(kinds) => {
                let kinds = match pushdown {
                    Some(p) => p
                        .indices()
                        .iter()
                        .map(|&i| kinds.get(i).cloned().unwrap_or(AggregateKind::LastNonNullValue))
                        .collect(),
                    None => kinds.clone(),
                };
                MergeFunction::Aggregate(AggregateMergeFunction::new(kinds, self.ignore_delete))
            }
            Engine::FirstRow => MergeFunction::FirstRow(FirstRowMergeFunction::new()),
            Engine::ValueCount => MergeFunction::ValueCount(ValueCountMergeFunction::new()),
        }
    }
}

fn aggregate_kinds(schema: &TableSchema, options: &CoreOptions) -> Result<Vec<AggregateKind>> {
    schema
        .value_field_names()
        .into_iter()
        .map(|name| {
            if schema.primary_keys().iter().any(|k| k == name) {
                return Ok(AggregateKind::PrimaryKey);
            }
            let function = options.aggregate_function_of(name).unwrap_or(DEFAULT_AGGREGATE_FUNCTION);
            let kind = function.parse::<AggregateKind>().map_err(|_| {
                Error::config(format!("unknown aggregate function '{}' for field '{}'", function, name))
            })?;
            Ok(match kind {
                AggregateKind::ListAgg { .. } => AggregateKind::ListAgg {
                    delimiter: options.list_agg_delimiter_of(name).unwrap_or(",").to_string(),
                },
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::KeyValue;
    use crate::row;
    use crate::schema::{DataField, DataType};

    fn schema(primary_keys: &[&str]) -> TableSchema {
        TableSchema::new(
            0,
            vec![
                DataField::new(0, "id", DataType::BigInt),
                DataField::new(1, "name", DataType::String),
                DataField::new(2, "amount", DataType::BigInt),
            ],
            vec![],
            primary_keys.iter().map(|s| s.to_string()).collect(),
            HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_adjust_projection_per_engine() {
        let p = Projection::new(vec![2, 0]);
        let dedup = MergeFunctionFactory::from_schema(&schema(&["id"]), &CoreOptions::default()).unwrap();
        let adjusted = dedup.adjust_projection(Some(&p)).unwrap();
        assert_eq!(adjusted.pushdown, Some(p.clone()));
        assert_eq!(adjusted.outer, None);

        let opts = CoreOptions::default().merge_engine(MergeEngine::PartialUpdate);
        let partial = MergeFunctionFactory::from_schema(&schema(&["id"]), &opts).unwrap();
        let adjusted = partial.adjust_projection(Some(&p)).unwrap();
        assert_eq!(adjusted.pushdown, None);
        assert_eq!(adjusted.outer, Some(p.clone()));

        assert_eq!(dedup.adjust_projection(None).unwrap(), AdjustedProjection::default());
    }

    #[test]
    fn test_invalid_projection() {
        let f = MergeFunctionFactory::from_schema(&schema(&["id"]), &CoreOptions::default()).unwrap();
        assert!(matches!(f.adjust_projection(Some(&Projection::new(vec![3]))), Err(Error::Projection(_))));
        assert!(matches!(
            f.adjust_projection(Some(&Projection::new(vec![1, 1]))),
            Err(Error::Projection(_))
        ));
    }

    #[test]
    fn test_value_count_projection() {
        let f = MergeFunctionFactory::from_schema(&schema(&[]), &CoreOptions::default()).unwrap();
        assert!(matches!(f.create(None), MergeFunction::ValueCount(_)));
        assert!(f.adjust_projection(Some(&Projection::new(vec![0]))).is_ok());
        assert!(matches!(f.adjust_projection(Some(&Projection::new(vec![]))), Err(Error::Projection(_))));
    }

    #[test]
    fn test_unknown_aggregate_function_fails_fast() {
        let opts = CoreOptions::default()
            .merge_engine(MergeEngine::Aggregation)
            .field_aggregate_function("amount", "median");
        assert!(matches!(
            MergeFunctionFactory::from_schema(&schema(&["id"]), &opts),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_aggregate_reindexed_to_pushdown() {
        let opts = CoreOptions::default()
            .merge_engine(MergeEngine::Aggregation)
            .field_aggregate_function("amount", "sum");
        let f = MergeFunctionFactory::from_schema(&schema(&["id"]), &opts).unwrap();
        let pushdown = Projection::new(vec![2, 0]);
        let mut mf = f.create(Some(&pushdown));
        mf.reset();
        mf.add(KeyValue::insert(row![1], 1, row![5, 1])).unwrap();
        mf.add(KeyValue::insert(row![1], 2, row![7, 1])).unwrap();
        assert_eq!(mf.result().unwrap().unwrap().value(), &row![12, 1]);
    }
}
