//! Per-column aggregation merge.

use std::str::FromStr;

use crate::data::{Datum, KeyValue, Row, RowKind};
use crate::error::{Error, Result};

/// Aggregate functions available to `fields.<name>.aggregate-function`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateKind {
    /// Primary-key columns: keep the latest value.
    PrimaryKey,
    /// Numeric sum; retractable.
    Sum,
    /// Minimum non-null value.
    Min,
    /// Maximum non-null value.
    Max,
    /// Latest value, nulls included.
    LastValue,
    /// Latest non-null value.
    LastNonNullValue,
    /// Earliest value, nulls included.
    FirstValue,
    /// Earliest non-null value.
    FirstNonNullValue,
    /// String concatenation of non-null values.
    ListAgg {
        /// Separator between values.
        delimiter: String,
    },
    /// Logical AND of non-null booleans.
    BoolAnd,
    /// Logical OR of non-null booleans.
    BoolOr,
    /// Number of non-null values; retractable.
    Count,
}

impl AggregateKind {
    /// The option value naming this function.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::PrimaryKey => "primary-key",
            AggregateKind::Sum => "sum",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::LastValue => "last_value",
            AggregateKind::LastNonNullValue => "last_non_null_value",
            AggregateKind::FirstValue => "first_value",
            AggregateKind::FirstNonNullValue => "first_non_null_value",
            AggregateKind::ListAgg { .. } => "listagg",
            AggregateKind::BoolAnd => "bool_and",
            AggregateKind::BoolOr => "bool_or",
            AggregateKind::Count => "count",
        }
    }
}

impl FromStr for AggregateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "primary-key" => AggregateKind::PrimaryKey,
            "sum" => AggregateKind::Sum,
            "min" => AggregateKind::Min,
            "max" => AggregateKind::Max,
            "last_value" => AggregateKind::LastValue,
            "last_non_null_value" => AggregateKind::LastNonNullValue,
            "first_value" => AggregateKind::FirstValue,
            "first_non_null_value" => AggregateKind::FirstNonNullValue,
            "listagg" => AggregateKind::ListAgg { delimiter: ",".to_string() },
            "bool_and" => AggregateKind::BoolAnd,
            "bool_or" => AggregateKind::BoolOr,
            "count" => AggregateKind::Count,
            other => {
                return Err(Error::config(format!("unknown aggregate function '{}'", other)))
            }
        })
    }
}

/// Running state of one column's aggregate.
#[derive(Debug, Clone)]
pub struct FieldAggregator {
    kind: AggregateKind,
    acc: Datum,
    initialized: bool,
}

impl FieldAggregator {
    /// Creates an empty aggregator.
    pub fn new(kind: AggregateKind) -> Self {
        Self { kind, acc: Datum::Null, initialized: false }
    }

    /// The aggregate function.
    pub fn kind(&self) -> &AggregateKind {
        &self.kind
    }

    /// Clears the state.
    pub fn reset(&mut self) {
        self.acc = Datum::Null;
        self.initialized = false;
    }

    /// Folds `input` into the state.
    pub fn agg(&mut self, input: &Datum) -> Result<()> {
        let first = !self.initialized;
        self.initialized = true;
        match &self.kind {
            AggregateKind::PrimaryKey | AggregateKind::LastValue => self.acc = input.clone(),
            AggregateKind::LastNonNullValue => {
                if !input.is_null() {
                    self.acc = input.clone();
                }
            }
            AggregateKind::FirstValue => {
                if first {
                    self.acc = input.clone();
                }
            }
            AggregateKind::FirstNonNullValue => {
                if self.acc.is_null() {
                    self.acc = input.clone();
                }
            }
            AggregateKind::Sum => self.acc = add(&self.acc, input, false)?,
            AggregateKind::Count => {
                if !input.is_null() {
                    self.acc = Datum::Int(self.acc.as_int().unwrap_or(0) + 1);
                } else if self.acc.is_null() {
                    self.acc = Datum::Int(0);
                }
            }
            AggregateKind::Min => {
                if !input.is_null() && (self.acc.is_null() || input < &self.acc) {
                    self.acc = input.clone();
                }
            }
            AggregateKind::Max => {
                if !input.is_null() && (self.acc.is_null() || input > &self.acc) {
                    self.acc = input.clone();
                }
            }
            AggregateKind::ListAgg { delimiter } => match (&self.acc, input) {
                (_, Datum::Null) => {}
                (Datum::Null, Datum::String(s)) => self.acc = Datum::String(s.clone()),
                (Datum::String(acc), Datum::String(s)) => {
                    self.acc = Datum::String(format!("{}{}{}", acc, delimiter, s))
                }
                _ => return Err(Error::unsupported("listagg only aggregates strings")),
            },
            AggregateKind::BoolAnd | AggregateKind::BoolOr => {
                if input.is_null() {
                    return Ok(());
                }
                let v = input
                    .as_bool()
                    .ok_or_else(|| Error::unsupported(format!("{} only aggregates booleans", self.kind.name())))?;
                self.acc = match (self.acc.as_bool(), &self.kind) {
                    (None, _) => Datum::Boolean(v),
                    (Some(a), AggregateKind::BoolAnd) => Datum::Boolean(a && v),
                    (Some(a), _) => Datum::Boolean(a || v),
                };
            }
        }
        Ok(())
    }

    /// Removes `input` from the state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for functions that cannot retract.
    pub fn retract(&mut self, input: &Datum) -> Result<()> {
        match &self.kind {
            AggregateKind::PrimaryKey => self.acc = input.clone(),
            AggregateKind::LastValue => self.acc = Datum::Null,
            AggregateKind::LastNonNullValue => {
                if !input.is_null() {
                    self.acc = Datum::Null;
                }
            }
            AggregateKind::Sum => self.acc = add(&self.acc, input, true)?,
            AggregateKind::Count => {
                if !input.is_null() {
                    self.acc = Datum::Int(self.acc.as_int().unwrap_or(0) - 1);
                }
            }
            other => {
                return Err(Error::unsupported(format!(
                    "aggregate function '{}' does not support retraction",
                    other.name()
                )))
            }
        }
        Ok(())
    }

    /// Current aggregated value.
    pub fn result(&self) -> Datum {
        self.acc.clone()
    }
}

fn add(acc: &Datum, input: &Datum, negate: bool) -> Result<Datum> {
    Ok(match (acc, input) {
        (_, Datum::Null) => acc.clone(),
        (Datum::Null, Datum::Int(v)) => Datum::Int(if negate { v.wrapping_neg() } else { *v }),
        (Datum::Null, Datum::Double(v)) => Datum::Double(if negate { -v } else { *v }),
        (Datum::Int(a), Datum::Int(b)) => {
            Datum::Int(if negate { a.wrapping_sub(*b) } else { a.wrapping_add(*b) })
        }
        (Datum::Int(a), Datum::Double(b)) => Datum::Double(signed(*a as f64, *b, negate)),
        (Datum::Double(a), Datum::Int(b)) => Datum::Double(signed(*a, *b as f64, negate)),
        (Datum::Double(a), Datum::Double(b)) => Datum::Double(signed(*a, *b, negate)),
        _ => return Err(Error::unsupported("sum only aggregates numbers")),
    })
}

fn signed(a: f64, b: f64, negate: bool) -> f64 {
    if negate {
        a - b
    } else {
        a + b
    }
}

/// Folds each value column with its own [`FieldAggregator`].
#[derive(Debug, Clone)]
pub struct AggregateMergeFunction {
    aggregators: Vec<FieldAggregator>,
    ignore_delete: bool,
    key: Option<Row>,
    sequence_number: u64,
}

impl AggregateMergeFunction {
    /// Creates the merge function; `kinds[i]` aggregates value column `i`.
    pub fn new(kinds: Vec<AggregateKind>, ignore_delete: bool) -> Self {
        Self {
            aggregators: kinds.into_iter().map(FieldAggregator::new).collect(),
            ignore_delete,
            key: None,
            sequence_number: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.aggregators.iter_mut().for_each(FieldAggregator::reset);
        self.key = None;
        self.sequence_number = 0;
    }

    pub(crate) fn add(&mut self, kv: KeyValue) -> Result<()> {
        let retract = kv.kind().is_retract();
        if retract && self.ignore_delete {
            return Ok(());
        }
        for (i, agg) in self.aggregators.iter_mut().enumerate() {
            let input = kv.value().get(i).unwrap_or(&Datum::Null);
            if retract {
                agg.retract(input)?;
            } else {
                agg.agg(input)?;
            }
        }
        self.sequence_number = kv.sequence_number();
        self.key = Some(kv.key().clone());
        Ok(())
    }

    pub(crate) fn result(&mut self) -> Option<KeyValue> {
        let key = self.key.take()?;
        let row = Row::new(self.aggregators.iter().map(FieldAggregator::result).collect());
        Some(KeyValue::new(key, self.sequence_number, RowKind::Insert, row))
    }
}
