//! Top-level column projection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Datum, Row};
use crate::error::{Error, Result};

/// An ordered selection of top-level field indices.
///
/// An absent projection (`Option::None` at the call sites) means identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projection(Vec<usize>);

impl Projection {
    /// Creates a projection from field indices.
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The identity projection over `arity` fields.
    pub fn identity(arity: usize) -> Self {
        Self((0..arity).collect())
    }

    /// The projected field indices, in output order.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of output fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this projection selects `0..arity` in order.
    pub fn is_identity(&self, arity: usize) -> bool {
        self.0.len() == arity && self.0.iter().enumerate().all(|(i, &f)| i == f)
    }

    /// Checks every index is below `arity` and appears once.
    pub fn validate(&self, arity: usize) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for &f in &self.0 {
            if f >= arity {
                return Err(Error::projection(format!(
                    "field index {} out of range for a row of {} fields",
                    f, arity
                )));
            }
            if !seen.insert(f) {
                return Err(Error::projection(format!("field index {} projected twice", f)));
            }
        }
        Ok(())
    }

    /// Projects `row`. Missing fields come out as `NULL`.
    pub fn apply(&self, row: &Row) -> Row {
        Row::new(
            self.0
                .iter()
                .map(|&f| row.get(f).cloned().unwrap_or(Datum::Null))
                .collect(),
        )
    }
}

impl From<Vec<usize>> for Projection {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Projection {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}
