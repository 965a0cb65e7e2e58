//! Key ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Row;

type CompareFn = dyn Fn(&Row, &Row) -> Ordering + Send + Sync;

/// A cheaply cloneable total order over key rows.
#[derive(Clone)]
pub struct KeyComparator {
    cmp: Arc<CompareFn>,
}

impl KeyComparator {
    /// Wraps a custom ordering.
    pub fn new<F>(cmp: F) -> Self
    where
        F: Fn(&Row, &Row) -> Ordering + Send + Sync + 'static,
    {
        Self { cmp: Arc::new(cmp) }
    }

    /// Field-by-field natural ordering of datums.
    pub fn natural() -> Self {
        Self::new(|a, b| a.cmp(b))
    }

    /// Orders keys in descending natural order.
    pub fn reversed(&self) -> Self {
        let inner = Arc::clone(&self.cmp);
        Self::new(move |a, b| inner(b, a))
    }

    /// Compares two keys.
    #[inline]
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        (self.cmp)(a, b)
    }
}

impl Default for KeyComparator {
    fn default() -> Self {
        Self::natural()
    }
}

impl fmt::Debug for KeyComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyComparator")
    }
}
