//! Row and record model.
//!
//! - [`Datum`] / [`Row`]: nullable scalar values and ordered rows of them
//! - [`KeyValue`]: a key row, a value row, a sequence number and a [`RowKind`]
//! - [`Projection`]: top-level field selection
//! - [`KeyComparator`]: the configured key order

pub mod comparator;
pub mod key_value;
pub mod projection;
pub mod row;

pub use comparator::KeyComparator;
pub use key_value::{KeyValue, RowKind};
pub use projection::Projection;
pub use row::{Datum, Row};
