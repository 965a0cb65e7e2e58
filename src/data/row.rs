//! Scalar datums and rows.

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A nullable scalar value stored in one column of a row.
///
/// Datums are totally ordered: `Null` sorts first, numbers compare by value
/// across `Int` and `Double` without rounding (doubles use IEEE total
/// ordering, except that both zeros are equal), and values of unrelated types
/// compare by type rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    /// SQL `NULL`.
    Null,
    /// A boolean.
    Boolean(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Double(f64),
    /// A UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl Datum {
    /// Returns true if this datum is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(v) => Some(v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Boolean(_) => 1,
            Datum::Int(_) | Datum::Double(_) => 2,
            Datum::String(_) => 3,
            Datum::Bytes(_) => 4,
        }
    }
}

impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Boolean(a), Datum::Boolean(b)) => a.cmp(b),
            (Datum::Int(a), Datum::Int(b)) => a.cmp(b),
            // -0.0 and 0.0 both equal Int(0), so they must equal each other
            (Datum::Double(a), Datum::Double(b)) if a == b => Ordering::Equal,
            (Datum::Double(a), Datum::Double(b)) => a.total_cmp(b),
            (Datum::Int(a), Datum::Double(b)) => cmp_int_double(*a, *b),
            (Datum::Double(a), Datum::Int(b)) => cmp_int_double(*b, *a).reverse(),
            (Datum::String(a), Datum::String(b)) => a.cmp(b),
            (Datum::Bytes(a), Datum::Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Exact comparison of an integer with a float; no rounding through `f64`.
fn cmp_int_double(i: i64, d: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    if d.is_nan() {
        return if d.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
    }
    if d >= I64_END {
        return Ordering::Less;
    }
    if d < -I64_END {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&d).unwrap_or(Ordering::Equal),
        other => other,
    }
}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Datum {}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Boolean(v) => write!(f, "{}", v),
            Datum::Int(v) => write!(f, "{}", v),
            Datum::Double(v) => write!(f, "{}", v),
            Datum::String(v) => write!(f, "{}", v),
            Datum::Bytes(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int(v as i64)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Double(v)
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Boolean(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::String(v)
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        v.map_or(Datum::Null, Into::into)
    }
}

/// An ordered list of datums; used for both keys and values.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<Datum>);

impl Row {
    /// Creates a row from its fields.
    pub fn new(fields: Vec<Datum>) -> Self {
        Self(fields)
    }

    /// Creates an empty row.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of fields in the row.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Returns the field at `pos`, if present.
    pub fn get(&self, pos: usize) -> Option<&Datum> {
        self.0.get(pos)
    }

    /// Returns true if the field at `pos` is missing or `NULL`.
    pub fn is_null_at(&self, pos: usize) -> bool {
        self.0.get(pos).map_or(true, Datum::is_null)
    }

    /// Borrows the fields.
    pub fn fields(&self) -> &[Datum] {
        &self.0
    }
}

impl From<Vec<Datum>> for Row {
    fn from(fields: Vec<Datum>) -> Self {
        Self(fields)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str(")")
    }
}

/// Builds a [`Row`] from a list of values convertible into [`Datum`].
///
/// ```rust
/// use mergetree::{row, Datum};
///
/// let r = row![1, "a", Datum::Null];
/// assert_eq!(r.arity(), 3);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::empty() };
    ($($v:expr),+ $(,)?) => {
        $crate::Row::new(vec![$($crate::Datum::from($v)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_ordering() {
        assert!(Datum::Null < Datum::Int(i64::MIN));
        assert!(Datum::Int(1) < Datum::Int(2));
        assert!(Datum::Int(1) < Datum::Double(1.5));
        assert_eq!(Datum::Int(2), Datum::Double(2.0));
        assert!(Datum::from("a") < Datum::from("b"));
        assert!(Datum::Boolean(true) < Datum::Int(0));
    }

    #[test]
    fn test_int_double_ordering_is_exact() {
        let big = 1i64 << 53;
        let d = Datum::Double(big as f64);
        assert_eq!(Datum::Int(big), d);
        assert!(Datum::Int(big + 1) > d);
        assert!(d < Datum::Int(big + 1));
        assert!(Datum::Int(i64::MAX) < Datum::Double(9_223_372_036_854_775_808.0));
        assert!(Datum::Int(i64::MIN) == Datum::Double(-9_223_372_036_854_775_808.0));
        assert!(Datum::Int(-3) > Datum::Double(-3.5));
        assert!(Datum::Int(-3) < Datum::Double(-2.5));
        assert!(Datum::Int(0) < Datum::Double(f64::NAN));
        assert!(Datum::Int(0) > Datum::Double(-f64::NAN));
        assert_eq!(Datum::Double(-0.0), Datum::Double(0.0));

        // sorting mixed values around 2^53 must be consistent
        let mut values = vec![
            Datum::Int(big + 1),
            Datum::Double(big as f64),
            Datum::Int(big),
            Datum::Double((big + 2) as f64),
            Datum::Int(big - 1),
        ];
        values.sort();
        for w in values.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert_eq!(values[0], Datum::Int(big - 1));
        assert_eq!(values[4], Datum::Double((big + 2) as f64));
    }

    #[test]
    fn test_row_ordering_is_lexicographic() {
        let a = Row::new(vec![Datum::Int(1), Datum::from("z")]);
        let b = Row::new(vec![Datum::Int(2), Datum::from("a")]);
        let c = Row::new(vec![Datum::Int(1)]);
        assert!(a < b);
        assert!(c < a);
    }

    #[test]
    fn test_row_serde_is_transparent() {
        let r = Row::new(vec![Datum::Int(1), Datum::Null]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"[{"Int":1},"Null"]"#);
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_row_macro() {
        let r = crate::row![1, "x", None::<i64>];
        assert_eq!(r.get(0), Some(&Datum::Int(1)));
        assert!(r.is_null_at(2));
        assert!(r.is_null_at(5));
    }
}
