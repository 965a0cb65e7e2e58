//! Row predicates used for filter pushdown.
//!
//! Predicates reference table fields by name and by position in the table row.
//! For primary-key tables a value row is the table row; for tables without
//! primary keys the key row is. Evaluation follows SQL three-valued logic: a
//! row passes only when the predicate is definitely true.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::data::{Datum, Row};
use crate::error::{Error, Result};
use crate::schema::TableSchema;

/// Comparison operator used by binary predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl CompareOp {
    fn matches(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Equal => ord == Equal,
            CompareOp::NotEqual => ord != Equal,
            CompareOp::LessThan => ord == Less,
            CompareOp::LessThanOrEqual => ord != Greater,
            CompareOp::GreaterThan => ord == Greater,
            CompareOp::GreaterThanOrEqual => ord != Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
        })
    }
}

/// A reference to a table field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Position of the field in the table row.
    pub index: usize,
    /// Field name.
    pub name: String,
}

impl FieldRef {
    /// Creates a field reference.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into() }
    }
}

/// A predicate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `field <op> literal`.
    Compare {
        /// Field under test.
        field: FieldRef,
        /// Operator.
        op: CompareOp,
        /// Right-hand literal.
        literal: Datum,
    },
    /// `field [NOT] IN (list)`.
    InList {
        /// Field under test.
        field: FieldRef,
        /// Candidate literals.
        list: Vec<Datum>,
        /// True for `NOT IN`.
        negated: bool,
    },
    /// `field IS [NOT] NULL`.
    IsNull {
        /// Field under test.
        field: FieldRef,
        /// True for `IS NOT NULL`.
        negated: bool,
    },
    /// Logical negation.
    Not(Box<Predicate>),
    /// Conjunction.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Builds a conjunction, flattening nested conjunctions.
    ///
    /// Returns `None` when no clause is supplied.
    pub fn and<I>(clauses: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause {
                Predicate::And(mut nested) => acc.append(&mut nested),
                other => acc.push(other),
            }
        }
        match acc.len() {
            0 => None,
            1 => acc.pop(),
            _ => Some(Predicate::And(acc)),
        }
    }

    /// Builds a disjunction, flattening nested disjunctions.
    ///
    /// Returns `None` when no clause is supplied.
    pub fn or<I>(clauses: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause {
                Predicate::Or(mut nested) => acc.append(&mut nested),
                other => acc.push(other),
            }
        }
        match acc.len() {
            0 => None,
            1 => acc.pop(),
            _ => Some(Predicate::Or(acc)),
        }
    }

    /// Negates this predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// Names of every field this predicate reads.
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::Compare { field, .. }
            | Predicate::InList { field, .. }
            | Predicate::IsNull { field, .. } => {
                out.insert(field.name.as_str());
            }
            Predicate::Not(inner) => inner.collect_fields(out),
            Predicate::And(children) | Predicate::Or(children) => {
                for c in children {
                    c.collect_fields(out);
                }
            }
        }
    }

    /// Returns true if the predicate reads any field in `fields`.
    pub fn contains_fields(&self, fields: &HashSet<String>) -> bool {
        self.referenced_fields().iter().any(|f| fields.contains(*f))
    }

    /// Evaluates against a table row; `true` only when definitely satisfied.
    pub fn test(&self, row: &Row) -> bool {
        self.eval(row) == Some(true)
    }

    fn eval(&self, row: &Row) -> Option<bool> {
        match self {
            Predicate::Compare { field, op, literal } => {
                let value = non_null(row, field)?;
                if literal.is_null() {
                    return None;
                }
                Some(op.matches(value.cmp(literal)))
            }
            Predicate::InList { field, list, negated } => {
                let value = non_null(row, field)?;
                let mut saw_null = false;
                for candidate in list {
                    if candidate.is_null() {
                        saw_null = true;
                    } else if candidate == value {
                        return Some(!negated);
                    }
                }
                if saw_null {
                    None
                } else {
                    Some(*negated)
                }
            }
            Predicate::IsNull { field, negated } => Some(row.is_null_at(field.index) != *negated),
            Predicate::Not(inner) => inner.eval(row).map(|b| !b),
            Predicate::And(children) => {
                let mut result = Some(true);
                for c in children {
                    match c.eval(row) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Predicate::Or(children) => {
                let mut result = Some(false);
                for c in children {
                    match c.eval(row) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
        }
    }
}

fn non_null<'a>(row: &'a Row, field: &FieldRef) -> Option<&'a Datum> {
    row.get(field.index).filter(|d| !d.is_null())
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, op, literal } => {
                write!(f, "{} {} {}", field.name, op, literal)
            }
            Predicate::InList { field, list, negated } => {
                let items: Vec<String> = list.iter().map(|d| d.to_string()).collect();
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}IN ({})", field.name, not, items.join(", "))
            }
            Predicate::IsNull { field, negated } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} IS {}NULL", field.name, not)
            }
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
            Predicate::And(children) => write_joined(f, children, " AND "),
            Predicate::Or(children) => write_joined(f, children, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    for (i, c) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "({})", c)?;
    }
    Ok(())
}

/// Splits a predicate into its top-level conjuncts.
pub fn split_and(predicate: &Predicate) -> Vec<Predicate> {
    match predicate {
        Predicate::And(children) => children.iter().flat_map(split_and).collect(),
        other => vec![other.clone()],
    }
}

/// Resolves field names against a table schema and builds predicates.
pub struct PredicateBuilder<'a> {
    schema: &'a TableSchema,
}

impl<'a> PredicateBuilder<'a> {
    /// Creates a builder over `schema`.
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    fn field(&self, name: &str) -> Result<FieldRef> {
        self.schema
            .field_index(name)
            .map(|index| FieldRef::new(index, name))
            .ok_or_else(|| Error::invalid_argument(format!("unknown field '{}'", name)))
    }

    fn compare(&self, name: &str, op: CompareOp, literal: impl Into<Datum>) -> Result<Predicate> {
        Ok(Predicate::Compare { field: self.field(name)?, op, literal: literal.into() })
    }

    /// `name = literal`
    pub fn equal(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::Equal, literal)
    }

    /// `name != literal`
    pub fn not_equal(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::NotEqual, literal)
    }

    /// `name < literal`
    pub fn less_than(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::LessThan, literal)
    }

    /// `name <= literal`
    pub fn less_or_equal(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::LessThanOrEqual, literal)
    }

    /// `name > literal`
    pub fn greater_than(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::GreaterThan, literal)
    }

    /// `name >= literal`
    pub fn greater_or_equal(&self, name: &str, literal: impl Into<Datum>) -> Result<Predicate> {
        self.compare(name, CompareOp::GreaterThanOrEqual, literal)
    }

    /// `name IN (list)`
    pub fn is_in(&self, name: &str, list: Vec<Datum>) -> Result<Predicate> {
        Ok(Predicate::InList { field: self.field(name)?, list, negated: false })
    }

    /// `name IS NULL`
    pub fn is_null(&self, name: &str) -> Result<Predicate> {
        Ok(Predicate::IsNull { field: self.field(name)?, negated: false })
    }

    /// `name IS NOT NULL`
    pub fn is_not_null(&self, name: &str) -> Result<Predicate> {
        Ok(Predicate::IsNull { field: self.field(name)?, negated: true })
    }
}
