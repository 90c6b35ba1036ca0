//! Backend-neutral predicates
//!
//! Every predicate in a set is ANDed with the others. Inside `In`/`NotIn`
//! the listed values are alternatives.

use super::range::RangeOp;
use super::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { field: String, value: Scalar },
    In { field: String, values: Vec<Scalar> },
    NotEquals { field: String, value: Scalar },
    NotIn { field: String, values: Vec<Scalar> },
    Range { field: String, op: RangeOp, bound: String },
    Contains { field: String, value: String },
    Exists { field: String },
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_in(field: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::NotIn {
            field: field.into(),
            values,
        }
    }

    pub fn range(field: impl Into<String>, op: RangeOp, bound: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            op,
            bound: bound.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. }
            | Self::In { field, .. }
            | Self::NotEquals { field, .. }
            | Self::NotIn { field, .. }
            | Self::Range { field, .. }
            | Self::Contains { field, .. }
            | Self::Exists { field } => field,
        }
    }
}

/// Ordered predicates produced for one request
///
/// Special-filter handlers receive a mutable reference and push whatever
/// predicates they need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn into_vec(self) -> Vec<Predicate> {
        self.predicates
    }
}

impl<'a> IntoIterator for &'a PredicateSet {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
