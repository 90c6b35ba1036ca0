//! Predicate compiler
//!
//! Classifies a filter map against a [`FilterSpec`] and emits backend-neutral
//! predicates. Categories run in a fixed order (normal, range, not, contain,
//! special) followed by the optional existence pass. Keys that are absent or
//! blank produce nothing; keys the `FilterSpec` does not declare are ignored.

use super::predicate::{Predicate, PredicateSet};
use super::range;
use super::spec::{FilterCategory, FilterSpec};
use super::value::{FilterMap, FilterValue, Scalar, present};
use crate::data::error::SearchError;

/// Reserved key listing fields that must exist
pub const EXIST_FIELD_KEY: &str = "exist_field";

/// Options that depend on the target backend
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Read the reserved `exist_field` key
    pub existence_pass: bool,
}

/// Compile a filter map into a fresh predicate set
pub fn compile(
    spec: &FilterSpec,
    filters: &FilterMap,
    options: CompileOptions,
) -> Result<PredicateSet, SearchError> {
    let mut predicates = PredicateSet::new();

    for category in FilterCategory::COMPILE_ORDER {
        for key in spec.fields(category) {
            let Some(value) = present(filters, key) else {
                continue;
            };
            let field = category.field_name(key);
            match category {
                FilterCategory::Normal => {
                    predicates.push(membership(field, value, false));
                }
                FilterCategory::Not => {
                    predicates.push(membership(field, value, true));
                }
                FilterCategory::Range => {
                    for bound in range::parse_tokens(value) {
                        predicates.push(Predicate::range(field, bound.op, bound.bound));
                    }
                }
                FilterCategory::Contain => {
                    for needle in value.as_slice() {
                        let needle = needle.to_string();
                        if !needle.is_empty() {
                            predicates.push(Predicate::contains(field, needle));
                        }
                    }
                }
                FilterCategory::Special => {
                    let handler = spec
                        .handler(key)
                        .ok_or_else(|| SearchError::handler_not_found(key))?;
                    handler(&mut predicates, value)?;
                }
            }
        }
    }

    if options.existence_pass
        && let Some(value) = present(filters, EXIST_FIELD_KEY)
    {
        for field in value.as_slice() {
            let field = field.to_string();
            if !field.is_empty() {
                predicates.push(Predicate::exists(field));
            }
        }
    }

    tracing::debug!(
        filter_keys = filters.len(),
        predicates = predicates.len(),
        "Compiled filters"
    );
    Ok(predicates)
}

/// Equality for scalars, inclusion for lists, negated when asked
fn membership(field: &str, value: &FilterValue, negated: bool) -> Predicate {
    match (value, negated) {
        (FilterValue::List(values), false) => Predicate::is_in(field, values.clone()),
        (FilterValue::List(values), true) => Predicate::not_in(field, values.clone()),
        (other, false) => Predicate::equals(field, first_scalar(other)),
        (other, true) => Predicate::not_equals(field, first_scalar(other)),
    }
}

fn first_scalar(value: &FilterValue) -> Scalar {
    value
        .as_slice()
        .first()
        .cloned()
        .unwrap_or_else(|| Scalar::Text(String::new()))
}
