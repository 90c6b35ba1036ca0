//! Per-resource filter declarations
//!
//! A `FilterSpec` lists which filter-map keys a resource accepts under each
//! category, the handlers for special keys, and the relations that may be
//! eagerly included. It is validated once at construction and read-only
//! afterwards, so a single spec can be shared by every request.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::data::error::SearchError;

use super::predicate::PredicateSet;
use super::value::FilterValue;

/// Filter category, in compile order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterCategory {
    Normal,
    Range,
    Not,
    Contain,
    Special,
}

impl FilterCategory {
    pub const COMPILE_ORDER: [FilterCategory; 5] = [
        FilterCategory::Normal,
        FilterCategory::Range,
        FilterCategory::Not,
        FilterCategory::Contain,
        FilterCategory::Special,
    ];

    /// Key prefix stripped to obtain the underlying field name
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            FilterCategory::Not => Some("not_"),
            FilterCategory::Range => Some("range_"),
            FilterCategory::Contain => Some("contain_"),
            FilterCategory::Normal | FilterCategory::Special => None,
        }
    }

    /// Field name for a declared key: exact prefix removal, key unchanged otherwise
    pub fn field_name<'a>(&self, key: &'a str) -> &'a str {
        self.prefix()
            .and_then(|prefix| key.strip_prefix(prefix))
            .filter(|field| !field.is_empty())
            .unwrap_or(key)
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterCategory::Normal => "normal",
            FilterCategory::Range => "range",
            FilterCategory::Not => "not",
            FilterCategory::Contain => "contain",
            FilterCategory::Special => "special",
        };
        f.write_str(name)
    }
}

/// Handler for a special filter key
///
/// Receives the request's predicate set and the (non-blank) filter value.
pub type SpecialHandler =
    Arc<dyn Fn(&mut PredicateSet, &FilterValue) -> Result<(), SearchError> + Send + Sync>;

/// Validated filter declaration for one resource
#[derive(Clone)]
pub struct FilterSpec {
    fields: BTreeMap<FilterCategory, BTreeSet<String>>,
    handlers: BTreeMap<String, SpecialHandler>,
    includes: BTreeSet<String>,
}

impl FilterSpec {
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// Declared keys of a category, in sorted order
    pub fn fields(&self, category: FilterCategory) -> impl Iterator<Item = &str> {
        self.fields
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Category a key was declared under
    pub fn category_of(&self, key: &str) -> Option<FilterCategory> {
        FilterCategory::COMPILE_ORDER
            .into_iter()
            .find(|category| self.fields.get(category).is_some_and(|set| set.contains(key)))
    }

    pub fn handler(&self, key: &str) -> Option<&SpecialHandler> {
        self.handlers.get(key)
    }

    /// Keep only whitelisted relations, preserving request order and dropping duplicates
    pub fn allowed_includes(&self, requested: &[String]) -> Vec<String> {
        let mut allowed: Vec<String> = Vec::new();
        for relation in requested {
            if !self.includes.contains(relation) {
                tracing::debug!(%relation, "Dropping non-includable relation");
                continue;
            }
            if !allowed.contains(relation) {
                allowed.push(relation.clone());
            }
        }
        allowed
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSpec")
            .field("fields", &self.fields)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("includes", &self.includes)
            .finish()
    }
}

/// Builder collecting declarations before validation
#[derive(Default)]
pub struct FilterSpecBuilder {
    declared: Vec<(FilterCategory, String)>,
    handlers: BTreeMap<String, SpecialHandler>,
    includes: BTreeSet<String>,
}

impl FilterSpecBuilder {
    fn declare<I, S>(mut self, category: FilterCategory, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared
            .extend(keys.into_iter().map(|key| (category, key.into())));
        self
    }

    /// Equality/inclusion keys (bare field names)
    pub fn normal<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(FilterCategory::Normal, keys)
    }

    /// Negated keys, conventionally `not_<field>`
    pub fn not<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(FilterCategory::Not, keys)
    }

    /// Range keys, conventionally `range_<field>`
    pub fn range<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(FilterCategory::Range, keys)
    }

    /// Substring keys, conventionally `contain_<field>`
    pub fn contain<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(FilterCategory::Contain, keys)
    }

    /// Special keys; each needs a handler registered with [`Self::handler`]
    pub fn special<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(FilterCategory::Special, keys)
    }

    pub fn handler<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut PredicateSet, &FilterValue) -> Result<(), SearchError> + Send + Sync + 'static,
    {
        self.handlers.insert(key.into(), Arc::new(handler));
        self
    }

    /// Relations that may be eagerly included
    pub fn includes<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(relations.into_iter().map(Into::into));
        self
    }

    /// Validate declarations
    ///
    /// A key declared under two categories fails with `DuplicateField`; a
    /// special key without a handler fails with `HandlerNotFound`.
    pub fn build(self) -> Result<FilterSpec, SearchError> {
        let mut seen: BTreeMap<String, FilterCategory> = BTreeMap::new();
        let mut fields: BTreeMap<FilterCategory, BTreeSet<String>> = BTreeMap::new();

        for (category, key) in self.declared {
            if let Some(first) = seen.get(&key) {
                if *first == category {
                    continue;
                }
                return Err(SearchError::DuplicateField {
                    field: key,
                    first: *first,
                    second: category,
                });
            }
            seen.insert(key.clone(), category);
            fields.entry(category).or_default().insert(key);
        }

        let specials = fields.get(&FilterCategory::Special);
        for key in specials.into_iter().flatten() {
            if !self.handlers.contains_key(key) {
                return Err(SearchError::handler_not_found(key.clone()));
            }
        }

        let mut handlers = self.handlers;
        handlers.retain(|key, _| {
            let declared = specials.is_some_and(|set| set.contains(key));
            if !declared {
                tracing::warn!(%key, "Ignoring handler for undeclared special filter");
            }
            declared
        });

        Ok(FilterSpec {
            fields,
            handlers,
            includes: self.includes,
        })
    }
}
