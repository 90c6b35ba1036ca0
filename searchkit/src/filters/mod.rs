//! Filter classification and translation
//!
//! Turns a loosely-typed filter map into backend-neutral predicates.
//! Keys follow naming conventions that encode intent:
//!
//! | Key               | Category            | Example                                       |
//! |-------------------|---------------------|-----------------------------------------------|
//! | `<field>`         | equality/inclusion  | `"course_id": [111, 222]`                     |
//! | `not_<field>`     | negated             | `"not_grade": [2, 3]`                         |
//! | `range_<field>`   | range               | `"range_day": [">2019-06-01", "<2019-07-01"]` |
//! | `contain_<field>` | substring           | `"contain_real_name": "x"`                    |
//! | `exist_field`     | existence           | `"exist_field": ["email"]`                    |
//! | special keys      | handler dispatch    | resource-defined                              |
//!
//! ## Usage
//!
//! ```
//! use searchkit::filters::{compile, parse_filter_map, CompileOptions, FilterSpec};
//!
//! let spec = FilterSpec::builder()
//!     .normal(["course_id"])
//!     .range(["range_day"])
//!     .build()
//!     .unwrap();
//! let filters = parse_filter_map(r#"{"course_id": [1, 2], "range_day": ">2019-06-01"}"#).unwrap();
//! let predicates = compile(&spec, &filters, CompileOptions::default()).unwrap();
//! assert_eq!(predicates.len(), 2);
//! ```

mod compiler;
mod predicate;
mod range;
mod spec;
mod value;

pub use compiler::{CompileOptions, EXIST_FIELD_KEY, compile};
pub use predicate::{Predicate, PredicateSet};
pub use range::{RangeBound, RangeOp, parse_token, parse_tokens};
pub use spec::{FilterCategory, FilterSpec, FilterSpecBuilder, SpecialHandler};
pub use value::{FilterMap, FilterValue, Scalar, parse_filter_map, present};
