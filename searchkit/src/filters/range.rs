//! Range token parsing
//!
//! A range token is a comparison operator followed by a bound, e.g.
//! `">=2019-06-01"`. Operators are matched longest first so that `>=` is
//! never read as `>` with a bound of `"=2019-06-01"`.

use std::fmt;

use super::value::FilterValue;

/// Comparison operator of a range token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl RangeOp {
    /// Scan order: two-character operators before their one-character prefixes
    pub const SCAN_ORDER: [RangeOp; 4] = [RangeOp::Gte, RangeOp::Lte, RangeOp::Gt, RangeOp::Lt];

    /// Token symbol, also the SQL comparison operator
    pub fn symbol(&self) -> &'static str {
        match self {
            RangeOp::Gte => ">=",
            RangeOp::Lte => "<=",
            RangeOp::Gt => ">",
            RangeOp::Lt => "<",
        }
    }

    /// Search-engine range clause key
    pub fn search_key(&self) -> &'static str {
        match self {
            RangeOp::Gte => "gte",
            RangeOp::Lte => "lte",
            RangeOp::Gt => "gt",
            RangeOp::Lt => "lt",
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One parsed `(operator, bound)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBound {
    pub op: RangeOp,
    pub bound: String,
}

/// Parse a single token; `None` when no operator prefixes it or the bound is empty
pub fn parse_token(token: &str) -> Option<RangeBound> {
    RangeOp::SCAN_ORDER.iter().find_map(|op| {
        token
            .strip_prefix(op.symbol())
            .filter(|bound| !bound.is_empty())
            .map(|bound| RangeBound {
                op: *op,
                bound: bound.to_string(),
            })
    })
}

/// Parse every token of a scalar or list value, dropping unrecognized ones
pub fn parse_tokens(value: &FilterValue) -> Vec<RangeBound> {
    value
        .as_slice()
        .iter()
        .filter_map(|token| {
            let token = token.to_string();
            let parsed = parse_token(&token);
            if parsed.is_none() {
                tracing::trace!(%token, "Dropping range token without operator");
            }
            parsed
        })
        .collect()
}
