//! Operator normalization
//!
//! Maps the public operator tokens clients send to the canonical operator
//! alphabet understood by the query engine.

use crate::context::CanonicalValue;
use crate::error::{Error, Result};
use serde_json::Value;

/// Canonical equality
pub const EXACT: &str = "exact";
/// Canonical negated equality
pub const NOT_EXACT: &str = "-exact";
/// Two-sided bound
pub const RANGE: &str = "range";
/// Negated two-sided bound
pub const NOT_RANGE: &str = "-range";
pub const GT: &str = "gt";
pub const GTE: &str = "gte";
pub const LT: &str = "lt";
pub const LTE: &str = "lte";
/// Membership
pub const IN: &str = "in";
/// Negated membership
pub const NOT_IN: &str = "-in";

/// Public aliases rewritten on the way in.
const ALIASES_IN: &[(&str, &str)] = &[("eq", EXACT), ("-eq", NOT_EXACT)];

/// Canonical names rewritten on the way out, e.g. when listing operators.
const ALIASES_OUT: &[(&str, &str)] = &[(EXACT, "eq"), (NOT_EXACT, "-eq")];

/// Operators advertised to clients through the catalog.
pub const PUBLIC_OPERATORS: &[&str] = &[RANGE, EXACT, GT, LT, GTE, LTE, IN];

/// Resolve a public operator token to its canonical name.
///
/// Unknown tokens pass through unchanged.
pub fn resolve(op: &str) -> &str {
    ALIASES_IN
        .iter()
        .find(|(public, _)| *public == op)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(op)
}

/// Map a canonical operator back to the token clients use.
pub fn public_name(op: &str) -> &str {
    ALIASES_OUT
        .iter()
        .find(|(canonical, _)| *canonical == op)
        .map(|(_, public)| *public)
        .unwrap_or(op)
}

/// Normalize an operator token and its value into canonical form.
///
/// A `range` value is a mapping with optional `gt` (lower) and `lt` (upper)
/// bounds. When only one bound is present the range degrades to the
/// matching one-sided comparison.
pub fn normalize(op: &str, value: Value) -> Result<(String, CanonicalValue)> {
    let op = resolve(op);

    if op != RANGE {
        return Ok((op.to_string(), CanonicalValue::Scalar(value)));
    }

    let Value::Object(mut bounds) = value else {
        return Err(Error::InvalidRange);
    };

    match (bounds.remove(GT), bounds.remove(LT)) {
        (Some(lower), Some(upper)) => Ok((RANGE.to_string(), CanonicalValue::Range(lower, upper))),
        (Some(lower), None) => Ok((GT.to_string(), CanonicalValue::Scalar(lower))),
        (None, Some(upper)) => Ok((LT.to_string(), CanonicalValue::Scalar(upper))),
        (None, None) => Err(Error::InvalidRange),
    }
}
