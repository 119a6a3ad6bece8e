//! Row evaluation for the in-memory engine
//!
//! Filters are evaluated with SQL's three-valued logic so that counts and
//! identifiers agree with what the compiled SQL would return: a missing or
//! null column makes a comparison unknown, and unknown rows never match,
//! negated or not.

use crate::planner::{Comparison, Condition, Filter};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A stored row, keyed by column name
pub type Row = Map<String, Value>;

/// Filter executor
pub struct QueryExecutor<'a> {
    filter: &'a Filter,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor for a bound filter
    pub fn new(filter: &'a Filter) -> Self {
        Self { filter }
    }

    /// Returns true if the row satisfies the filter
    pub fn matches(&self, row: &Row) -> bool {
        evaluate(self.filter, row) == Some(true)
    }

    /// Iterate the rows that satisfy the filter, in storage order
    pub fn scan<'r>(&'r self, rows: &'r [Row]) -> impl Iterator<Item = &'r Row> + 'r {
        rows.iter().filter(move |row| self.matches(row))
    }
}

fn evaluate(filter: &Filter, row: &Row) -> Option<bool> {
    match filter {
        Filter::And(children) => {
            let mut result = Some(true);
            for child in children {
                match evaluate(child, row) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Filter::Or(children) => {
            let mut result = Some(false);
            for child in children {
                match evaluate(child, row) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
        Filter::Condition(condition) => evaluate_condition(condition, row),
    }
}

fn evaluate_condition(condition: &Condition, row: &Row) -> Option<bool> {
    let actual = match row.get(&condition.column) {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    let result = match &condition.comparison {
        Comparison::Exact(expected) => compare(actual, expected)? == Ordering::Equal,
        Comparison::Gt(bound) => compare(actual, bound)? == Ordering::Greater,
        Comparison::Gte(bound) => compare(actual, bound)? != Ordering::Less,
        Comparison::Lt(bound) => compare(actual, bound)? == Ordering::Less,
        Comparison::Lte(bound) => compare(actual, bound)? != Ordering::Greater,
        Comparison::Range(lower, upper) => {
            compare(actual, lower)? != Ordering::Less && compare(actual, upper)? != Ordering::Greater
        }
        Comparison::In(items) => items
            .iter()
            .any(|item| compare(actual, item) == Some(Ordering::Equal)),
    };

    Some(result != condition.negated)
}

/// Compare two values of the same kind; mixed kinds are incomparable
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
