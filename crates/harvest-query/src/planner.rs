//! Context planning for the in-memory engine
//!
//! Binds a canonical context to the schema: concepts and fields are
//! resolved to columns, operators are checked against what each field
//! allows, and values are checked against the operator's expected shape.
//! Every rejection becomes an [`EngineError`] with a readable message.

use crate::engine::{EngineError, EngineResult};
use crate::schema::{FieldDef, Schema};
use harvest_core::operator::{EXACT, GT, GTE, IN, LT, LTE, RANGE};
use harvest_core::{CanonicalValue, Context, Predicate};
use serde_json::Value;

/// Bound filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Condition(Condition),
}

/// A comparison against one column
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub comparison: Comparison,
    pub negated: bool,
}

/// Comparison kinds supported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Exact(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Inclusive on both ends
    Range(Value, Value),
    In(Vec<Value>),
}

/// Context planner
pub struct QueryPlanner<'a> {
    schema: &'a Schema,
}

impl<'a> QueryPlanner<'a> {
    /// Create a planner over a schema
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Bind a context to the schema
    pub fn plan(&self, context: &Context) -> EngineResult<Filter> {
        match context {
            Context::Branch(branch) => {
                let children = branch
                    .children
                    .iter()
                    .map(|child| self.plan(child))
                    .collect::<EngineResult<Vec<_>>>()?;

                match branch.operator.as_str() {
                    "and" => Ok(Filter::And(children)),
                    "or" => Ok(Filter::Or(children)),
                    other => Err(EngineError::new(format!(
                        "unknown branch operator \"{}\"",
                        other
                    ))),
                }
            }
            Context::And(group) => group
                .children
                .iter()
                .map(|predicate| self.plan_predicate(predicate).map(Filter::Condition))
                .collect::<EngineResult<Vec<_>>>()
                .map(Filter::And),
        }
    }

    fn plan_predicate(&self, predicate: &Predicate) -> EngineResult<Condition> {
        let concept = self.schema.concept(&predicate.concept).ok_or_else(|| {
            EngineError::new(format!("unknown concept \"{}\"", predicate.concept))
        })?;

        let field = concept.field(&predicate.field).ok_or_else(|| {
            EngineError::new(format!(
                "field \"{}\" does not belong to concept \"{}\"",
                predicate.field, predicate.concept
            ))
        })?;

        if !field.allows(&predicate.operator) {
            return Err(EngineError::new(format!(
                "operator \"{}\" is not supported for field \"{}\"",
                predicate.operator, predicate.field
            )));
        }

        let (negated, base) = match predicate.operator.strip_prefix('-') {
            Some(base) => (true, base),
            None => (false, predicate.operator.as_str()),
        };

        let comparison = bind_comparison(field, &predicate.operator, base, &predicate.value)?;

        Ok(Condition {
            column: field.column.clone(),
            comparison,
            negated,
        })
    }
}

fn bind_comparison(
    field: &FieldDef,
    operator: &str,
    base: &str,
    value: &CanonicalValue,
) -> EngineResult<Comparison> {
    let typed = |v: &Value| -> EngineResult<Value> {
        if field.data_type.accepts(v) {
            Ok(v.clone())
        } else {
            Err(EngineError::new(format!(
                "invalid value for field \"{}\": expected {}, got {}",
                field.id,
                field.data_type.as_str(),
                v
            )))
        }
    };

    match (base, value) {
        (RANGE, CanonicalValue::Range(lower, upper)) => {
            Ok(Comparison::Range(typed(lower)?, typed(upper)?))
        }
        (RANGE, CanonicalValue::Scalar(Value::Array(bounds))) if bounds.len() == 2 => {
            Ok(Comparison::Range(typed(&bounds[0])?, typed(&bounds[1])?))
        }
        (RANGE, _) => Err(EngineError::new(format!(
            "invalid value for operator \"{}\": expected [lower, upper]",
            operator
        ))),
        (IN, CanonicalValue::Scalar(Value::Array(items))) if !items.is_empty() => items
            .iter()
            .map(|item| typed(item))
            .collect::<EngineResult<Vec<_>>>()
            .map(Comparison::In),
        (IN, _) => Err(EngineError::new(format!(
            "invalid value for operator \"{}\": expected a non-empty list",
            operator
        ))),
        (_, CanonicalValue::Range(..)) => Err(EngineError::new(format!(
            "invalid value for operator \"{}\": expected a single value",
            operator
        ))),
        (EXACT, CanonicalValue::Scalar(v)) => Ok(Comparison::Exact(typed(v)?)),
        (GT, CanonicalValue::Scalar(v)) => Ok(Comparison::Gt(typed(v)?)),
        (GTE, CanonicalValue::Scalar(v)) => Ok(Comparison::Gte(typed(v)?)),
        (LT, CanonicalValue::Scalar(v)) => Ok(Comparison::Lt(typed(v)?)),
        (LTE, CanonicalValue::Scalar(v)) => Ok(Comparison::Lte(typed(v)?)),
        _ => Err(EngineError::new(format!("unknown operator \"{}\"", operator))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Dataset;
    use harvest_core::{AndGroup, BranchContext, Ident};
    use serde_json::json;

    fn predicate(concept: &str, field: &str, operator: &str, value: CanonicalValue) -> Predicate {
        Predicate {
            concept: Ident::name(concept),
            field: Ident::name(field),
            operator: operator.to_string(),
            value,
        }
    }

    fn group(predicates: Vec<Predicate>) -> Context {
        Context::And(AndGroup {
            children: predicates,
        })
    }

    fn plan(context: &Context) -> EngineResult<Filter> {
        let dataset = Dataset::sample();
        QueryPlanner::new(&dataset.schema).plan(context)
    }

    #[test]
    fn test_plan_range() {
        let filter = plan(&group(vec![predicate(
            "patient",
            "age",
            "range",
            CanonicalValue::Range(json!(21), json!(65)),
        )]))
        .unwrap();

        assert_eq!(
            filter,
            Filter::And(vec![Filter::Condition(Condition {
                column: "age".to_string(),
                comparison: Comparison::Range(json!(21), json!(65)),
                negated: false,
            })])
        );
    }

    #[test]
    fn test_plan_negated() {
        let filter = plan(&group(vec![predicate(
            "patient",
            "sex",
            "-exact",
            CanonicalValue::Scalar(json!("male")),
        )]))
        .unwrap();

        let Filter::And(children) = filter else {
            panic!("expected and");
        };
        let Filter::Condition(condition) = &children[0] else {
            panic!("expected condition");
        };
        assert!(condition.negated);
        assert_eq!(condition.comparison, Comparison::Exact(json!("male")));
    }

    #[test]
    fn test_unknown_concept() {
        let err = plan(&group(vec![predicate(
            "visit",
            "age",
            "exact",
            CanonicalValue::Scalar(json!(1)),
        )]))
        .unwrap_err();
        assert_eq!(err.message, "unknown concept \"visit\"");
    }

    #[test]
    fn test_foreign_field() {
        let err = plan(&group(vec![predicate(
            "diagnosis",
            "age",
            "exact",
            CanonicalValue::Scalar(json!(1)),
        )]))
        .unwrap_err();
        assert_eq!(
            err.message,
            "field \"age\" does not belong to concept \"diagnosis\""
        );
    }

    #[test]
    fn test_unsupported_operator() {
        let err = plan(&group(vec![predicate(
            "patient",
            "sex",
            "gt",
            CanonicalValue::Scalar(json!("f")),
        )]))
        .unwrap_err();
        assert_eq!(err.message, "operator \"gt\" is not supported for field \"sex\"");
    }

    #[test]
    fn test_type_mismatch() {
        let err = plan(&group(vec![predicate(
            "patient",
            "age",
            "gt",
            CanonicalValue::Scalar(json!({"gt": 21})),
        )]))
        .unwrap_err();
        assert!(err.message.starts_with("invalid value for field \"age\""));
    }

    #[test]
    fn test_empty_in_rejected() {
        let err = plan(&group(vec![predicate(
            "patient",
            "age",
            "in",
            CanonicalValue::Scalar(json!([])),
        )]))
        .unwrap_err();
        assert!(err.message.contains("non-empty list"));
    }

    #[test]
    fn test_unknown_branch_operator() {
        let err = plan(&Context::Branch(BranchContext {
            operator: "xor".to_string(),
            children: vec![],
        }))
        .unwrap_err();
        assert_eq!(err.message, "unknown branch operator \"xor\"");
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(plan(&group(vec![])).unwrap(), Filter::And(vec![]));
    }
}
