//! Expression translation
//!
//! Converts a shape-checked [`Query`] into the canonical [`Context`] tree.
//! Branch combinators are copied verbatim; each leaf becomes an `and`
//! group with one normalized predicate per param.

use harvest_core::operator::normalize;
use harvest_core::{
    AndGroup, BranchContext, Context, Error, Expression, Leaf, Predicate, Query, Result,
};

/// Default bound on expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest bound a server may be configured with. Decoding and translation
/// recurse once per level, so the bound also caps stack use.
pub const MAX_SUPPORTED_DEPTH: usize = 128;

/// Expression translator
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    max_depth: usize,
}

impl Translator {
    /// Create a translator that rejects trees nested deeper than `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Container nesting of an encoded `{"term": ...}` body that can still
    /// hold a tree within the bound.
    ///
    /// Every expression level adds a map and, for branches, a `terms` list.
    /// Below the deepest leaf sit its params list, a param map and one
    /// container for a range or list value.
    pub fn max_nesting(&self) -> usize {
        2 * self.max_depth + 3
    }

    /// Error reported for a tree nested deeper than the bound
    pub fn depth_error(&self) -> Error {
        Error::MalformedExpression(format!(
            "expression exceeds maximum depth of {}",
            self.max_depth
        ))
    }

    /// Translate a query into its canonical context
    pub fn translate(&self, query: &Query) -> Result<Context> {
        self.translate_term(&query.term, 1)
    }

    fn translate_term(&self, term: &Expression, depth: usize) -> Result<Context> {
        if depth > self.max_depth {
            return Err(self.depth_error());
        }

        match term {
            Expression::Branch(branch) => {
                let children = branch
                    .terms
                    .iter()
                    .map(|child| self.translate_term(child, depth + 1))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Context::Branch(BranchContext {
                    operator: branch.operator.clone(),
                    children,
                }))
            }
            Expression::Leaf(leaf) => translate_leaf(leaf).map(Context::And),
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Translate a query with the default depth bound
pub fn translate(query: &Query) -> Result<Context> {
    Translator::default().translate(query)
}

fn translate_leaf(leaf: &Leaf) -> Result<AndGroup> {
    let children = leaf
        .params
        .iter()
        .map(|param| {
            let (operator, value) = normalize(&param.operator, param.value.clone())?;
            Ok(Predicate {
                concept: leaf.concept.clone(),
                field: param.id.clone(),
                operator,
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AndGroup { children })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{CanonicalValue, Ident, Param};
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn patient_age(operator: &str, value: Value) -> Query {
        Query::new(Expression::leaf(
            "patient",
            vec![Param::new("age", operator, value)],
        ))
    }

    #[test]
    fn test_empty_leaf_gives_empty_group() {
        let context = translate(&Query::new(Expression::leaf("patient", vec![]))).unwrap();
        assert_eq!(context, Context::And(AndGroup::default()));
        assert_eq!(
            serde_json::to_value(&context).unwrap(),
            json!({"type": "and", "children": []})
        );
    }

    #[test]
    fn test_lower_bound_range() {
        let context = translate(&patient_age("range", json!({"gt": 21}))).unwrap();
        assert_eq!(
            serde_json::to_value(&context).unwrap(),
            json!({
                "type": "and",
                "children": [
                    {"concept": "patient", "field": "age", "operator": "gt", "value": 21}
                ]
            })
        );
    }

    #[test]
    fn test_two_sided_range() {
        let context = translate(&patient_age("range", json!({"gt": 21, "lt": 65}))).unwrap();
        let Context::And(group) = context else {
            panic!("expected and group");
        };
        assert_eq!(group.children[0].operator, "range");
        assert_eq!(
            group.children[0].value,
            CanonicalValue::Range(json!(21), json!(65))
        );
    }

    #[test]
    fn test_empty_range_fails() {
        let err = translate(&patient_age("range", json!({}))).unwrap_err();
        assert!(matches!(err, Error::InvalidRange));
        assert_eq!(err.message(), "invalid range");
    }

    #[test]
    fn test_params_become_one_group() {
        let query = Query::new(Expression::leaf(
            "patient",
            vec![
                Param::new("age", "gte", json!(18)),
                Param::new("sex", "eq", json!("female")),
            ],
        ));
        let Context::And(group) = translate(&query).unwrap() else {
            panic!("expected and group");
        };

        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[1].operator, "exact");
        assert_eq!(group.children[1].field, Ident::name("sex"));
        assert!(group.children.iter().all(|p| p.concept == Ident::name("patient")));
    }

    #[test]
    fn test_branch_operator_verbatim() {
        let query = Query::new(Expression::branch(
            "or",
            vec![
                Expression::leaf("a", vec![]),
                Expression::leaf("b", vec![Param::new("x", "-eq", json!(1))]),
            ],
        ));

        assert_eq!(
            serde_json::to_value(translate(&query).unwrap()).unwrap(),
            json!({
                "type": "or",
                "children": [
                    {"type": "and", "children": []},
                    {"type": "and", "children": [
                        {"concept": "b", "field": "x", "operator": "-exact", "value": 1}
                    ]}
                ]
            })
        );

        // Unknown combinators are the engine's problem.
        let query = Query::new(Expression::branch("xor", vec![]));
        assert_eq!(translate(&query).unwrap().operator(), "xor");
    }

    #[test]
    fn test_error_inside_branch_propagates() {
        let query = Query::new(Expression::branch(
            "and",
            vec![
                Expression::leaf("a", vec![]),
                Expression::leaf("b", vec![Param::new("x", "range", json!({"lte": 3}))]),
            ],
        ));
        assert!(matches!(translate(&query).unwrap_err(), Error::InvalidRange));
    }

    #[test]
    fn test_depth_limit() {
        let mut term = Expression::leaf("a", vec![]);
        for _ in 0..4 {
            term = Expression::branch("and", vec![term]);
        }
        let query = Query::new(term);

        assert!(Translator::new(5).translate(&query).is_ok());
        let err = Translator::new(4).translate(&query).unwrap_err();
        assert!(matches!(err, Error::MalformedExpression(_)));
        assert_eq!(err.message(), "expression exceeds maximum depth of 4");
    }

    #[test]
    fn test_max_nesting_fits_deepest_tree() {
        let translator = Translator::new(3);
        let mut term = Expression::leaf(
            "a",
            vec![Param::new("x", "range", json!({"gt": 1, "lt": 2}))],
        );
        for _ in 1..3 {
            term = Expression::branch("or", vec![term]);
        }
        let body = serde_json::to_value(Query::new(term)).unwrap();

        fn nesting(value: &Value) -> usize {
            match value {
                Value::Array(items) => 1 + items.iter().map(nesting).max().unwrap_or(0),
                Value::Object(map) => 1 + map.values().map(nesting).max().unwrap_or(0),
                _ => 0,
            }
        }
        assert_eq!(nesting(&body), translator.max_nesting());
    }

    fn arb_expression() -> impl Strategy<Value = Expression> {
        let param = ("[a-z]{1,6}", prop_oneof!["eq", "-eq", "gt", "in", "range"], any::<i32>())
            .prop_map(|(id, op, n)| {
                let value = if op == "range" { json!({"gt": n}) } else { json!(n) };
                Param::new(id, op, value)
            });
        let leaf = ("[a-z]{1,6}", prop::collection::vec(param, 0..4))
            .prop_map(|(concept, params)| Expression::leaf(concept, params));

        leaf.prop_recursive(4, 32, 4, |inner| {
            (prop_oneof!["and", "or"], prop::collection::vec(inner, 0..4))
                .prop_map(|(op, terms)| Expression::branch(op, terms))
        })
    }

    proptest! {
        #[test]
        fn prop_translation_is_idempotent(term in arb_expression()) {
            let query = Query::new(term);
            prop_assert_eq!(translate(&query).unwrap(), translate(&query).unwrap());
        }

        #[test]
        fn prop_no_public_aliases_reach_engine(term in arb_expression()) {
            fn check(context: &Context) -> bool {
                match context {
                    Context::Branch(branch) => branch.children.iter().all(check),
                    Context::And(group) => group
                        .children
                        .iter()
                        .all(|p| p.operator != "eq" && p.operator != "-eq"),
                }
            }
            prop_assert!(check(&translate(&Query::new(term)).unwrap()));
        }
    }
}
