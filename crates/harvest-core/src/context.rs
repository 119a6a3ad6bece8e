//! Canonical query context
//!
//! The engine-facing form of an expression. Branches keep the client's
//! combinator verbatim; every leaf becomes an `and` group of predicates
//! with canonical operators and values.

use crate::id::Ident;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Combinator used for the predicates of a single leaf
pub const AND: &str = "and";

/// A node of the canonical context tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Context {
    Branch(BranchContext),
    And(AndGroup),
}

impl Context {
    /// Boolean combinator of this node
    pub fn operator(&self) -> &str {
        match self {
            Context::Branch(branch) => &branch.operator,
            Context::And(_) => AND,
        }
    }
}

/// Combination of child contexts under an engine-defined operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchContext {
    #[serde(rename = "type")]
    pub operator: String,
    pub children: Vec<Context>,
}

/// Predicates of one leaf. Empty means "match all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndGroup {
    pub children: Vec<Predicate>,
}

impl Serialize for AndGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AndGroup", 2)?;
        state.serialize_field("type", AND)?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}

/// A single concept/field/operator/value condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub concept: Ident,
    pub field: Ident,
    pub operator: String,
    pub value: CanonicalValue,
}

/// Value of a canonical predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    /// Any value other than a two-sided range, passed through as supplied
    Scalar(Value),

    /// Lower and upper bound, in that order
    Range(Value, Value),
}
