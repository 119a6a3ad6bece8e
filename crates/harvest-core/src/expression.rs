//! Client-facing query expressions
//!
//! An expression is a boolean tree whose leaves select rows of a concept by
//! a list of field predicates. It arrives wrapped in a `{"term": ...}`
//! envelope and is untrusted until it has been shape-checked here.

use crate::error::{Error, Result};
use crate::id::Ident;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request envelope around the root expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub term: Expression,
}

impl Query {
    /// Create a query from its root term
    pub fn new(term: Expression) -> Self {
        Self { term }
    }

    /// Shape-check a decoded payload.
    ///
    /// Any mismatch (missing or unknown `type`, missing keys, wrong value
    /// kinds) is reported as [`Error::MalformedExpression`].
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::MalformedExpression(e.to_string()))
    }
}

/// A node of the client expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Expression {
    /// Boolean combination of sub-expressions
    Branch(Branch),

    /// Conditions on a single concept, implicitly ANDed
    Leaf(Leaf),
}

impl Expression {
    /// Create a branch node
    pub fn branch(operator: impl Into<String>, terms: Vec<Expression>) -> Self {
        Expression::Branch(Branch {
            operator: operator.into(),
            terms,
        })
    }

    /// Create a leaf node
    pub fn leaf(concept: impl Into<Ident>, params: Vec<Param>) -> Self {
        Expression::Leaf(Leaf {
            concept: concept.into(),
            params,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Boolean combinator name, interpreted by the engine
    pub operator: String,
    pub terms: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub concept: Ident,
    pub params: Vec<Param>,
}

/// A single field condition inside a leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Field identifier
    pub id: Ident,

    /// Public operator token, e.g. `eq` or `range`
    pub operator: String,

    pub value: Value,
}

impl Param {
    pub fn new(id: impl Into<Ident>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            operator: operator.into(),
            value,
        }
    }
}
