//! Harvest Evaluator Core Library
//!
//! This crate provides the expression and context trees, operator
//! normalization and error handling shared by the evaluator crates.
//!
//! # Modules
//!
//! - `expression` - Client-facing boolean expression tree
//! - `context` - Canonical, engine-facing context tree
//! - `operator` - Operator aliases and range normalization
//! - `id` - Concept and field identifiers
//! - `error` - Error types and result aliases

pub mod context;
pub mod error;
pub mod expression;
pub mod id;
pub mod operator;

pub use context::{AndGroup, BranchContext, CanonicalValue, Context, Predicate};
pub use error::{Error, Result};
pub use expression::{Branch, Expression, Leaf, Param, Query};
pub use id::Ident;
pub use operator::normalize;
