//! Query engine capability interface
//!
//! The evaluator never builds SQL or touches rows itself. It hands a
//! canonical [`Context`] to a [`QueryEngine`], gets back an opaque
//! [`QueryNode`], and drives the terminal actions through [`ResultSet`].
//!
//! All calls are synchronous and may block on the engine's own I/O.

use harvest_core::Context;
use serde_json::Value;
use thiserror::Error;

/// Primary-key alias understood by every engine
pub const PK: &str = "pk";

/// Failure reported by an engine, carrying its human-readable message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Generated SQL and its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Lazy, finite, non-restartable sequence of column values
pub type ColumnIter<'a> = Box<dyn Iterator<Item = EngineResult<Value>> + 'a>;

/// Entry point into an engine
pub trait QueryEngine: Send + Sync {
    /// Parse a canonical context into an executable node.
    ///
    /// Rejections (unknown concept, field or operator, bad value shape)
    /// are reported through the error message.
    fn parse(&self, context: &Context) -> EngineResult<Box<dyn QueryNode>>;
}

/// A parsed, executable context
pub trait QueryNode: Send {
    /// Materialize the node into a result-set query
    fn to_result_set(&self) -> Box<dyn ResultSet + '_>;
}

/// A result-set query over the engine's root entity
pub trait ResultSet {
    /// Number of matching rows
    fn count(&self) -> EngineResult<u64>;

    /// Compile the query restricted to `column` without executing it
    fn compile(&self, column: &str) -> EngineResult<CompiledQuery>;

    /// Iterate the values of `column` over the matching rows
    fn iterate_column(&self, column: &str) -> EngineResult<ColumnIter<'_>>;
}
