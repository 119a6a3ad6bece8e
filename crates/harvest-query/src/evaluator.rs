//! Evaluation modes
//!
//! Every mode translates the query, asks the engine to parse the canonical
//! context, and only then performs its own terminal action:
//!
//! - `validate` - nothing further
//! - `plan` - compile the identifier query without running it
//! - `count` - cardinality of the result set
//! - `idents` - identifier column of every matching row

use crate::engine::{EngineError, PK, QueryEngine, QueryNode};
use crate::translator::Translator;
use harvest_core::{Context, Error, Query, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Generated SQL for a query, alongside the context it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub harvest: Context,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Outcome of a successful validation
pub struct Validated {
    pub context: Context,
    pub node: Box<dyn QueryNode>,
}

/// Dispatches the evaluation modes against an engine
#[derive(Clone)]
pub struct Evaluator {
    engine: Arc<dyn QueryEngine>,
    translator: Translator,
}

impl Evaluator {
    /// Create an evaluator with the default depth bound
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            engine,
            translator: Translator::default(),
        }
    }

    /// Builder: bound expression nesting
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.translator = Translator::new(max_depth);
        self
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Translate without consulting the engine
    pub fn translate(&self, query: &Query) -> Result<Context> {
        self.translator.translate(query)
    }

    /// Translate and parse.
    ///
    /// Translation errors pass through unchanged; any engine rejection is
    /// converted into [`Error::Validation`] with the engine's message.
    pub fn validate(&self, query: &Query) -> Result<Validated> {
        let context = self.translate(query).inspect_err(|e| {
            debug!("Rejected expression: {}", e);
        })?;

        match self.engine.parse(&context) {
            Ok(node) => Ok(Validated { context, node }),
            Err(EngineError { message }) => {
                debug!("Engine rejected context: {}", message);
                Err(Error::Validation(message))
            }
        }
    }

    /// Validate mode: success carries no data
    pub fn check(&self, query: &Query) -> Result<()> {
        self.validate(query).map(|_| ())
    }

    /// Plan mode: SQL and parameters of the identifier query
    pub fn plan(&self, query: &Query) -> Result<Plan> {
        let Validated { context, node } = self.validate(query)?;
        let compiled = node.to_result_set().compile(PK).map_err(execution)?;
        debug!("Planned query: {}", compiled.sql);

        Ok(Plan {
            harvest: context,
            sql: compiled.sql,
            params: compiled.params,
        })
    }

    /// Count mode: number of matching rows as reported by the engine
    pub fn count(&self, query: &Query) -> Result<u64> {
        let Validated { node, .. } = self.validate(query)?;
        let count = node.to_result_set().count().map_err(execution)?;
        debug!("Counted {} rows", count);
        Ok(count)
    }

    /// Identifiers mode: drains the engine's rows in the order it yields them
    pub fn idents(&self, query: &Query) -> Result<Vec<Value>> {
        let Validated { node, .. } = self.validate(query)?;
        let result_set = node.to_result_set();
        let idents = result_set
            .iterate_column(PK)
            .map_err(execution)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(execution)?;
        debug!("Collected {} identifiers", idents.len());
        Ok(idents)
    }
}

fn execution(e: EngineError) -> Error {
    error!("Engine execution failed: {}", e);
    Error::Execution(e.message)
}
