//! Harvest Query Evaluation
//!
//! Turns client expressions into canonical contexts and evaluates them
//! against a query engine.
//!
//! # Overview
//!
//! The evaluation pipeline implements:
//! - Expression translation and operator normalization
//! - Validation against the engine's parser
//! - Plan, count and identifier evaluation modes
//! - A catalog of queryable concepts
//! - An in-memory reference engine with SQL generation

pub mod catalog;
pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod memory;
pub mod planner;
pub mod schema;
pub mod sql;
pub mod translator;

pub use catalog::{Catalog, CatalogSource};
pub use engine::{CompiledQuery, EngineError, EngineResult, PK, QueryEngine, QueryNode, ResultSet};
pub use evaluator::{Evaluator, Plan, Validated};
pub use memory::{Dataset, MemoryEngine};
pub use schema::{ConceptDef, DataType, FieldDef, Schema};
pub use translator::{Translator, translate};
