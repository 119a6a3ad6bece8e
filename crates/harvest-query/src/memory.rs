//! In-memory reference engine
//!
//! Implements the engine capability set over a schema and a row set held
//! in memory. Parsing binds the context with [`QueryPlanner`], SQL comes
//! from [`SqlCompiler`], and counts and identifiers are computed by
//! [`QueryExecutor`] over the stored rows.

use crate::catalog::{Catalog, CatalogSource};
use crate::engine::{
    ColumnIter, CompiledQuery, EngineError, EngineResult, QueryEngine, QueryNode, ResultSet,
};
use crate::executor::{QueryExecutor, Row};
use crate::planner::{Filter, QueryPlanner};
use crate::schema::{ConceptDef, DataType, FieldDef, Schema};
use crate::sql::SqlCompiler;
use harvest_core::{Context, Error, Ident, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Schema plus rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema: Schema,

    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset: Dataset = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;

        dataset.check()?;
        info!(
            "Loaded dataset from {:?}: {} concepts, {} rows",
            path,
            dataset.schema.concepts.len(),
            dataset.rows.len()
        );
        Ok(dataset)
    }

    /// Every row must carry the primary key
    fn check(&self) -> Result<()> {
        let pk = &self.schema.primary_key;
        match self.rows.iter().position(|row| !row.contains_key(pk)) {
            Some(index) => Err(Error::Configuration(format!(
                "row {} is missing primary key column \"{}\"",
                index, pk
            ))),
            None => Ok(()),
        }
    }

    /// Small built-in dataset used when no data file is configured
    pub fn sample() -> Self {
        let schema = Schema {
            table: "subject".to_string(),
            primary_key: "id".to_string(),
            concepts: vec![
                ConceptDef {
                    id: Ident::name("patient"),
                    label: "Patient".to_string(),
                    doc: Some("Demographics of enrolled subjects".to_string()),
                    keywords: vec!["demographics".to_string()],
                    fields: vec![
                        FieldDef::new("age", "Age", "age", DataType::Number),
                        FieldDef::new("sex", "Sex", "sex", DataType::String),
                        FieldDef::new("enrolled", "Enrolled", "enrolled", DataType::Boolean),
                    ],
                },
                ConceptDef {
                    id: Ident::name("diagnosis"),
                    label: "Diagnosis".to_string(),
                    doc: Some("Primary diagnosis".to_string()),
                    keywords: vec!["icd".to_string(), "condition".to_string()],
                    fields: vec![
                        FieldDef::new("code", "Code", "diagnosis_code", DataType::String),
                        FieldDef::new("onset", "Age at onset", "onset_age", DataType::Number),
                    ],
                },
            ],
        };

        let rows = [
            json!({"id": 1, "age": 34, "sex": "female", "enrolled": true, "diagnosis_code": "E11", "onset_age": 30}),
            json!({"id": 2, "age": 17, "sex": "male", "enrolled": true, "diagnosis_code": "J45", "onset_age": 6}),
            json!({"id": 3, "age": 72, "sex": "female", "enrolled": false, "diagnosis_code": "I10", "onset_age": 60}),
            json!({"id": 4, "age": 45, "sex": "male", "enrolled": true, "diagnosis_code": "E11", "onset_age": 41}),
            json!({"id": 5, "age": 21, "sex": "female", "enrolled": true, "diagnosis_code": "J45", "onset_age": 12}),
            json!({"id": 6, "age": null, "sex": "male", "enrolled": false, "diagnosis_code": null, "onset_age": null}),
        ]
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

        Self { schema, rows }
    }
}

/// In-memory query engine
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    dataset: Arc<Dataset>,
}

impl MemoryEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }

    /// Engine over the built-in sample dataset
    pub fn sample() -> Self {
        Self::new(Dataset::sample())
    }

    pub fn schema(&self) -> &Schema {
        &self.dataset.schema
    }
}

impl QueryEngine for MemoryEngine {
    fn parse(&self, context: &Context) -> EngineResult<Box<dyn QueryNode>> {
        let filter = QueryPlanner::new(&self.dataset.schema).plan(context)?;
        debug!("Parsed context into {:?}", filter);

        Ok(Box::new(MemoryNode {
            dataset: Arc::clone(&self.dataset),
            filter,
        }))
    }
}

impl CatalogSource for MemoryEngine {
    fn catalog(&self) -> Catalog {
        Catalog::from_schema(&self.dataset.schema)
    }
}

/// Parsed node of the in-memory engine
#[derive(Debug)]
pub struct MemoryNode {
    dataset: Arc<Dataset>,
    filter: Filter,
}

impl QueryNode for MemoryNode {
    fn to_result_set(&self) -> Box<dyn ResultSet + '_> {
        Box::new(MemoryResultSet { node: self })
    }
}

struct MemoryResultSet<'a> {
    node: &'a MemoryNode,
}

impl MemoryResultSet<'_> {
    fn column(&self, column: &str) -> EngineResult<String> {
        self.node
            .dataset
            .schema
            .resolve_column(column)
            .map(str::to_string)
            .ok_or_else(|| EngineError::new(format!("unknown column \"{}\"", column)))
    }
}

impl ResultSet for MemoryResultSet<'_> {
    fn count(&self) -> EngineResult<u64> {
        let executor = QueryExecutor::new(&self.node.filter);
        Ok(executor.scan(&self.node.dataset.rows).count() as u64)
    }

    fn compile(&self, column: &str) -> EngineResult<CompiledQuery> {
        let column = self.column(column)?;
        Ok(SqlCompiler::new(&self.node.dataset.schema.table).compile(&column, &self.node.filter))
    }

    fn iterate_column(&self, column: &str) -> EngineResult<ColumnIter<'_>> {
        let column = self.column(column)?;
        let node = self.node;

        let rows = node.dataset.rows.iter().filter(move |row| {
            QueryExecutor::new(&node.filter).matches(row)
        });

        Ok(Box::new(rows.map(move |row| {
            Ok(row.get(&column).cloned().unwrap_or(Value::Null))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PK;
    use harvest_core::{AndGroup, CanonicalValue, Predicate};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn age_over(n: i64) -> Context {
        Context::And(AndGroup {
            children: vec![Predicate {
                concept: Ident::name("patient"),
                field: Ident::name("age"),
                operator: "gt".to_string(),
                value: CanonicalValue::Scalar(json!(n)),
            }],
        })
    }

    #[test]
    fn test_count_and_idents() {
        let engine = MemoryEngine::sample();
        let node = engine.parse(&age_over(30)).unwrap();
        let result_set = node.to_result_set();

        assert_eq!(result_set.count().unwrap(), 3);

        let ids: Vec<Value> = result_set
            .iterate_column(PK)
            .unwrap()
            .collect::<EngineResult<_>>()
            .unwrap();
        assert_eq!(ids, vec![json!(1), json!(3), json!(4)]);
    }

    #[test]
    fn test_match_all() {
        let engine = MemoryEngine::sample();
        let node = engine.parse(&Context::And(AndGroup::default())).unwrap();
        assert_eq!(node.to_result_set().count().unwrap(), 6);
    }

    #[test]
    fn test_compile_pk() {
        let engine = MemoryEngine::sample();
        let node = engine.parse(&age_over(21)).unwrap();
        let compiled = node.to_result_set().compile(PK).unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT \"subject\".\"id\" FROM \"subject\" WHERE \"subject\".\"age\" > %s"
        );
        assert_eq!(compiled.params, vec![json!(21)]);
    }

    #[test]
    fn test_unknown_column() {
        let engine = MemoryEngine::sample();
        let node = engine.parse(&age_over(21)).unwrap();
        let result_set = node.to_result_set();
        assert!(result_set.iterate_column("weight").is_err());
        assert_eq!(
            result_set.compile("weight").unwrap_err().message,
            "unknown column \"weight\""
        );
    }

    #[test]
    fn test_parse_error_message() {
        let engine = MemoryEngine::sample();
        let context = Context::And(AndGroup {
            children: vec![Predicate {
                concept: Ident::Id(99),
                field: Ident::name("age"),
                operator: "gt".to_string(),
                value: CanonicalValue::Scalar(json!(1)),
            }],
        });
        match engine.parse(&context) {
            Err(err) => assert_eq!(err.message, "unknown concept \"99\""),
            Ok(_) => panic!("expected parse failure"),
        }
    }

    #[test]
    fn test_load_dataset() {
        let mut file = NamedTempFile::new().unwrap();
        let dataset = Dataset::sample();
        write!(file, "{}", serde_json::to_string(&dataset).unwrap()).unwrap();

        let loaded = Dataset::from_path(file.path()).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_load_dataset_missing_pk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"schema": {{"table": "t", "primary_key": "id", "concepts": []}}, "rows": [{{"age": 1}}]}}"#
        )
        .unwrap();

        let err = Dataset::from_path(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = Dataset::from_path("/nonexistent/harvest.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
