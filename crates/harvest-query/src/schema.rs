//! Schema of the in-memory engine
//!
//! Every concept is a view over one root table. Fields map to columns of
//! that table and declare the operators they accept.

use harvest_core::Ident;
use harvest_core::operator::{EXACT, GT, GTE, IN, LT, LTE, NOT_EXACT, NOT_IN, NOT_RANGE, RANGE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Simple data type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    String,
    Boolean,
}

impl DataType {
    /// Name shown in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        }
    }

    /// Operators a field of this type accepts when none are declared
    pub fn default_operators(&self) -> Vec<String> {
        let ops: &[&str] = match self {
            DataType::Number => &[
                EXACT, NOT_EXACT, RANGE, NOT_RANGE, GT, GTE, LT, LTE, IN, NOT_IN,
            ],
            DataType::String => &[EXACT, NOT_EXACT, IN, NOT_IN],
            DataType::Boolean => &[EXACT, NOT_EXACT],
        };
        ops.iter().map(|op| op.to_string()).collect()
    }

    /// Returns true if `value` is a non-null value of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            DataType::Number => value.is_number(),
            DataType::String => value.is_string(),
            DataType::Boolean => value.is_boolean(),
        }
    }
}

/// A filterable field of a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: Ident,
    pub label: String,

    /// Column of the root table
    pub column: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    #[serde(default)]
    pub doc: Option<String>,

    /// Canonical operator names; empty means the type's defaults
    #[serde(default)]
    pub operators: Vec<String>,
}

impl FieldDef {
    pub fn new(id: impl Into<Ident>, label: &str, column: &str, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            label: label.to_string(),
            column: column.to_string(),
            data_type,
            doc: None,
            operators: Vec::new(),
        }
    }

    /// Operators this field accepts
    pub fn allowed_operators(&self) -> Vec<String> {
        if self.operators.is_empty() {
            self.data_type.default_operators()
        } else {
            self.operators.clone()
        }
    }

    pub fn allows(&self, operator: &str) -> bool {
        self.allowed_operators().iter().any(|op| op == operator)
    }
}

/// A queryable concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDef {
    pub id: Ident,
    pub label: String,

    #[serde(default)]
    pub doc: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    pub fields: Vec<FieldDef>,
}

impl ConceptDef {
    pub fn field(&self, id: &Ident) -> Option<&FieldDef> {
        self.fields.iter().find(|f| &f.id == id)
    }
}

/// Root table and the concepts defined over it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub table: String,
    pub primary_key: String,
    pub concepts: Vec<ConceptDef>,
}

impl Schema {
    pub fn concept(&self, id: &Ident) -> Option<&ConceptDef> {
        self.concepts.iter().find(|c| &c.id == id)
    }

    /// Resolve a column name, mapping the `pk` alias to the primary key.
    ///
    /// Only the primary key and columns bound to some field are known.
    pub fn resolve_column<'a>(&'a self, column: &'a str) -> Option<&'a str> {
        if column == crate::engine::PK || column == self.primary_key {
            return Some(&self.primary_key);
        }

        self.concepts
            .iter()
            .flat_map(|c| c.fields.iter())
            .find(|f| f.column == column)
            .map(|f| f.column.as_str())
    }
}
