//! Catalog of queryable concepts
//!
//! Lists concepts, their fields and the operators clients may use on
//! them. Operators are advertised under their public tokens.

use crate::schema::{FieldDef, Schema};
use harvest_core::Ident;
use harvest_core::operator::{
    EXACT, GT, GTE, IN, LT, LTE, NOT_EXACT, NOT_IN, NOT_RANGE, PUBLIC_OPERATORS, RANGE,
    public_name,
};
use serde::{Deserialize, Serialize};

/// Catalog format version
pub const CATALOG_VERSION: &str = "1.0.0";

/// Anything that can describe its queryable concepts
pub trait CatalogSource: Send + Sync {
    fn catalog(&self) -> Catalog;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub concepts: Vec<CatalogConcept>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConcept {
    pub id: Ident,
    pub label: String,
    pub doc: Option<String>,
    pub keywords: Vec<String>,
    pub params: Vec<CatalogParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogParam {
    pub id: Ident,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub doc: Option<String>,
    pub operators: Vec<CatalogOperator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogOperator {
    /// Public operator token
    pub id: String,
    pub doc: String,
    /// Whether the operator takes more than one value
    pub multiple: bool,
}

impl Catalog {
    /// Describe every concept of a schema
    pub fn from_schema(schema: &Schema) -> Self {
        let concepts = schema
            .concepts
            .iter()
            .map(|concept| CatalogConcept {
                id: concept.id.clone(),
                label: concept.label.clone(),
                doc: concept.doc.clone(),
                keywords: concept.keywords.clone(),
                params: concept.fields.iter().map(describe_field).collect(),
            })
            .collect();

        Self {
            version: CATALOG_VERSION.to_string(),
            concepts,
        }
    }
}

fn describe_field(field: &FieldDef) -> CatalogParam {
    let operators = field
        .allowed_operators()
        .iter()
        .filter(|op| PUBLIC_OPERATORS.contains(&op.as_str()))
        .map(|op| CatalogOperator {
            id: public_name(op).to_string(),
            doc: verbose_name(op).to_string(),
            multiple: matches!(op.as_str(), IN | NOT_IN | RANGE | NOT_RANGE),
        })
        .collect();

    CatalogParam {
        id: field.id.clone(),
        label: field.label.clone(),
        data_type: field.data_type.as_str().to_string(),
        doc: field.doc.clone(),
        operators,
    }
}

fn verbose_name(op: &str) -> &'static str {
    match op {
        EXACT => "is equal to",
        NOT_EXACT => "is not equal to",
        RANGE => "is between",
        NOT_RANGE => "is not between",
        GT => "is greater than",
        GTE => "is greater than or equal to",
        LT => "is less than",
        LTE => "is less than or equal to",
        IN => "is either",
        NOT_IN => "is neither",
        _ => "",
    }
}
