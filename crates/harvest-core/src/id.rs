//! Concept and field identifiers
//!
//! Clients may address concepts and fields either by numeric primary key or
//! by name. Both forms are carried through translation untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a concept or a field
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ident {
    /// Numeric primary key
    Id(u64),

    /// Symbolic name
    Name(String),
}

impl Ident {
    /// Create a symbolic identifier
    pub fn name(name: impl Into<String>) -> Self {
        Ident::Name(name.into())
    }
}

impl From<u64> for Ident {
    fn from(id: u64) -> Self {
        Ident::Id(id)
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::Name(name.to_string())
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Ident::Name(name)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Id(id) => write!(f, "Ident({})", id),
            Ident::Name(name) => write!(f, "Ident({:?})", name),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Id(id) => write!(f, "{}", id),
            Ident::Name(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_untagged_serde() {
        let id: Ident = serde_json::from_str("7").unwrap();
        assert_eq!(id, Ident::Id(7));

        let name: Ident = serde_json::from_str("\"patient\"").unwrap();
        assert_eq!(name, Ident::name("patient"));

        assert_eq!(serde_json::to_string(&Ident::Id(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Ident::name("age")).unwrap(), "\"age\"");
    }

    #[test]
    fn test_ident_display() {
        assert_eq!(Ident::Id(12).to_string(), "12");
        assert_eq!(Ident::name("age").to_string(), "age");
    }
}
