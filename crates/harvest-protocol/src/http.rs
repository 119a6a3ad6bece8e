//! HTTP API types

use serde::{Deserialize, Serialize};

/// HTTP API endpoint paths
pub mod endpoints {
    pub const ROOT: &str = "/";
    pub const CATALOG: &str = "/catalog";
    pub const VALIDATE: &str = "/validate";
    pub const PLAN: &str = "/plan";
    pub const IDENTS: &str = "/idents";
    pub const COUNT: &str = "/count";
}

/// Error body shared by every failure response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of a successful count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}
