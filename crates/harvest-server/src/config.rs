//! Server configuration

use harvest_core::{Error, Result};
use harvest_query::translator::{DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// HTTP API port
    pub port: u16,

    /// Debug mode
    pub debug: bool,

    /// Log level
    pub log_level: String,

    /// Maximum expression nesting depth
    pub max_depth: usize,

    /// JSON dataset for the in-memory engine; the sample dataset if unset
    pub data_file: Option<PathBuf>,

    /// Maximum request body size in bytes
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            log_level: "info".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            data_file: None,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    /// Create configuration for development
    pub fn for_development() -> Self {
        Self {
            debug: true,
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Create configuration for production
    pub fn for_production() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8100,
            log_level: "info".to_string(),
            ..Default::default()
        }
    }

    /// Builder: set host
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Builder: set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: enable debug mode, which also raises the log level
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self.log_level = "debug".to_string();
        self
    }

    /// Builder: set log level
    pub fn log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    /// Builder: set maximum expression depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder: load rows and schema from a data file
    pub fn data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Builder: set request body limit
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }

    /// Address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SUPPORTED_DEPTH).contains(&self.max_depth) {
            return Err(Error::Configuration(format!(
                "max_depth must be between 1 and {}",
                MAX_SUPPORTED_DEPTH
            )));
        }
        if self.body_limit_bytes == 0 {
            return Err(Error::Configuration(
                "body_limit_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
