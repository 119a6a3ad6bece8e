//! Command line arguments

use crate::config::ServerConfig;
use clap::Parser;
use harvest_query::translator::DEFAULT_MAX_DEPTH;
use std::path::PathBuf;

/// Harvest query evaluator
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bind host
    #[arg(long, env = "HARVEST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port
    #[arg(long, env = "HARVEST_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Enable debug mode
    #[arg(long)]
    pub debug: bool,

    /// JSON dataset with schema and rows
    #[arg(long = "data", env = "HARVEST_DATA")]
    pub data_file: Option<PathBuf>,

    /// Maximum expression nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(&self.host, self.port).max_depth(self.max_depth);
        if self.debug {
            config = config.with_debug();
        }
        if let Some(path) = self.data_file {
            config = config.data_file(path);
        }
        config
    }
}
