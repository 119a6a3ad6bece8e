//! Harvest Evaluator Server
//!
//! HTTP front end over the evaluation modes.
//!
//! # Endpoints
//!
//! - `GET /` - liveness
//! - `GET /catalog` - concepts, fields and operators
//! - `POST /validate`, `/plan`, `/idents`, `/count` - evaluation modes
//!
//! Bodies are JSON or MessagePack, chosen by `Content-Type` and `Accept`.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod server;

pub use cli::Cli;
pub use config::ServerConfig;
pub use http_server::{AppState, create_router};
pub use server::Server;
