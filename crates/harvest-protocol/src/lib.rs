//! Harvest Evaluator Protocol
//!
//! Wire-level pieces of the HTTP API.
//!
//! # Codecs
//!
//! - **JSON**: `application/json`, the default
//! - **MessagePack**: `application/msgpack`, compact binary alternative

pub mod codec;
pub mod http;

pub use codec::{
    APPLICATION_JSON, APPLICATION_MSGPACK, Codec, CodecError, CodecRegistry, Result,
};
pub use http::{CountResponse, ErrorResponse, endpoints};
