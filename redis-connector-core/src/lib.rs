//! Driver-neutral types for the redis-connector command layer
//!
//! This crate holds everything a caller sees that does not depend on a
//! particular Redis driver: the error type, connection configuration, the
//! normalised reply value and the typed option enums that commands accept.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{ConnectionConfig, ProtocolVersion, TopologyMode};
pub use error::{NodeFailure, RedisError, RedisResult};
pub use value::RespValue;
