//! Driver-agnostic Redis commands over redis-rs connections
//!
//! `redis-connector` puts one typed command interface in front of the
//! blocking and the async redis-rs drivers. Commands are grouped in family
//! traits ([`commands::StringCommands`], [`commands::HashCommands`], ...)
//! implemented for every [`commands::CommandExecutor`]: a blocking
//! connection returns results directly, an async connection returns
//! futures, a pipeline or transaction returns handles to read the result
//! from once the batch has run.
//!
//! # Features
//!
//! - One command surface for blocking, async, pipelined and transactional use
//! - Replies decoded into typed values, server errors classified
//! - Redis Cluster: keyed routing by the native client, node-level commands
//!   with redirect handling and per-node result aggregation
//! - Pub/Sub subscriptions as listeners or streams
//! - Lua scripts sent by digest with a fallback to the source
//!
//! # Quick Start
//!
//! ```no_run
//! use redis_connector::commands::StringCommands;
//! use redis_connector::connection::RedisConnectionFactory;
//! use redis_connector::ConnectionConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = RedisConnectionFactory::new(ConnectionConfig::new("redis://localhost:6379"))?;
//!     let mut conn = factory.get_async_connection().await?;
//!
//!     conn.set("mykey", "myvalue").await?;
//!     let value = conn.get("mykey").await?;
//!     println!("Value: {:?}", value);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]

pub mod cluster;
pub mod commands;
pub mod connection;
pub mod convert;
pub mod pubsub;
pub mod script;

pub use connection::RedisConnectionFactory;
pub use redis_connector_core::types;
pub use redis_connector_core::{
    config::{ConnectionConfig, ProtocolVersion, TopologyMode},
    error::{NodeFailure, RedisError, RedisResult},
    value::RespValue,
};
pub use script::RedisScript;
