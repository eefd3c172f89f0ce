//! Converters between the neutral model and the wrapped driver
//!
//! - [`args`] writes neutral options as argument tokens
//! - [`reply`] decodes neutral replies into result types
//! - [`driver`] maps commands, replies and errors to and from redis-rs

pub mod args;
pub mod driver;
pub mod reply;

pub use args::CommandArgs;
pub use driver::{from_redis_value, server_error, to_redis_cmd, translate_error};
