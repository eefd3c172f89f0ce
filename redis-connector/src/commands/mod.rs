//! Driver-agnostic command model
//!
//! A [`Command`] knows its name, its neutral arguments and how to decode the
//! reply. A [`CommandExecutor`] runs commands on some driver and hands back
//! the result in whatever shape that driver produces: a value for blocking
//! connections, a future for async connections, a handle for pipelines.
//!
//! The per-family traits ([`KeyCommands`], [`StringCommands`], ...) are
//! implemented for every executor, so the same call works everywhere:
//!
//! ```no_run
//! use redis_connector::commands::StringCommands;
//! use redis_connector::connection::BlockingConnection;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = redis::Client::open("redis://127.0.0.1/")?;
//! let mut conn = BlockingConnection::new(client.get_connection()?);
//! conn.set("greeting", "hello")?;
//! assert_eq!(conn.get("greeting")?.as_deref(), Some(&b"hello"[..]));
//! # Ok(())
//! # }
//! ```

pub mod geo;
pub mod hash;
pub mod hyperloglog;
pub mod keys;
pub mod list;
pub mod pubsub;
pub mod scripting;
pub mod server;
pub mod set;
pub mod sorted_set;
pub mod strings;
pub mod transaction;

use crate::convert::{args::CommandArgs, reply};
use bytes::Bytes;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::value::RespValue;
use std::borrow::Cow;
use std::fmt;

pub use geo::{GeoCommands, GeoDistCommand, GeoRadiusCommand};
pub use hash::HashCommands;
pub use hyperloglog::HyperLogLogCommands;
pub use keys::{KeyCommands, TtlCommand};
pub use list::ListCommands;
pub use pubsub::PubSubCommands;
pub use scripting::{EvalCommand, ScriptingCommands};
pub use server::{ConnectionCommands, ServerCommands, TimeCommand};
pub use set::SetCommands;
pub use sorted_set::ZSetCommands;
pub use strings::StringCommands;
pub use transaction::TransactionCommands;

/// Trait for commands that can be executed
pub trait Command {
    /// The return type of the command
    type Output;

    /// Get the command name; may contain a sub-command (`CONFIG GET`)
    fn command_name(&self) -> &str;

    /// Get the command arguments
    fn args(&self) -> Vec<Bytes>;

    /// Parse the response into the output type
    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output>;

    /// Get the key(s) involved in this command (for cluster routing)
    fn keys(&self) -> Vec<&[u8]>;
}

/// Decode a reply for `command`, turning error replies into errors first
pub fn decode<C: Command + ?Sized>(command: &C, response: RespValue) -> RedisResult<C::Output> {
    command.parse_response(reply::check(response)?)
}

/// Something that runs commands
///
/// `Reply` is what a caller gets back for a command producing `T`:
/// `RedisResult<T>` on a blocking connection, a boxed future on an async
/// connection, a [`Queued`](crate::connection::Queued) handle on a pipeline.
pub trait CommandExecutor {
    /// Result of submitting a command
    type Reply<'a, T>
    where
        Self: 'a,
        T: Send + 'static;

    /// Submit a command
    fn execute<C>(&mut self, command: C) -> Self::Reply<'_, C::Output>
    where
        C: Command + Send + 'static,
        C::Output: Send + 'static;

    /// Fail without contacting the server, used when arguments are invalid
    fn reject<T>(&mut self, error: RedisError) -> Self::Reply<'_, T>
    where
        T: Send + 'static;
}

/// A command assembled from a name, arguments and a reply decoder
///
/// Covers every command whose decoding only depends on the reply itself.
pub struct Request<T> {
    name: Cow<'static, str>,
    args: Vec<Bytes>,
    key_positions: Vec<usize>,
    decoder: fn(RespValue) -> RedisResult<T>,
}

impl<T> Request<T> {
    /// Create a request without arguments
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        decoder: fn(RespValue) -> RedisResult<T>,
    ) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            key_positions: Vec::new(),
            decoder,
        }
    }

    /// Append a key
    #[must_use]
    pub fn key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.key_positions.push(self.args.len());
        self.args.push(Bytes::copy_from_slice(key.as_ref()));
        self
    }

    /// Append several keys
    #[must_use]
    pub fn multi_key<K: AsRef<[u8]>>(mut self, keys: &[K]) -> Self {
        for key in keys {
            self = self.key(key);
        }
        self
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn multi_arg<A: AsRef<[u8]>>(mut self, args: &[A]) -> Self {
        self.args
            .extend(args.iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// Append an already encoded argument
    #[must_use]
    pub fn arg_bytes(mut self, arg: Bytes) -> Self {
        self.args.push(arg);
        self
    }

    /// Append a number in its decimal form
    #[must_use]
    pub fn num(mut self, n: impl ToString) -> Self {
        self.args.push(Bytes::from(n.to_string()));
        self
    }

    /// Append a keyword when `condition` holds
    #[must_use]
    pub fn flag(mut self, condition: bool, keyword: &'static str) -> Self {
        if condition {
            self.args.push(Bytes::from_static(keyword.as_bytes()));
        }
        self
    }

    /// Append the tokens of a neutral option
    #[must_use]
    pub fn with(mut self, options: &impl CommandArgs) -> Self {
        options.write_args(&mut self.args);
        self
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl<T> Command for Request<T> {
    type Output = T;

    fn command_name(&self) -> &str {
        &self.name
    }

    fn args(&self) -> Vec<Bytes> {
        self.args.clone()
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        (self.decoder)(response)
    }

    fn keys(&self) -> Vec<&[u8]> {
        self.key_positions
            .iter()
            .map(|&i| self.args[i].as_ref())
            .collect()
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> RedisError {
    RedisError::InvalidArgument(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tracks_keys() {
        let request = Request::new("MSET", reply::ok)
            .key("k1")
            .arg("v1")
            .key("k2")
            .arg("v2");
        assert_eq!(request.command_name(), "MSET");
        assert_eq!(request.args().len(), 4);
        assert_eq!(request.keys(), vec![&b"k1"[..], &b"k2"[..]]);
    }

    #[test]
    fn test_decode_checks_error_replies() {
        let request = Request::new("GET", reply::optional_bytes).key("k");
        assert!(decode(&request, RespValue::Error("ERR boom".into())).is_err());
        assert_eq!(decode(&request, RespValue::Null).unwrap(), None);
    }
}
