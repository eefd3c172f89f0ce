//! Pipelines and transactions
//!
//! Commands queued on a [`Pipeline`] or [`Transaction`] are not sent until
//! the queue is run on a connection. Each queued command hands back a
//! [`Queued`] handle; once the replies arrive, [`PipelineResults::take`]
//! decodes the reply belonging to that handle with the command's own
//! converter, so an error reply only fails the handle it belongs to.
//!
//! ```no_run
//! use redis_connector::commands::StringCommands;
//! use redis_connector::connection::{BlockingConnection, Pipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = redis::Client::open("redis://127.0.0.1/")?;
//! let mut conn = BlockingConnection::new(client.get_connection()?);
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.set("key1", "value1");
//! let value = pipeline.get("key1");
//! let counter = pipeline.incr("counter");
//!
//! let mut results = conn.run_pipeline(&pipeline)?;
//! println!("{:?} {}", results.take(value)?, results.take(counter)?);
//! # Ok(())
//! # }
//! ```

use crate::commands::{decode, Command, CommandExecutor};
use crate::convert::to_redis_cmd;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::value::RespValue;
use std::fmt;

type Decoder<T> = Box<dyn FnOnce(RespValue) -> RedisResult<T> + Send>;

/// Handle to the reply of a queued command
pub enum Queued<T> {
    /// Queued at `index`, decoded with `decode`
    Reply {
        /// Position of the command in its queue
        index: usize,
        /// Converter of the queued command
        decode: Decoder<T>,
    },
    /// Rejected before it was queued
    Rejected(RedisError),
}

impl<T> Queued<T> {
    /// Position in the queue, `None` when the command was rejected
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Reply { index, .. } => Some(*index),
            Self::Rejected(_) => None,
        }
    }
}

impl<T> fmt::Debug for Queued<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reply { index, .. } => f.debug_struct("Queued").field("index", index).finish(),
            Self::Rejected(e) => f.debug_tuple("Rejected").field(e).finish(),
        }
    }
}

/// Replies of a pipeline or transaction, consumed by handle
#[derive(Debug, Default)]
pub struct PipelineResults {
    replies: Vec<Option<RespValue>>,
}

impl PipelineResults {
    /// Wrap replies in queue order
    pub fn from_replies(replies: Vec<RespValue>) -> Self {
        Self {
            replies: replies.into_iter().map(Some).collect(),
        }
    }

    /// Decode the reply of `handle`
    ///
    /// Fails if the handle was rejected, its reply is an error, or its reply
    /// was already taken.
    pub fn take<T>(&mut self, handle: Queued<T>) -> RedisResult<T> {
        match handle {
            Queued::Rejected(e) => Err(e),
            Queued::Reply { index, decode } => {
                let reply = self
                    .replies
                    .get_mut(index)
                    .and_then(Option::take)
                    .ok_or_else(|| {
                        RedisError::UnexpectedResponse(format!("no reply for queued command #{index}"))
                    })?;
                decode(reply)
            }
        }
    }

    /// Number of replies
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    /// Whether there are no replies
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Remaining raw replies, in queue order
    pub fn into_replies(self) -> Vec<Option<RespValue>> {
        self.replies
    }
}

/// A batch of commands sent in one round trip
#[derive(Clone, Default)]
pub struct Pipeline {
    inner: redis::Pipeline,
    names: Vec<String>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names of the queued commands, in order
    pub fn command_names(&self) -> &[String] {
        &self.names
    }

    /// Drop all queued commands; handles issued so far become useless
    pub fn clear(&mut self) {
        self.inner.clear();
        self.names.clear();
    }

    pub(crate) fn driver_pipeline(&self) -> &redis::Pipeline {
        &self.inner
    }

    fn queue<C>(&mut self, command: C) -> Queued<C::Output>
    where
        C: Command + Send + 'static,
        C::Output: Send + 'static,
    {
        self.inner.add_command(to_redis_cmd(&command));
        self.names.push(command.command_name().to_string());
        Queued::Reply {
            index: self.names.len() - 1,
            decode: Box::new(move |reply| decode(&command, reply)),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("commands", &self.names)
            .finish()
    }
}

impl CommandExecutor for Pipeline {
    type Reply<'a, T> = Queued<T>
    where
        Self: 'a,
        T: Send + 'static;

    fn execute<C>(&mut self, command: C) -> Queued<C::Output>
    where
        C: Command + Send + 'static,
        C::Output: Send + 'static,
    {
        self.queue(command)
    }

    fn reject<T>(&mut self, error: RedisError) -> Queued<T>
    where
        T: Send + 'static,
    {
        Queued::Rejected(error)
    }
}

/// Commands wrapped in `MULTI`/`EXEC`
///
/// Run it with `exec` on a connection. `WATCH` has to be issued on that
/// connection beforehand; the result is `None` when a watched key changed
/// and the server aborted the transaction.
#[derive(Clone)]
pub struct Transaction {
    commands: Pipeline,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        let mut commands = Pipeline::new();
        commands.inner.atomic();
        Self { commands }
    }

    /// Number of queued commands, excluding `MULTI`/`EXEC`
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Names of the queued commands, in order
    pub fn command_names(&self) -> &[String] {
        self.commands.command_names()
    }

    pub(crate) fn driver_pipeline(&self) -> &redis::Pipeline {
        self.commands.driver_pipeline()
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("commands", &self.commands.names)
            .finish()
    }
}

impl CommandExecutor for Transaction {
    type Reply<'a, T> = Queued<T>
    where
        Self: 'a,
        T: Send + 'static;

    fn execute<C>(&mut self, command: C) -> Queued<C::Output>
    where
        C: Command + Send + 'static,
        C::Output: Send + 'static,
    {
        self.commands.queue(command)
    }

    fn reject<T>(&mut self, error: RedisError) -> Queued<T>
    where
        T: Send + 'static,
    {
        Queued::Rejected(error)
    }
}

/// `offset`/`count` to pass to `req_packed_commands` for a queue of `len`
/// commands
pub(crate) const fn reply_window(atomic: bool, len: usize) -> (usize, usize) {
    if atomic {
        // skip the MULTI and QUEUED acknowledgements, keep the EXEC reply
        (len + 1, 1)
    } else {
        (0, len)
    }
}

/// Unpack the `EXEC` reply; nil means a watched key changed
pub(crate) fn exec_results(mut replies: Vec<RespValue>, len: usize) -> RedisResult<Option<PipelineResults>> {
    let reply = replies.pop().unwrap_or(RespValue::Null);
    match reply {
        RespValue::Null => Ok(None),
        RespValue::Error(message) => Err(crate::convert::server_error(message)),
        RespValue::Array(items) if items.len() == len => {
            Ok(Some(PipelineResults::from_replies(items)))
        }
        other => Err(RedisError::UnexpectedResponse(format!(
            "expected {len} EXEC replies, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{KeyCommands, StringCommands, ZSetCommands};
    use bytes::Bytes;
    use redis_connector_core::types::{Tuple, ZAddArgs};

    #[test]
    fn test_handles_follow_queue_order() {
        let mut pipeline = Pipeline::new();
        let set = pipeline.set("k", "v");
        let get = pipeline.get("k");
        let del = pipeline.del(&["k"]);
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.command_names(), ["SET", "GET", "DEL"]);

        let mut results = PipelineResults::from_replies(vec![
            RespValue::ok(),
            RespValue::BulkString(Bytes::from_static(b"v")),
            RespValue::Integer(1),
        ]);
        assert_eq!(del.index(), Some(2));
        assert_eq!(results.take(del).unwrap(), 1);
        assert_eq!(results.take(get).unwrap(), Some(Bytes::from_static(b"v")));
        results.take(set).unwrap();
    }

    #[test]
    fn test_error_reply_fails_only_its_handle() {
        let mut pipeline = Pipeline::new();
        let incr = pipeline.incr("text");
        let get = pipeline.get("text");
        let mut results = PipelineResults::from_replies(vec![
            RespValue::Error("ERR value is not an integer or out of range".into()),
            RespValue::BulkString(Bytes::from_static(b"abc")),
        ]);
        assert!(matches!(results.take(incr), Err(RedisError::Server(_))));
        assert_eq!(results.take(get).unwrap(), Some(Bytes::from_static(b"abc")));
    }

    #[test]
    fn test_rejected_command_is_not_queued() {
        let mut pipeline = Pipeline::new();
        let bad = pipeline.zadd_multiple(
            "z",
            &[Tuple::new("a", 1.0)],
            ZAddArgs::empty().if_not_exists().if_exists(),
        );
        assert!(pipeline.is_empty());
        assert_eq!(bad.index(), None);
        let mut results = PipelineResults::default();
        assert!(matches!(results.take(bad), Err(RedisError::InvalidArgument(_))));
    }

    #[test]
    fn test_exec_results() {
        assert!(exec_results(vec![RespValue::Null], 2).unwrap().is_none());
        let results = exec_results(
            vec![RespValue::Array(vec![RespValue::ok(), RespValue::Integer(3)])],
            2,
        )
        .unwrap()
        .unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            exec_results(vec![RespValue::Error("EXECABORT Transaction discarded".into())], 1),
            Err(RedisError::ExecAborted(_))
        ));
    }

    #[test]
    fn test_reply_window() {
        assert_eq!(reply_window(false, 3), (0, 3));
        assert_eq!(reply_window(true, 3), (4, 1));
    }
}
