//! Blocking driver over `redis::ConnectionLike`

use super::pipeline::{exec_results, reply_window, Pipeline, PipelineResults, Transaction};
use super::{next_cursor, ScanRequest};
use crate::commands::{decode, Command, CommandExecutor};
use crate::convert::{from_redis_value, to_redis_cmd, translate_error};
use bytes::Bytes;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::types::{ScanOptions, Tuple};
use redis_connector_core::value::RespValue;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// A blocking connection
///
/// Every command family is available through
/// [`CommandExecutor`]; commands return their decoded result directly.
pub struct BlockingConnection<C> {
    inner: C,
}

impl<C: redis::ConnectionLike> BlockingConnection<C> {
    /// Wrap a native connection
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    /// The native connection
    pub const fn get_ref(&self) -> &C {
        &self.inner
    }

    /// The native connection, mutably
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap the native connection
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Database index the connection was opened on
    pub fn database(&self) -> i64 {
        self.inner.get_db()
    }

    /// Whether the connection is still usable
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Send `PING` and report whether the server answered
    pub fn check_connection(&mut self) -> bool {
        self.inner.check_connection()
    }

    /// Send a command by reference and decode its reply
    pub fn send<Cm: Command + ?Sized>(&mut self, command: &Cm) -> RedisResult<Cm::Output> {
        let packed = to_redis_cmd(command).get_packed_command();
        trace!(command = command.command_name(), "dispatching");
        let value = self
            .inner
            .req_packed_command(&packed)
            .map_err(translate_error)?;
        decode(command, from_redis_value(value))
    }

    /// Send all commands of `pipeline` in one round trip
    pub fn run_pipeline(&mut self, pipeline: &Pipeline) -> RedisResult<PipelineResults> {
        if pipeline.is_empty() {
            return Ok(PipelineResults::default());
        }
        debug!(commands = pipeline.len(), "running pipeline");
        let (offset, count) = reply_window(false, pipeline.len());
        let values = self
            .inner
            .req_packed_commands(&pipeline.driver_pipeline().get_packed_pipeline(), offset, count)
            .map_err(translate_error)?;
        Ok(PipelineResults::from_replies(
            values.into_iter().map(from_redis_value).collect(),
        ))
    }

    /// Run `transaction` inside `MULTI`/`EXEC`
    ///
    /// `None` when a `WATCH`ed key changed and the server aborted.
    pub fn exec(&mut self, transaction: &Transaction) -> RedisResult<Option<PipelineResults>> {
        if transaction.is_empty() {
            return Ok(Some(PipelineResults::default()));
        }
        debug!(commands = transaction.len(), "executing transaction");
        let (offset, count) = reply_window(true, transaction.len());
        let values = self
            .inner
            .req_packed_commands(
                &transaction.driver_pipeline().get_packed_pipeline(),
                offset,
                count,
            )
            .map_err(translate_error)?;
        let results = exec_results(values.into_iter().map(from_redis_value).collect(), transaction.len())?;
        if results.is_none() {
            debug!("transaction aborted by a watched key");
        }
        Ok(results)
    }

    /// Iterate over the keyspace with `SCAN`
    pub fn scan_iter(&mut self, options: ScanOptions) -> ScanIter<'_, C, Bytes> {
        ScanIter::new(self, ScanRequest::keys(options))
    }

    /// Iterate over the entries of a hash with `HSCAN`
    pub fn hscan_iter<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        options: ScanOptions,
    ) -> ScanIter<'_, C, (Bytes, Bytes)> {
        ScanIter::new(self, ScanRequest::hash_entries(key.as_ref(), options))
    }

    /// Iterate over the members of a set with `SSCAN`
    pub fn sscan_iter<K: AsRef<[u8]>>(&mut self, key: K, options: ScanOptions) -> ScanIter<'_, C, Bytes> {
        ScanIter::new(self, ScanRequest::set_members(key.as_ref(), options))
    }

    /// Iterate over the members and scores of a sorted set with `ZSCAN`
    pub fn zscan_iter<K: AsRef<[u8]>>(&mut self, key: K, options: ScanOptions) -> ScanIter<'_, C, Tuple> {
        ScanIter::new(self, ScanRequest::zset_entries(key.as_ref(), options))
    }
}

impl<C: redis::ConnectionLike> CommandExecutor for BlockingConnection<C> {
    type Reply<'a, T> = RedisResult<T>
    where
        Self: 'a,
        T: Send + 'static;

    fn execute<Cm>(&mut self, command: Cm) -> RedisResult<Cm::Output>
    where
        Cm: Command + Send + 'static,
        Cm::Output: Send + 'static,
    {
        self.send(&command)
    }

    fn reject<T>(&mut self, error: RedisError) -> RedisResult<T>
    where
        T: Send + 'static,
    {
        Err(error)
    }
}

impl<C> std::fmt::Debug for BlockingConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingConnection").finish_non_exhaustive()
    }
}

/// Cursor driven iteration; pages are fetched lazily
///
/// Elements may repeat across pages, as the server allows. An error ends
/// the iteration after being yielded once.
pub struct ScanIter<'a, C, T> {
    conn: &'a mut BlockingConnection<C>,
    request: ScanRequest<T>,
    cursor: Option<u64>,
    buffer: VecDeque<T>,
}

impl<'a, C: redis::ConnectionLike, T> ScanIter<'a, C, T> {
    fn new(conn: &'a mut BlockingConnection<C>, request: ScanRequest<T>) -> Self {
        Self {
            conn,
            request,
            cursor: Some(0),
            buffer: VecDeque::new(),
        }
    }
}

impl<C: redis::ConnectionLike, T> Iterator for ScanIter<'_, C, T> {
    type Item = RedisResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            let cursor = self.cursor?;
            match self.conn.send(&self.request.page(cursor)) {
                Ok(page) => {
                    self.cursor = next_cursor(&page);
                    self.buffer.extend(page.items);
                }
                Err(e) => {
                    self.cursor = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Raw access for callers that need a reply the families do not cover
impl<C: redis::ConnectionLike> BlockingConnection<C> {
    /// Send an arbitrary command and return the neutral reply undecoded
    pub fn send_raw<N: AsRef<str>, A: AsRef<[u8]>>(&mut self, name: N, args: &[A]) -> RedisResult<RespValue> {
        let mut cmd = redis::cmd(name.as_ref());
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        let value = self
            .inner
            .req_packed_command(&cmd.get_packed_command())
            .map_err(translate_error)?;
        crate::convert::reply::check(from_redis_value(value))
    }
}
