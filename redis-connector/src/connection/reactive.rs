//! Async driver over `redis::aio::ConnectionLike`

use super::pipeline::{exec_results, reply_window, Pipeline, PipelineResults, Transaction};
use super::{next_cursor, ScanRequest};
use crate::commands::{decode, Command, CommandExecutor};
use crate::convert::{from_redis_value, reply, to_redis_cmd, translate_error};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use redis::aio::ConnectionLike;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::types::{ScanOptions, Tuple};
use redis_connector_core::value::RespValue;
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// An async connection
///
/// Commands return boxed futures, so calls through any command family can
/// be awaited directly:
///
/// ```no_run
/// use redis_connector::commands::StringCommands;
/// use redis_connector::connection::AsyncConnection;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let mut conn = AsyncConnection::new(client.get_multiplexed_async_connection().await?);
/// conn.set("greeting", "hello").await?;
/// let value = conn.get("greeting").await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncConnection<C> {
    inner: C,
    operation_timeout: Option<Duration>,
}

/// Await `fut`, bounded by `limit` when one is set
pub(crate) async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = RedisResult<T>>,
) -> RedisResult<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RedisError::Timeout)?,
        None => fut.await,
    }
}

/// Send `command` on any async native connection and decode its reply
pub(crate) async fn request<Conn, Cm>(conn: &mut Conn, command: &Cm) -> RedisResult<Cm::Output>
where
    Conn: ConnectionLike + ?Sized,
    Cm: Command + ?Sized,
{
    let cmd = to_redis_cmd(command);
    let value = conn
        .req_packed_command(&cmd)
        .await
        .map_err(translate_error)?;
    decode(command, from_redis_value(value))
}

impl<C: ConnectionLike + Send> AsyncConnection<C> {
    /// Wrap a native connection
    pub const fn new(inner: C) -> Self {
        Self {
            inner,
            operation_timeout: None,
        }
    }

    /// Fail commands with [`RedisError::Timeout`] when no reply arrives in
    /// time
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
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

    /// Send a command by reference and decode its reply
    pub async fn send<Cm: Command + Sync + ?Sized>(&mut self, command: &Cm) -> RedisResult<Cm::Output> {
        trace!(command = command.command_name(), "dispatching");
        bounded(self.operation_timeout, request(&mut self.inner, command)).await
    }

    /// Send all commands of `pipeline` in one round trip
    pub async fn run_pipeline(&mut self, pipeline: &Pipeline) -> RedisResult<PipelineResults> {
        if pipeline.is_empty() {
            return Ok(PipelineResults::default());
        }
        debug!(commands = pipeline.len(), "running pipeline");
        let (offset, count) = reply_window(false, pipeline.len());
        let values = bounded(self.operation_timeout, async {
            self.inner
                .req_packed_commands(pipeline.driver_pipeline(), offset, count)
                .await
                .map_err(translate_error)
        })
        .await?;
        Ok(PipelineResults::from_replies(
            values.into_iter().map(from_redis_value).collect(),
        ))
    }

    /// Run `transaction` inside `MULTI`/`EXEC`
    ///
    /// `None` when a `WATCH`ed key changed and the server aborted.
    pub async fn exec(&mut self, transaction: &Transaction) -> RedisResult<Option<PipelineResults>> {
        if transaction.is_empty() {
            return Ok(Some(PipelineResults::default()));
        }
        debug!(commands = transaction.len(), "executing transaction");
        let (offset, count) = reply_window(true, transaction.len());
        let values = bounded(self.operation_timeout, async {
            self.inner
                .req_packed_commands(transaction.driver_pipeline(), offset, count)
                .await
                .map_err(translate_error)
        })
        .await?;
        let results = exec_results(values.into_iter().map(from_redis_value).collect(), transaction.len())?;
        if results.is_none() {
            debug!("transaction aborted by a watched key");
        }
        Ok(results)
    }

    /// Send an arbitrary command and return the neutral reply undecoded
    pub async fn send_raw<N: AsRef<str>, A: AsRef<[u8]>>(
        &mut self,
        name: N,
        args: &[A],
    ) -> RedisResult<RespValue> {
        let mut cmd = redis::cmd(name.as_ref());
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        let value = bounded(self.operation_timeout, async {
            self.inner
                .req_packed_command(&cmd)
                .await
                .map_err(translate_error)
        })
        .await?;
        reply::check(from_redis_value(value))
    }

    /// Stream the keyspace with `SCAN`
    pub fn scan_stream(&mut self, options: ScanOptions) -> BoxStream<'_, RedisResult<Bytes>> {
        self.scan_pages(ScanRequest::keys(options))
    }

    /// Stream the entries of a hash with `HSCAN`
    pub fn hscan_stream<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        options: ScanOptions,
    ) -> BoxStream<'_, RedisResult<(Bytes, Bytes)>> {
        self.scan_pages(ScanRequest::hash_entries(key.as_ref(), options))
    }

    /// Stream the members of a set with `SSCAN`
    pub fn sscan_stream<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        options: ScanOptions,
    ) -> BoxStream<'_, RedisResult<Bytes>> {
        self.scan_pages(ScanRequest::set_members(key.as_ref(), options))
    }

    /// Stream the members and scores of a sorted set with `ZSCAN`
    pub fn zscan_stream<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        options: ScanOptions,
    ) -> BoxStream<'_, RedisResult<Tuple>> {
        self.scan_pages(ScanRequest::zset_entries(key.as_ref(), options))
    }

    fn scan_pages<T: Send + 'static>(&mut self, request: ScanRequest<T>) -> BoxStream<'_, RedisResult<T>> {
        let state = ScanState {
            conn: self,
            request,
            cursor: Some(0),
            buffer: VecDeque::new(),
        };
        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.buffer.pop_front() {
                    return Some((Ok(item), state));
                }
                let cursor = state.cursor?;
                let page = state.request.page(cursor);
                match state.conn.execute(page).await {
                    Ok(page) => {
                        state.cursor = next_cursor(&page);
                        state.buffer.extend(page.items);
                    }
                    Err(e) => {
                        state.cursor = None;
                        return Some((Err(e), state));
                    }
                }
            }
        })
        .boxed()
    }
}

struct ScanState<'a, C, T> {
    conn: &'a mut AsyncConnection<C>,
    request: ScanRequest<T>,
    cursor: Option<u64>,
    buffer: VecDeque<T>,
}

impl<C: ConnectionLike + Send> CommandExecutor for AsyncConnection<C> {
    type Reply<'a, T> = BoxFuture<'a, RedisResult<T>>
    where
        Self: 'a,
        T: Send + 'static;

    fn execute<Cm>(&mut self, command: Cm) -> BoxFuture<'_, RedisResult<Cm::Output>>
    where
        Cm: Command + Send + 'static,
        Cm::Output: Send + 'static,
    {
        Box::pin(async move {
            let cmd = to_redis_cmd(&command);
            trace!(command = command.command_name(), "dispatching");
            let value = bounded(self.operation_timeout, async {
                self.inner
                    .req_packed_command(&cmd)
                    .await
                    .map_err(translate_error)
            })
            .await?;
            decode(&command, from_redis_value(value))
        })
    }

    fn reject<T>(&mut self, error: RedisError) -> BoxFuture<'_, RedisResult<T>>
    where
        T: Send + 'static,
    {
        Box::pin(async move { Err(error) })
    }
}

impl<C> std::fmt::Debug for AsyncConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncConnection")
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
