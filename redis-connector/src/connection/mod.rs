//! Blocking and async drivers
//!
//! [`BlockingConnection`] wraps any [`redis::ConnectionLike`],
//! [`AsyncConnection`] any [`redis::aio::ConnectionLike`]. Both implement
//! [`CommandExecutor`](crate::commands::CommandExecutor), so every command
//! family is available on them; [`Pipeline`] and [`Transaction`] queue the
//! same commands for a single round trip.

pub mod blocking;
pub mod factory;
pub mod pipeline;
pub mod reactive;

pub use blocking::{BlockingConnection, ScanIter};
pub use factory::RedisConnectionFactory;
pub use pipeline::{Pipeline, PipelineResults, Queued, Transaction};
pub use reactive::AsyncConnection;

use crate::commands::Request;
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{ScanOptions, ScanPage, Tuple};
use redis_connector_core::value::RespValue;

/// One of the `SCAN` family, re-issued with each new cursor
#[derive(Debug, Clone)]
pub(crate) struct ScanRequest<T> {
    name: &'static str,
    key: Option<Bytes>,
    options: ScanOptions,
    decoder: fn(RespValue) -> RedisResult<ScanPage<T>>,
}

impl ScanRequest<Bytes> {
    pub(crate) fn keys(options: ScanOptions) -> Self {
        Self {
            name: "SCAN",
            key: None,
            options,
            decoder: reply::scan_bytes,
        }
    }

    pub(crate) fn set_members(key: &[u8], options: ScanOptions) -> Self {
        Self {
            name: "SSCAN",
            key: Some(Bytes::copy_from_slice(key)),
            options,
            decoder: reply::scan_bytes,
        }
    }
}

impl ScanRequest<(Bytes, Bytes)> {
    pub(crate) fn hash_entries(key: &[u8], options: ScanOptions) -> Self {
        Self {
            name: "HSCAN",
            key: Some(Bytes::copy_from_slice(key)),
            options,
            decoder: reply::scan_pairs,
        }
    }
}

impl ScanRequest<Tuple> {
    pub(crate) fn zset_entries(key: &[u8], options: ScanOptions) -> Self {
        Self {
            name: "ZSCAN",
            key: Some(Bytes::copy_from_slice(key)),
            options,
            decoder: reply::scan_tuples,
        }
    }
}

impl<T> ScanRequest<T> {
    /// The request for the page starting at `cursor`
    pub(crate) fn page(&self, cursor: u64) -> Request<ScanPage<T>> {
        let mut request = Request::new(self.name, self.decoder);
        if let Some(key) = &self.key {
            request = request.key(key);
        }
        request.num(cursor).with(&self.options)
    }
}

/// Cursor position of a running scan; `None` once the server reported the
/// last page or a page failed
pub(crate) fn next_cursor<T>(page: &ScanPage<T>) -> Option<u64> {
    (!page.is_finished()).then_some(page.cursor)
}
