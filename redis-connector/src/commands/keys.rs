//! Generic key commands

use super::{invalid, Command, CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{
    DataType, ExpireCondition, ScanOptions, ScanPage, SortParameters, TimeUnit, ValueEncoding,
};
use redis_connector_core::value::RespValue;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// `TTL`/`PTTL` with the result converted to a caller chosen unit
///
/// Only positive values are converted; `-1` (no expiry) and `-2` (missing
/// key) come back unchanged.
#[derive(Debug, Clone)]
pub struct TtlCommand {
    key: Bytes,
    precise: bool,
    unit: TimeUnit,
}

impl TtlCommand {
    /// `TTL key`, converted from seconds to `unit`
    pub fn seconds(key: impl AsRef<[u8]>, unit: TimeUnit) -> Self {
        Self {
            key: Bytes::copy_from_slice(key.as_ref()),
            precise: false,
            unit,
        }
    }

    /// `PTTL key`, converted from milliseconds to `unit`
    pub fn millis(key: impl AsRef<[u8]>, unit: TimeUnit) -> Self {
        Self {
            precise: true,
            ..Self::seconds(key, unit)
        }
    }
}

impl Command for TtlCommand {
    type Output = i64;

    fn command_name(&self) -> &str {
        if self.precise {
            "PTTL"
        } else {
            "TTL"
        }
    }

    fn args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        let source = if self.precise {
            TimeUnit::Milliseconds
        } else {
            TimeUnit::Seconds
        };
        reply::ttl_in(response, source, self.unit)
    }

    fn keys(&self) -> Vec<&[u8]> {
        vec![&self.key[..]]
    }
}

/// Commands operating on keys regardless of their type
pub trait KeyCommands: CommandExecutor {
    /// `COPY source destination [REPLACE]`
    fn copy<S: AsRef<[u8]>, D: AsRef<[u8]>>(
        &mut self,
        source: S,
        destination: D,
        replace: bool,
    ) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("COPY", reply::boolean)
                .key(source)
                .key(destination)
                .flag(replace, "REPLACE"),
        )
    }

    /// `DEL key [key ...]`, number of keys removed
    fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("DEL", reply::integer).multi_key(keys))
    }

    /// `UNLINK key [key ...]`, non-blocking removal
    fn unlink<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("UNLINK", reply::integer).multi_key(keys))
    }

    /// `EXISTS key [key ...]`, a key given twice counts twice
    fn exists<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("EXISTS", reply::integer).multi_key(keys))
    }

    /// `TYPE key`
    fn key_type<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, DataType> {
        self.execute(Request::new("TYPE", reply::data_type).key(key))
    }

    /// `TOUCH key [key ...]`
    fn touch<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("TOUCH", reply::integer).multi_key(keys))
    }

    /// `KEYS pattern`
    fn keys<P: AsRef<[u8]>>(&mut self, pattern: P) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("KEYS", reply::bytes_list).arg(pattern))
    }

    /// One `SCAN` step
    fn scan(&mut self, cursor: u64, options: &ScanOptions) -> Self::Reply<'_, ScanPage<Bytes>> {
        self.execute(
            Request::new("SCAN", reply::scan_bytes)
                .num(cursor)
                .with(options),
        )
    }

    /// `RANDOMKEY`
    fn random_key(&mut self) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("RANDOMKEY", reply::optional_bytes))
    }

    /// `RENAME key newkey`
    fn rename<K: AsRef<[u8]>, N: AsRef<[u8]>>(&mut self, key: K, new_key: N) -> Self::Reply<'_, ()> {
        self.execute(Request::new("RENAME", reply::ok).key(key).key(new_key))
    }

    /// `RENAMENX key newkey`
    fn rename_nx<K: AsRef<[u8]>, N: AsRef<[u8]>>(
        &mut self,
        key: K,
        new_key: N,
    ) -> Self::Reply<'_, bool> {
        self.execute(Request::new("RENAMENX", reply::boolean).key(key).key(new_key))
    }

    /// Set a timeout: `PEXPIRE` when `timeout` has sub-second precision,
    /// `EXPIRE` otherwise
    fn expire<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        timeout: Duration,
        condition: ExpireCondition,
    ) -> Self::Reply<'_, bool> {
        let request = if timeout.subsec_nanos() == 0 {
            Request::new("EXPIRE", reply::boolean)
                .key(key)
                .num(timeout.as_secs())
        } else {
            Request::new("PEXPIRE", reply::boolean)
                .key(key)
                .num(timeout.as_millis())
        };
        self.execute(request.with(&condition))
    }

    /// Expire at a point in time: `PEXPIREAT` when `at` has millisecond
    /// precision, `EXPIREAT` otherwise
    fn expire_at<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        at: SystemTime,
        condition: ExpireCondition,
    ) -> Self::Reply<'_, bool> {
        let since_epoch = match at.duration_since(UNIX_EPOCH) {
            Ok(d) => d,
            Err(_) => return self.reject(invalid("Expiration time is before the unix epoch")),
        };
        let request = if since_epoch.subsec_millis() == 0 {
            Request::new("EXPIREAT", reply::boolean)
                .key(key)
                .num(since_epoch.as_secs())
        } else {
            Request::new("PEXPIREAT", reply::boolean)
                .key(key)
                .num(since_epoch.as_millis())
        };
        self.execute(request.with(&condition))
    }

    /// `PERSIST key`
    fn persist<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, bool> {
        self.execute(Request::new("PERSIST", reply::boolean).key(key))
    }

    /// `MOVE key db`
    fn move_key<K: AsRef<[u8]>>(&mut self, key: K, database: u32) -> Self::Reply<'_, bool> {
        self.execute(Request::new("MOVE", reply::boolean).key(key).num(database))
    }

    /// `TTL key` in seconds; `-1` without expiry, `-2` for a missing key
    fn ttl<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("TTL", reply::integer).key(key))
    }

    /// `TTL key` converted to `unit`
    fn ttl_in<K: AsRef<[u8]>>(&mut self, key: K, unit: TimeUnit) -> Self::Reply<'_, i64> {
        self.execute(TtlCommand::seconds(key, unit))
    }

    /// `PTTL key` in milliseconds
    fn pttl<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("PTTL", reply::integer).key(key))
    }

    /// `PTTL key` converted to `unit`
    fn pttl_in<K: AsRef<[u8]>>(&mut self, key: K, unit: TimeUnit) -> Self::Reply<'_, i64> {
        self.execute(TtlCommand::millis(key, unit))
    }

    /// `SORT key ...`; `GET` patterns may yield nil entries
    fn sort<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        params: &SortParameters,
    ) -> Self::Reply<'_, Vec<Option<Bytes>>> {
        self.execute(
            Request::new("SORT", reply::optional_bytes_list)
                .key(key)
                .with(params),
        )
    }

    /// `SORT key ... STORE destination`
    fn sort_store<K: AsRef<[u8]>, D: AsRef<[u8]>>(
        &mut self,
        key: K,
        params: &SortParameters,
        destination: D,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("SORT", reply::integer)
                .key(key)
                .with(params)
                .arg("STORE")
                .key(destination),
        )
    }

    /// `DUMP key`
    fn dump<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("DUMP", reply::optional_bytes).key(key))
    }

    /// `RESTORE key ttl serialized-value [REPLACE]`; a zero TTL never expires
    fn restore<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        ttl: Duration,
        serialized: V,
        replace: bool,
    ) -> Self::Reply<'_, ()> {
        self.execute(
            Request::new("RESTORE", reply::ok)
                .key(key)
                .num(ttl.as_millis())
                .arg(serialized)
                .flag(replace, "REPLACE"),
        )
    }

    /// `OBJECT ENCODING key`
    fn object_encoding<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, ValueEncoding> {
        self.execute(Request::new("OBJECT ENCODING", reply::value_encoding).key(key))
    }

    /// `OBJECT IDLETIME key`
    fn object_idle_time<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Duration>> {
        self.execute(Request::new("OBJECT IDLETIME", reply::idle_time).key(key))
    }

    /// `OBJECT REFCOUNT key`
    fn object_ref_count<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<i64>> {
        self.execute(Request::new("OBJECT REFCOUNT", reply::optional_integer).key(key))
    }
}

impl<T: CommandExecutor> KeyCommands for T {}
