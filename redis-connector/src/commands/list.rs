//! List commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::args::format_timeout;
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::types::{ListDirection, ListPosition};
use std::time::Duration;

const fn direction(direction: ListDirection) -> &'static str {
    match direction {
        ListDirection::Left => "LEFT",
        ListDirection::Right => "RIGHT",
    }
}

/// Commands on list values
pub trait ListCommands: CommandExecutor {
    /// `LPUSH key element [element ...]`, the new length
    fn lpush<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, values: &[V]) -> Self::Reply<'_, i64> {
        if values.is_empty() {
            return self.reject(invalid("LPUSH needs at least one element"));
        }
        self.execute(Request::new("LPUSH", reply::integer).key(key).multi_arg(values))
    }

    /// `RPUSH key element [element ...]`, the new length
    fn rpush<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, values: &[V]) -> Self::Reply<'_, i64> {
        if values.is_empty() {
            return self.reject(invalid("RPUSH needs at least one element"));
        }
        self.execute(Request::new("RPUSH", reply::integer).key(key).multi_arg(values))
    }

    /// `LPUSHX key element [element ...]`; nothing happens on a missing key
    fn lpushx<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, values: &[V]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("LPUSHX", reply::integer).key(key).multi_arg(values))
    }

    /// `RPUSHX key element [element ...]`; nothing happens on a missing key
    fn rpushx<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, values: &[V]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("RPUSHX", reply::integer).key(key).multi_arg(values))
    }

    /// `LINSERT key BEFORE|AFTER pivot element`; `-1` when the pivot is
    /// missing
    fn linsert<K: AsRef<[u8]>, P: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        position: ListPosition,
        pivot: P,
        value: V,
    ) -> Self::Reply<'_, i64> {
        let position = match position {
            ListPosition::Before => "BEFORE",
            ListPosition::After => "AFTER",
        };
        self.execute(
            Request::new("LINSERT", reply::integer)
                .key(key)
                .arg(position)
                .arg(pivot)
                .arg(value),
        )
    }

    /// `LSET key index element`
    fn lset<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, index: i64, value: V) -> Self::Reply<'_, ()> {
        self.execute(Request::new("LSET", reply::ok).key(key).num(index).arg(value))
    }

    /// `LREM key count element`, number removed
    fn lrem<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, count: i64, value: V) -> Self::Reply<'_, i64> {
        self.execute(Request::new("LREM", reply::integer).key(key).num(count).arg(value))
    }

    /// `LTRIM key start stop`
    fn ltrim<K: AsRef<[u8]>>(&mut self, key: K, start: i64, stop: i64) -> Self::Reply<'_, ()> {
        self.execute(Request::new("LTRIM", reply::ok).key(key).num(start).num(stop))
    }

    /// `LMOVE source destination LEFT|RIGHT LEFT|RIGHT`
    fn lmove<S: AsRef<[u8]>, D: AsRef<[u8]>>(
        &mut self,
        source: S,
        destination: D,
        from: ListDirection,
        to: ListDirection,
    ) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(
            Request::new("LMOVE", reply::optional_bytes)
                .key(source)
                .key(destination)
                .arg(direction(from))
                .arg(direction(to)),
        )
    }

    /// `BLMOVE source destination LEFT|RIGHT LEFT|RIGHT timeout`; a zero
    /// timeout blocks indefinitely
    fn blmove<S: AsRef<[u8]>, D: AsRef<[u8]>>(
        &mut self,
        source: S,
        destination: D,
        from: ListDirection,
        to: ListDirection,
        timeout: Duration,
    ) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(
            Request::new("BLMOVE", reply::optional_bytes)
                .key(source)
                .key(destination)
                .arg(direction(from))
                .arg(direction(to))
                .arg_bytes(format_timeout(timeout)),
        )
    }

    /// `RPOPLPUSH source destination`
    fn rpoplpush<S: AsRef<[u8]>, D: AsRef<[u8]>>(
        &mut self,
        source: S,
        destination: D,
    ) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(
            Request::new("RPOPLPUSH", reply::optional_bytes)
                .key(source)
                .key(destination),
        )
    }

    /// `LPOP key`
    fn lpop<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("LPOP", reply::optional_bytes).key(key))
    }

    /// `LPOP key count`; empty when the key is missing
    fn lpop_count<K: AsRef<[u8]>>(&mut self, key: K, count: u64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("LPOP", reply::bytes_list).key(key).num(count))
    }

    /// `RPOP key`
    fn rpop<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("RPOP", reply::optional_bytes).key(key))
    }

    /// `RPOP key count`; empty when the key is missing
    fn rpop_count<K: AsRef<[u8]>>(&mut self, key: K, count: u64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("RPOP", reply::bytes_list).key(key).num(count))
    }

    /// `BLPOP key [key ...] timeout`, the key popped from and the element
    fn blpop<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        timeout: Duration,
    ) -> Self::Reply<'_, Option<(Bytes, Bytes)>> {
        if keys.is_empty() {
            return self.reject(invalid("BLPOP needs at least one key"));
        }
        self.execute(
            Request::new("BLPOP", reply::keyed_value)
                .multi_key(keys)
                .arg_bytes(format_timeout(timeout)),
        )
    }

    /// `BRPOP key [key ...] timeout`, the key popped from and the element
    fn brpop<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        timeout: Duration,
    ) -> Self::Reply<'_, Option<(Bytes, Bytes)>> {
        if keys.is_empty() {
            return self.reject(invalid("BRPOP needs at least one key"));
        }
        self.execute(
            Request::new("BRPOP", reply::keyed_value)
                .multi_key(keys)
                .arg_bytes(format_timeout(timeout)),
        )
    }

    /// `LLEN key`
    fn llen<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("LLEN", reply::integer).key(key))
    }

    /// `LRANGE key start stop`, both ends inclusive
    fn lrange<K: AsRef<[u8]>>(&mut self, key: K, start: i64, stop: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(
            Request::new("LRANGE", reply::bytes_list)
                .key(key)
                .num(start)
                .num(stop),
        )
    }

    /// `LINDEX key index`
    fn lindex<K: AsRef<[u8]>>(&mut self, key: K, index: i64) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("LINDEX", reply::optional_bytes).key(key).num(index))
    }

    /// `LPOS key element [RANK rank]`
    fn lpos<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
        rank: Option<i64>,
    ) -> Self::Reply<'_, Option<i64>> {
        let mut request = Request::new("LPOS", reply::optional_integer).key(key).arg(value);
        if let Some(rank) = rank {
            if rank == 0 {
                return self.reject(invalid("LPOS rank must not be zero"));
            }
            request = request.arg("RANK").num(rank);
        }
        self.execute(request)
    }

    /// `LPOS key element [RANK rank] COUNT count`; a zero count returns
    /// every match
    fn lpos_count<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
        rank: Option<i64>,
        count: u64,
    ) -> Self::Reply<'_, Vec<i64>> {
        let mut request = Request::new("LPOS", reply::integers).key(key).arg(value);
        if let Some(rank) = rank {
            if rank == 0 {
                return self.reject(invalid("LPOS rank must not be zero"));
            }
            request = request.arg("RANK").num(rank);
        }
        self.execute(request.arg("COUNT").num(count))
    }
}

impl<T: CommandExecutor> ListCommands for T {}
