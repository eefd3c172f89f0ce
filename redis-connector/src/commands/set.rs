//! Set commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::types::{ScanOptions, ScanPage};
use std::collections::HashSet;

/// Commands on set values
pub trait SetCommands: CommandExecutor {
    /// `SADD key member [member ...]`, number of members added
    fn sadd<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, members: &[M]) -> Self::Reply<'_, i64> {
        if members.is_empty() {
            return self.reject(invalid("SADD needs at least one member"));
        }
        self.execute(Request::new("SADD", reply::integer).key(key).multi_arg(members))
    }

    /// `SREM key member [member ...]`, number of members removed
    fn srem<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, members: &[M]) -> Self::Reply<'_, i64> {
        if members.is_empty() {
            return self.reject(invalid("SREM needs at least one member"));
        }
        self.execute(Request::new("SREM", reply::integer).key(key).multi_arg(members))
    }

    /// `SPOP key`
    fn spop<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("SPOP", reply::optional_bytes).key(key))
    }

    /// `SPOP key count`
    fn spop_count<K: AsRef<[u8]>>(&mut self, key: K, count: u64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("SPOP", reply::bytes_list).key(key).num(count))
    }

    /// `SMOVE source destination member`
    fn smove<S: AsRef<[u8]>, D: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        source: S,
        destination: D,
        member: M,
    ) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("SMOVE", reply::boolean)
                .key(source)
                .key(destination)
                .arg(member),
        )
    }

    /// `SCARD key`
    fn scard<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("SCARD", reply::integer).key(key))
    }

    /// `SISMEMBER key member`
    fn sismember<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, member: M) -> Self::Reply<'_, bool> {
        self.execute(Request::new("SISMEMBER", reply::boolean).key(key).arg(member))
    }

    /// `SMISMEMBER key member [member ...]`, one flag per member
    fn smismember<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        members: &[M],
    ) -> Self::Reply<'_, Vec<bool>> {
        self.execute(
            Request::new("SMISMEMBER", reply::booleans)
                .key(key)
                .multi_arg(members),
        )
    }

    /// `SINTER key [key ...]`
    fn sinter<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, HashSet<Bytes>> {
        self.execute(Request::new("SINTER", reply::bytes_set).multi_key(keys))
    }

    /// `SINTERSTORE destination key [key ...]`
    fn sinterstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("SINTERSTORE", reply::integer)
                .key(destination)
                .multi_key(keys),
        )
    }

    /// `SUNION key [key ...]`
    fn sunion<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, HashSet<Bytes>> {
        self.execute(Request::new("SUNION", reply::bytes_set).multi_key(keys))
    }

    /// `SUNIONSTORE destination key [key ...]`
    fn sunionstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("SUNIONSTORE", reply::integer)
                .key(destination)
                .multi_key(keys),
        )
    }

    /// `SDIFF key [key ...]`, members of the first set missing from the
    /// others
    fn sdiff<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, HashSet<Bytes>> {
        self.execute(Request::new("SDIFF", reply::bytes_set).multi_key(keys))
    }

    /// `SDIFFSTORE destination key [key ...]`
    fn sdiffstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("SDIFFSTORE", reply::integer)
                .key(destination)
                .multi_key(keys),
        )
    }

    /// `SMEMBERS key`
    fn smembers<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, HashSet<Bytes>> {
        self.execute(Request::new("SMEMBERS", reply::bytes_set).key(key))
    }

    /// `SRANDMEMBER key`
    fn srandmember<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("SRANDMEMBER", reply::optional_bytes).key(key))
    }

    /// `SRANDMEMBER key count`; a negative count allows repeats
    fn srandmembers<K: AsRef<[u8]>>(&mut self, key: K, count: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(
            Request::new("SRANDMEMBER", reply::bytes_list)
                .key(key)
                .num(count),
        )
    }

    /// One `SSCAN` step
    fn sscan<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        cursor: u64,
        options: &ScanOptions,
    ) -> Self::Reply<'_, ScanPage<Bytes>> {
        self.execute(
            Request::new("SSCAN", reply::scan_bytes)
                .key(key)
                .num(cursor)
                .with(options),
        )
    }
}

impl<T: CommandExecutor> SetCommands for T {}
