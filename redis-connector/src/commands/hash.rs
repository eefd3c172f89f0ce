//! Hash commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::types::{ScanOptions, ScanPage};
use std::collections::HashMap;

/// Commands on hash values
pub trait HashCommands: CommandExecutor {
    /// `HSET key field value`, `true` when the field is new
    fn hset<K: AsRef<[u8]>, F: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        field: F,
        value: V,
    ) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("HSET", reply::boolean)
                .key(key)
                .arg(field)
                .arg(value),
        )
    }

    /// `HSETNX key field value`
    fn hset_nx<K: AsRef<[u8]>, F: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        field: F,
        value: V,
    ) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("HSETNX", reply::boolean)
                .key(key)
                .arg(field)
                .arg(value),
        )
    }

    /// `HSET key field value [field value ...]`, number of new fields
    fn hset_multiple<K: AsRef<[u8]>, F: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        entries: &[(F, V)],
    ) -> Self::Reply<'_, i64> {
        if entries.is_empty() {
            return self.reject(invalid("HSET needs at least one field"));
        }
        let mut request = Request::new("HSET", reply::integer).key(key);
        for (field, value) in entries {
            request = request.arg(field).arg(value);
        }
        self.execute(request)
    }

    /// `HGET key field`
    fn hget<K: AsRef<[u8]>, F: AsRef<[u8]>>(
        &mut self,
        key: K,
        field: F,
    ) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("HGET", reply::optional_bytes).key(key).arg(field))
    }

    /// `HMGET key field [field ...]`
    fn hmget<K: AsRef<[u8]>, F: AsRef<[u8]>>(
        &mut self,
        key: K,
        fields: &[F],
    ) -> Self::Reply<'_, Vec<Option<Bytes>>> {
        self.execute(
            Request::new("HMGET", reply::optional_bytes_list)
                .key(key)
                .multi_arg(fields),
        )
    }

    /// `HINCRBY key field increment`
    fn hincr_by<K: AsRef<[u8]>, F: AsRef<[u8]>>(
        &mut self,
        key: K,
        field: F,
        increment: i64,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("HINCRBY", reply::integer)
                .key(key)
                .arg(field)
                .num(increment),
        )
    }

    /// `HINCRBYFLOAT key field increment`
    fn hincr_by_float<K: AsRef<[u8]>, F: AsRef<[u8]>>(
        &mut self,
        key: K,
        field: F,
        increment: f64,
    ) -> Self::Reply<'_, f64> {
        self.execute(
            Request::new("HINCRBYFLOAT", reply::float)
                .key(key)
                .arg(field)
                .num(increment),
        )
    }

    /// `HEXISTS key field`
    fn hexists<K: AsRef<[u8]>, F: AsRef<[u8]>>(&mut self, key: K, field: F) -> Self::Reply<'_, bool> {
        self.execute(Request::new("HEXISTS", reply::boolean).key(key).arg(field))
    }

    /// `HDEL key field [field ...]`, number of fields removed
    fn hdel<K: AsRef<[u8]>, F: AsRef<[u8]>>(&mut self, key: K, fields: &[F]) -> Self::Reply<'_, i64> {
        self.execute(Request::new("HDEL", reply::integer).key(key).multi_arg(fields))
    }

    /// `HLEN key`
    fn hlen<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("HLEN", reply::integer).key(key))
    }

    /// `HKEYS key`
    fn hkeys<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("HKEYS", reply::bytes_list).key(key))
    }

    /// `HVALS key`
    fn hvals<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("HVALS", reply::bytes_list).key(key))
    }

    /// `HGETALL key`
    fn hgetall<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, HashMap<Bytes, Bytes>> {
        self.execute(Request::new("HGETALL", reply::bytes_map).key(key))
    }

    /// `HRANDFIELD key`
    fn hrand_field<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("HRANDFIELD", reply::optional_bytes).key(key))
    }

    /// `HRANDFIELD key count`; a negative count allows repeats
    fn hrand_fields<K: AsRef<[u8]>>(&mut self, key: K, count: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(Request::new("HRANDFIELD", reply::bytes_list).key(key).num(count))
    }

    /// `HRANDFIELD key count WITHVALUES`
    fn hrand_fields_with_values<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        count: i64,
    ) -> Self::Reply<'_, Vec<(Bytes, Bytes)>> {
        self.execute(
            Request::new("HRANDFIELD", reply::bytes_pairs)
                .key(key)
                .num(count)
                .arg("WITHVALUES"),
        )
    }

    /// One `HSCAN` step
    fn hscan<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        cursor: u64,
        options: &ScanOptions,
    ) -> Self::Reply<'_, ScanPage<(Bytes, Bytes)>> {
        self.execute(
            Request::new("HSCAN", reply::scan_pairs)
                .key(key)
                .num(cursor)
                .with(options),
        )
    }

    /// `HSTRLEN key field`
    fn hstrlen<K: AsRef<[u8]>, F: AsRef<[u8]>>(&mut self, key: K, field: F) -> Self::Reply<'_, i64> {
        self.execute(Request::new("HSTRLEN", reply::integer).key(key).arg(field))
    }
}

impl<T: CommandExecutor> HashCommands for T {}
