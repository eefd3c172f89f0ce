//! String and bit commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::args::{write_getex_expiration, write_set_expiration};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::types::{
    BitFieldSubCommands, BitOperation, Expiration, Range, SetCondition,
};
use redis_connector_core::value::RespValue;
use redis_connector_core::RedisResult;
use std::time::Duration;

fn set_reply(value: RespValue) -> RedisResult<bool> {
    // nil when an NX/XX condition prevented the write
    match value {
        RespValue::Null => Ok(false),
        other => reply::ok(other).map(|()| true),
    }
}

/// Commands on string values
pub trait StringCommands: CommandExecutor {
    /// `GET key`
    fn get<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("GET", reply::optional_bytes).key(key))
    }

    /// `GETDEL key`
    fn get_del<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("GETDEL", reply::optional_bytes).key(key))
    }

    /// `GETEX key [EX|PX|EXAT|PXAT|PERSIST]`
    ///
    /// [`Expiration::Persistent`] removes the TTL, [`Expiration::KeepTtl`]
    /// leaves it alone.
    fn get_ex<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        expiration: Expiration,
    ) -> Self::Reply<'_, Option<Bytes>> {
        let mut request = Request::new("GETEX", reply::optional_bytes).key(key);
        let mut tokens = Vec::new();
        write_getex_expiration(&expiration, &mut tokens);
        for token in tokens {
            request = request.arg_bytes(token);
        }
        self.execute(request)
    }

    /// `GETSET key value`
    fn get_set<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
    ) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("GETSET", reply::optional_bytes).key(key).arg(value))
    }

    /// `MGET key [key ...]`
    fn mget<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, Vec<Option<Bytes>>> {
        self.execute(Request::new("MGET", reply::optional_bytes_list).multi_key(keys))
    }

    /// `SET key value`
    fn set<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> Self::Reply<'_, ()> {
        self.execute(Request::new("SET", reply::ok).key(key).arg(value))
    }

    /// `SET key value [expiration] [NX|XX]`, `false` when the condition
    /// prevented the write
    fn set_with<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
        expiration: Expiration,
        condition: SetCondition,
    ) -> Self::Reply<'_, bool> {
        let mut request = Request::new("SET", set_reply).key(key).arg(value);
        let mut tokens = Vec::new();
        write_set_expiration(&expiration, &mut tokens);
        for token in tokens {
            request = request.arg_bytes(token);
        }
        self.execute(request.with(&condition))
    }

    /// `SET key value [expiration] [NX|XX] GET`, the previous value
    fn set_get<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
        expiration: Expiration,
        condition: SetCondition,
    ) -> Self::Reply<'_, Option<Bytes>> {
        let mut request = Request::new("SET", reply::optional_bytes).key(key).arg(value);
        let mut tokens = Vec::new();
        write_set_expiration(&expiration, &mut tokens);
        for token in tokens {
            request = request.arg_bytes(token);
        }
        self.execute(request.with(&condition).arg("GET"))
    }

    /// `SETNX key value`
    fn set_nx<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> Self::Reply<'_, bool> {
        self.execute(Request::new("SETNX", reply::boolean).key(key).arg(value))
    }

    /// `SETEX key seconds value`; the timeout must be at least one second
    fn set_ex<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        timeout: Duration,
        value: V,
    ) -> Self::Reply<'_, ()> {
        if timeout.as_secs() == 0 {
            return self.reject(invalid("SETEX timeout must be at least one second"));
        }
        self.execute(
            Request::new("SETEX", reply::ok)
                .key(key)
                .num(timeout.as_secs())
                .arg(value),
        )
    }

    /// `PSETEX key milliseconds value`; the timeout must be at least one
    /// millisecond
    fn p_set_ex<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        timeout: Duration,
        value: V,
    ) -> Self::Reply<'_, ()> {
        if timeout.as_millis() == 0 {
            return self.reject(invalid("PSETEX timeout must be at least one millisecond"));
        }
        self.execute(
            Request::new("PSETEX", reply::ok)
                .key(key)
                .num(timeout.as_millis())
                .arg(value),
        )
    }

    /// `MSET key value [key value ...]`
    fn mset<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, pairs: &[(K, V)]) -> Self::Reply<'_, ()> {
        let mut request = Request::new("MSET", reply::ok);
        for (key, value) in pairs {
            request = request.key(key).arg(value);
        }
        self.execute(request)
    }

    /// `MSETNX key value [key value ...]`, all or nothing
    fn mset_nx<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        pairs: &[(K, V)],
    ) -> Self::Reply<'_, bool> {
        let mut request = Request::new("MSETNX", reply::boolean);
        for (key, value) in pairs {
            request = request.key(key).arg(value);
        }
        self.execute(request)
    }

    /// `INCR key`
    fn incr<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("INCR", reply::integer).key(key))
    }

    /// `INCRBY key increment`
    fn incr_by<K: AsRef<[u8]>>(&mut self, key: K, increment: i64) -> Self::Reply<'_, i64> {
        self.execute(Request::new("INCRBY", reply::integer).key(key).num(increment))
    }

    /// `INCRBYFLOAT key increment`
    fn incr_by_float<K: AsRef<[u8]>>(&mut self, key: K, increment: f64) -> Self::Reply<'_, f64> {
        self.execute(
            Request::new("INCRBYFLOAT", reply::float)
                .key(key)
                .num(increment),
        )
    }

    /// `DECR key`
    fn decr<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("DECR", reply::integer).key(key))
    }

    /// `DECRBY key decrement`
    fn decr_by<K: AsRef<[u8]>>(&mut self, key: K, decrement: i64) -> Self::Reply<'_, i64> {
        self.execute(Request::new("DECRBY", reply::integer).key(key).num(decrement))
    }

    /// `APPEND key value`, the new length
    fn append<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> Self::Reply<'_, i64> {
        self.execute(Request::new("APPEND", reply::integer).key(key).arg(value))
    }

    /// `GETRANGE key start end`
    fn get_range<K: AsRef<[u8]>>(&mut self, key: K, start: i64, end: i64) -> Self::Reply<'_, Bytes> {
        self.execute(
            Request::new("GETRANGE", reply::bytes)
                .key(key)
                .num(start)
                .num(end),
        )
    }

    /// `SETRANGE key offset value`
    fn set_range<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        offset: u64,
        value: V,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("SETRANGE", reply::integer)
                .key(key)
                .num(offset)
                .arg(value),
        )
    }

    /// `STRLEN key`
    fn strlen<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("STRLEN", reply::integer).key(key))
    }

    /// `GETBIT key offset`
    fn get_bit<K: AsRef<[u8]>>(&mut self, key: K, offset: u64) -> Self::Reply<'_, bool> {
        self.execute(Request::new("GETBIT", reply::boolean).key(key).num(offset))
    }

    /// `SETBIT key offset value`, the previous bit
    fn set_bit<K: AsRef<[u8]>>(&mut self, key: K, offset: u64, value: bool) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("SETBIT", reply::boolean)
                .key(key)
                .num(offset)
                .num(u8::from(value)),
        )
    }

    /// `BITCOUNT key`
    fn bit_count<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("BITCOUNT", reply::integer).key(key))
    }

    /// `BITCOUNT key start end` over a byte range
    fn bit_count_range<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        start: i64,
        end: i64,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("BITCOUNT", reply::integer)
                .key(key)
                .num(start)
                .num(end),
        )
    }

    /// `BITFIELD key ...`, or `BITFIELD_RO` when every operation only reads
    fn bit_field<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        commands: &BitFieldSubCommands,
    ) -> Self::Reply<'_, Vec<Option<i64>>> {
        if commands.is_empty() {
            return self.reject(invalid("BITFIELD needs at least one sub-command"));
        }
        let name = if commands.is_read_only() {
            "BITFIELD_RO"
        } else {
            "BITFIELD"
        };
        self.execute(
            Request::new(name, reply::bitfield_results)
                .key(key)
                .with(commands),
        )
    }

    /// `BITOP op destination key [key ...]`; `NOT` takes exactly one source
    fn bit_op<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        op: BitOperation,
        destination: D,
        keys: &[K],
    ) -> Self::Reply<'_, i64> {
        if op == BitOperation::Not && keys.len() != 1 {
            return self.reject(invalid("BITOP NOT takes exactly one source key"));
        }
        if keys.is_empty() {
            return self.reject(invalid("BITOP needs at least one source key"));
        }
        self.execute(
            Request::new("BITOP", reply::integer)
                .arg(op.keyword())
                .key(destination)
                .multi_key(keys),
        )
    }

    /// `BITPOS key bit [start [end]]`
    ///
    /// A bounded lower end becomes `start`; a bounded upper end becomes
    /// `end`, with `start` defaulting to `0` when only the upper end is set.
    fn bit_pos<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        bit: bool,
        range: &Range<i64>,
    ) -> Self::Reply<'_, i64> {
        let mut request = Request::new("BITPOS", reply::integer)
            .key(key)
            .num(u8::from(bit));
        match (range.lower_value(), range.upper_value()) {
            (Some(start), Some(end)) => request = request.num(start).num(end),
            (Some(start), None) => request = request.num(start),
            (None, Some(end)) => request = request.num(0).num(end),
            (None, None) => {}
        }
        self.execute(request)
    }
}

impl<T: CommandExecutor> StringCommands for T {}
