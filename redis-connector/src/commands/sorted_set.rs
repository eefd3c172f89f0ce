//! Sorted set commands

use super::{invalid, CommandExecutor, Request};
use crate::convert::args::{format_score, format_timeout, lex_range, score_range};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{
    Aggregate, Limit, Range, ScanOptions, ScanPage, Tuple, Weights, ZAddArgs,
};
use redis_connector_core::value::RespValue;
use redis_connector_core::RedisError;
use std::time::Duration;

/// `ZUNION`/`ZINTER` style request: `numkeys key [key ...] [WEIGHTS ...]
/// [AGGREGATE ...]`
fn combine<T, K: AsRef<[u8]>>(
    name: &'static str,
    decoder: fn(RespValue) -> RedisResult<T>,
    destination: Option<&[u8]>,
    keys: &[K],
    weights: &Weights,
    aggregate: Option<Aggregate>,
) -> Result<Request<T>, RedisError> {
    if keys.is_empty() {
        return Err(invalid(format!("{name} needs at least one source key")));
    }
    if !weights.is_empty() && weights.len() != keys.len() {
        return Err(invalid(format!(
            "{name} got {} weights for {} source keys",
            weights.len(),
            keys.len()
        )));
    }
    let mut request = Request::new(name, decoder);
    if let Some(destination) = destination {
        request = request.key(destination);
    }
    Ok(request
        .num(keys.len())
        .multi_key(keys)
        .with(weights)
        .with(&aggregate))
}

/// Commands on sorted set values
pub trait ZSetCommands: CommandExecutor {
    /// `ZADD key score member`, `true` when the member is new
    fn zadd<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        score: f64,
        member: M,
    ) -> Self::Reply<'_, bool> {
        self.execute(
            Request::new("ZADD", reply::boolean)
                .key(key)
                .arg_bytes(format_score(score))
                .arg(member),
        )
    }

    /// `ZADD key [NX|XX] [GT|LT] [CH] score member [score member ...]`
    ///
    /// Counts added members, or changed members with `CH`.
    fn zadd_multiple<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        tuples: &[Tuple],
        args: ZAddArgs,
    ) -> Self::Reply<'_, i64> {
        if let Err(e) = args.validate() {
            return self.reject(e);
        }
        if tuples.is_empty() {
            return self.reject(invalid("ZADD needs at least one member"));
        }
        let mut request = Request::new("ZADD", reply::integer).key(key).with(&args);
        for tuple in tuples {
            request = request
                .arg_bytes(format_score(tuple.score))
                .arg_bytes(tuple.value.clone());
        }
        self.execute(request)
    }

    /// `ZREM key member [member ...]`
    fn zrem<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, members: &[M]) -> Self::Reply<'_, i64> {
        if members.is_empty() {
            return self.reject(invalid("ZREM needs at least one member"));
        }
        self.execute(Request::new("ZREM", reply::integer).key(key).multi_arg(members))
    }

    /// `ZINCRBY key increment member`, the new score
    fn zincr_by<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        increment: f64,
        member: M,
    ) -> Self::Reply<'_, f64> {
        self.execute(
            Request::new("ZINCRBY", reply::float)
                .key(key)
                .arg_bytes(format_score(increment))
                .arg(member),
        )
    }

    /// `ZRANDMEMBER key`
    fn zrand_member<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Bytes>> {
        self.execute(Request::new("ZRANDMEMBER", reply::optional_bytes).key(key))
    }

    /// `ZRANDMEMBER key count`; a negative count allows repeats
    fn zrand_members<K: AsRef<[u8]>>(&mut self, key: K, count: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(
            Request::new("ZRANDMEMBER", reply::bytes_list)
                .key(key)
                .num(count),
        )
    }

    /// `ZRANDMEMBER key count WITHSCORES`
    fn zrand_members_with_scores<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        count: i64,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        self.execute(
            Request::new("ZRANDMEMBER", reply::tuples)
                .key(key)
                .num(count)
                .arg("WITHSCORES"),
        )
    }

    /// `ZRANK key member`, ascending rank
    fn zrank<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, member: M) -> Self::Reply<'_, Option<i64>> {
        self.execute(Request::new("ZRANK", reply::optional_integer).key(key).arg(member))
    }

    /// `ZREVRANK key member`, descending rank
    fn zrevrank<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        member: M,
    ) -> Self::Reply<'_, Option<i64>> {
        self.execute(
            Request::new("ZREVRANK", reply::optional_integer)
                .key(key)
                .arg(member),
        )
    }

    /// `ZRANGE key start stop`, by ascending rank
    fn zrange<K: AsRef<[u8]>>(&mut self, key: K, start: i64, stop: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(
            Request::new("ZRANGE", reply::bytes_list)
                .key(key)
                .num(start)
                .num(stop),
        )
    }

    /// `ZRANGE key start stop WITHSCORES`
    fn zrange_with_scores<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        start: i64,
        stop: i64,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        self.execute(
            Request::new("ZRANGE", reply::tuples)
                .key(key)
                .num(start)
                .num(stop)
                .arg("WITHSCORES"),
        )
    }

    /// `ZREVRANGE key start stop`, by descending rank
    fn zrevrange<K: AsRef<[u8]>>(&mut self, key: K, start: i64, stop: i64) -> Self::Reply<'_, Vec<Bytes>> {
        self.execute(
            Request::new("ZREVRANGE", reply::bytes_list)
                .key(key)
                .num(start)
                .num(stop),
        )
    }

    /// `ZREVRANGE key start stop WITHSCORES`
    fn zrevrange_with_scores<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        start: i64,
        stop: i64,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        self.execute(
            Request::new("ZREVRANGE", reply::tuples)
                .key(key)
                .num(start)
                .num(stop)
                .arg("WITHSCORES"),
        )
    }

    /// `ZRANGEBYSCORE key min max [LIMIT offset count]`
    fn zrange_by_score<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<f64>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZRANGEBYSCORE", reply::bytes_list)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max)
                .with(&limit),
        )
    }

    /// `ZRANGEBYSCORE key min max WITHSCORES [LIMIT offset count]`
    fn zrange_by_score_with_scores<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<f64>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZRANGEBYSCORE", reply::tuples)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max)
                .arg("WITHSCORES")
                .with(&limit),
        )
    }

    /// `ZREVRANGEBYSCORE key max min [LIMIT offset count]`
    fn zrevrange_by_score<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<f64>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZREVRANGEBYSCORE", reply::bytes_list)
                .key(key)
                .arg_bytes(max)
                .arg_bytes(min)
                .with(&limit),
        )
    }

    /// `ZREVRANGEBYSCORE key max min WITHSCORES [LIMIT offset count]`
    fn zrevrange_by_score_with_scores<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<f64>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZREVRANGEBYSCORE", reply::tuples)
                .key(key)
                .arg_bytes(max)
                .arg_bytes(min)
                .arg("WITHSCORES")
                .with(&limit),
        )
    }

    /// `ZRANGEBYLEX key min max [LIMIT offset count]`
    fn zrange_by_lex<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<Bytes>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        let (min, max) = lex_range(range);
        self.execute(
            Request::new("ZRANGEBYLEX", reply::bytes_list)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max)
                .with(&limit),
        )
    }

    /// `ZREVRANGEBYLEX key max min [LIMIT offset count]`
    fn zrevrange_by_lex<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        range: &Range<Bytes>,
        limit: Limit,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        let (min, max) = lex_range(range);
        self.execute(
            Request::new("ZREVRANGEBYLEX", reply::bytes_list)
                .key(key)
                .arg_bytes(max)
                .arg_bytes(min)
                .with(&limit),
        )
    }

    /// `ZCOUNT key min max`
    fn zcount<K: AsRef<[u8]>>(&mut self, key: K, range: &Range<f64>) -> Self::Reply<'_, i64> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZCOUNT", reply::integer)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max),
        )
    }

    /// `ZLEXCOUNT key min max`
    fn zlex_count<K: AsRef<[u8]>>(&mut self, key: K, range: &Range<Bytes>) -> Self::Reply<'_, i64> {
        let (min, max) = lex_range(range);
        self.execute(
            Request::new("ZLEXCOUNT", reply::integer)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max),
        )
    }

    /// `ZCARD key`
    fn zcard<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, i64> {
        self.execute(Request::new("ZCARD", reply::integer).key(key))
    }

    /// `ZPOPMIN key`
    fn zpop_min<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Tuple>> {
        self.execute(Request::new("ZPOPMIN", reply::optional_tuple).key(key))
    }

    /// `ZPOPMIN key count`
    fn zpop_min_count<K: AsRef<[u8]>>(&mut self, key: K, count: u64) -> Self::Reply<'_, Vec<Tuple>> {
        self.execute(Request::new("ZPOPMIN", reply::tuples).key(key).num(count))
    }

    /// `ZPOPMAX key`
    fn zpop_max<K: AsRef<[u8]>>(&mut self, key: K) -> Self::Reply<'_, Option<Tuple>> {
        self.execute(Request::new("ZPOPMAX", reply::optional_tuple).key(key))
    }

    /// `ZPOPMAX key count`
    fn zpop_max_count<K: AsRef<[u8]>>(&mut self, key: K, count: u64) -> Self::Reply<'_, Vec<Tuple>> {
        self.execute(Request::new("ZPOPMAX", reply::tuples).key(key).num(count))
    }

    /// `BZPOPMIN key [key ...] timeout`, the key popped from and the tuple
    fn bzpop_min<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        timeout: Duration,
    ) -> Self::Reply<'_, Option<(Bytes, Tuple)>> {
        if keys.is_empty() {
            return self.reject(invalid("BZPOPMIN needs at least one key"));
        }
        self.execute(
            Request::new("BZPOPMIN", reply::keyed_tuple)
                .multi_key(keys)
                .arg_bytes(format_timeout(timeout)),
        )
    }

    /// `BZPOPMAX key [key ...] timeout`, the key popped from and the tuple
    fn bzpop_max<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        timeout: Duration,
    ) -> Self::Reply<'_, Option<(Bytes, Tuple)>> {
        if keys.is_empty() {
            return self.reject(invalid("BZPOPMAX needs at least one key"));
        }
        self.execute(
            Request::new("BZPOPMAX", reply::keyed_tuple)
                .multi_key(keys)
                .arg_bytes(format_timeout(timeout)),
        )
    }

    /// `ZSCORE key member`
    fn zscore<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, member: M) -> Self::Reply<'_, Option<f64>> {
        self.execute(Request::new("ZSCORE", reply::optional_float).key(key).arg(member))
    }

    /// `ZMSCORE key member [member ...]`
    fn zmscore<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        members: &[M],
    ) -> Self::Reply<'_, Vec<Option<f64>>> {
        if members.is_empty() {
            return self.reject(invalid("ZMSCORE needs at least one member"));
        }
        self.execute(
            Request::new("ZMSCORE", reply::optional_scores)
                .key(key)
                .multi_arg(members),
        )
    }

    /// `ZREMRANGEBYRANK key start stop`
    fn zrem_range_by_rank<K: AsRef<[u8]>>(&mut self, key: K, start: i64, stop: i64) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("ZREMRANGEBYRANK", reply::integer)
                .key(key)
                .num(start)
                .num(stop),
        )
    }

    /// `ZREMRANGEBYSCORE key min max`
    fn zrem_range_by_score<K: AsRef<[u8]>>(&mut self, key: K, range: &Range<f64>) -> Self::Reply<'_, i64> {
        let (min, max) = score_range(range);
        self.execute(
            Request::new("ZREMRANGEBYSCORE", reply::integer)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max),
        )
    }

    /// `ZREMRANGEBYLEX key min max`
    fn zrem_range_by_lex<K: AsRef<[u8]>>(&mut self, key: K, range: &Range<Bytes>) -> Self::Reply<'_, i64> {
        let (min, max) = lex_range(range);
        self.execute(
            Request::new("ZREMRANGEBYLEX", reply::integer)
                .key(key)
                .arg_bytes(min)
                .arg_bytes(max),
        )
    }

    /// `ZDIFF numkeys key [key ...]`
    fn zdiff<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, Vec<Bytes>> {
        if keys.is_empty() {
            return self.reject(invalid("ZDIFF needs at least one key"));
        }
        self.execute(
            Request::new("ZDIFF", reply::bytes_list)
                .num(keys.len())
                .multi_key(keys),
        )
    }

    /// `ZDIFF numkeys key [key ...] WITHSCORES`
    fn zdiff_with_scores<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Self::Reply<'_, Vec<Tuple>> {
        if keys.is_empty() {
            return self.reject(invalid("ZDIFF needs at least one key"));
        }
        self.execute(
            Request::new("ZDIFF", reply::tuples)
                .num(keys.len())
                .multi_key(keys)
                .arg("WITHSCORES"),
        )
    }

    /// `ZDIFFSTORE destination numkeys key [key ...]`
    fn zdiffstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
    ) -> Self::Reply<'_, i64> {
        if keys.is_empty() {
            return self.reject(invalid("ZDIFFSTORE needs at least one key"));
        }
        self.execute(
            Request::new("ZDIFFSTORE", reply::integer)
                .key(destination)
                .num(keys.len())
                .multi_key(keys),
        )
    }

    /// `ZINTER numkeys key [key ...] [WEIGHTS ...] [AGGREGATE ...]`
    fn zinter<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        match combine("ZINTER", reply::bytes_list, None, keys, weights, aggregate) {
            Ok(request) => self.execute(request),
            Err(e) => self.reject(e),
        }
    }

    /// `ZINTER ... WITHSCORES`
    fn zinter_with_scores<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        match combine("ZINTER", reply::tuples, None, keys, weights, aggregate) {
            Ok(request) => self.execute(request.arg("WITHSCORES")),
            Err(e) => self.reject(e),
        }
    }

    /// `ZINTERSTORE destination numkeys key [key ...] [WEIGHTS ...]
    /// [AGGREGATE ...]`
    fn zinterstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, i64> {
        let destination = destination.as_ref();
        match combine(
            "ZINTERSTORE",
            reply::integer,
            Some(destination),
            keys,
            weights,
            aggregate,
        ) {
            Ok(request) => self.execute(request),
            Err(e) => self.reject(e),
        }
    }

    /// `ZUNION numkeys key [key ...] [WEIGHTS ...] [AGGREGATE ...]`
    fn zunion<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, Vec<Bytes>> {
        match combine("ZUNION", reply::bytes_list, None, keys, weights, aggregate) {
            Ok(request) => self.execute(request),
            Err(e) => self.reject(e),
        }
    }

    /// `ZUNION ... WITHSCORES`
    fn zunion_with_scores<K: AsRef<[u8]>>(
        &mut self,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, Vec<Tuple>> {
        match combine("ZUNION", reply::tuples, None, keys, weights, aggregate) {
            Ok(request) => self.execute(request.arg("WITHSCORES")),
            Err(e) => self.reject(e),
        }
    }

    /// `ZUNIONSTORE destination numkeys key [key ...] [WEIGHTS ...]
    /// [AGGREGATE ...]`
    fn zunionstore<D: AsRef<[u8]>, K: AsRef<[u8]>>(
        &mut self,
        destination: D,
        keys: &[K],
        weights: &Weights,
        aggregate: Option<Aggregate>,
    ) -> Self::Reply<'_, i64> {
        let destination = destination.as_ref();
        match combine(
            "ZUNIONSTORE",
            reply::integer,
            Some(destination),
            keys,
            weights,
            aggregate,
        ) {
            Ok(request) => self.execute(request),
            Err(e) => self.reject(e),
        }
    }

    /// One `ZSCAN` step
    fn zscan<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        cursor: u64,
        options: &ScanOptions,
    ) -> Self::Reply<'_, ScanPage<Tuple>> {
        self.execute(
            Request::new("ZSCAN", reply::scan_tuples)
                .key(key)
                .num(cursor)
                .with(options),
        )
    }
}

impl<T: CommandExecutor> ZSetCommands for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    fn words(request: &Request<i64>) -> Vec<String> {
        request
            .args()
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect()
    }

    #[test]
    fn test_combine_layout() {
        let request = combine(
            "ZUNIONSTORE",
            reply::integer,
            Some(&b"dest"[..]),
            &["a", "b"],
            &Weights::of(vec![1.0, 2.5]),
            Some(Aggregate::Max),
        )
        .unwrap();
        assert_eq!(
            words(&request),
            vec!["dest", "2", "a", "b", "WEIGHTS", "1", "2.5", "AGGREGATE", "MAX"]
        );
        assert_eq!(request.keys(), vec![&b"dest"[..], &b"a"[..], &b"b"[..]]);
    }

    #[test]
    fn test_combine_rejects_weight_mismatch() {
        let err = combine(
            "ZINTERSTORE",
            reply::integer,
            Some(&b"dest"[..]),
            &["a", "b"],
            &Weights::of(vec![1.0]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RedisError::InvalidArgument(_)));
    }
}
