//! Encoding of neutral options into command argument tokens

use bytes::Bytes;
use redis_connector_core::types::{
    Aggregate, BitFieldSubCommand, BitFieldSubCommands, ExpireCondition, Expiration, FlushMode,
    GeoRadiusArgs, GeoReference, GeoSearchStoreArgs, GeoShape, Limit, MigrateOption, Range,
    ScanOptions, SetCondition, SortOrder, SortParameters, Weights, ZAddArgs,
};
use std::ops::Bound;
use std::time::Duration;

/// Something that contributes argument tokens to a command
pub trait CommandArgs {
    /// Append this value's tokens to `out`
    fn write_args(&self, out: &mut Vec<Bytes>);
}

fn token(s: &'static str) -> Bytes {
    Bytes::from_static(s.as_bytes())
}

fn number<T: ToString>(n: T) -> Bytes {
    Bytes::from(n.to_string())
}

/// Format a score the way the server parses it
pub fn format_score(score: f64) -> Bytes {
    if score == f64::INFINITY {
        token("+inf")
    } else if score == f64::NEG_INFINITY {
        token("-inf")
    } else {
        number(score)
    }
}

/// Blocking timeout in (fractional) seconds; zero blocks forever
pub fn format_timeout(timeout: Duration) -> Bytes {
    if timeout.subsec_millis() == 0 {
        number(timeout.as_secs())
    } else {
        number(timeout.as_millis() as f64 / 1000.0)
    }
}

/// `min`/`max` tokens of a score range for `ZRANGEBYSCORE` and friends
pub fn score_range(range: &Range<f64>) -> (Bytes, Bytes) {
    let lower = match range.lower {
        Bound::Included(v) => format_score(v),
        Bound::Excluded(v) => exclusive(&format_score(v)),
        Bound::Unbounded => token("-inf"),
    };
    let upper = match range.upper {
        Bound::Included(v) => format_score(v),
        Bound::Excluded(v) => exclusive(&format_score(v)),
        Bound::Unbounded => token("+inf"),
    };
    (lower, upper)
}

fn exclusive(value: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(value.len() + 1);
    out.push(b'(');
    out.extend_from_slice(value);
    Bytes::from(out)
}

/// `min`/`max` tokens of a lexicographical range for `ZRANGEBYLEX`
pub fn lex_range(range: &Range<Bytes>) -> (Bytes, Bytes) {
    let encode = |bound: &Bound<Bytes>, unbounded: &'static str| match bound {
        Bound::Included(v) => {
            let mut out = Vec::with_capacity(v.len() + 1);
            out.push(b'[');
            out.extend_from_slice(v);
            Bytes::from(out)
        }
        Bound::Excluded(v) => exclusive(v),
        Bound::Unbounded => token(unbounded),
    };
    (encode(&range.lower, "-"), encode(&range.upper, "+"))
}

/// Expiration tokens for `SET`: nothing for a persistent value
pub fn write_set_expiration(expiration: &Expiration, out: &mut Vec<Bytes>) {
    match *expiration {
        Expiration::Persistent => {}
        Expiration::KeepTtl => out.push(token("KEEPTTL")),
        Expiration::Seconds(s) => out.extend([token("EX"), number(s)]),
        Expiration::Milliseconds(ms) => out.extend([token("PX"), number(ms)]),
        Expiration::UnixTimestampSeconds(s) => out.extend([token("EXAT"), number(s)]),
        Expiration::UnixTimestampMilliseconds(ms) => out.extend([token("PXAT"), number(ms)]),
    }
}

/// Expiration tokens for `GETEX`: `PERSIST` removes the TTL, `KEEPTTL`
/// sends no option at all
pub fn write_getex_expiration(expiration: &Expiration, out: &mut Vec<Bytes>) {
    match expiration {
        Expiration::Persistent => out.push(token("PERSIST")),
        Expiration::KeepTtl => {}
        other => write_set_expiration(other, out),
    }
}

impl CommandArgs for SetCondition {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        match self {
            Self::Upsert => {}
            Self::IfAbsent => out.push(token("NX")),
            Self::IfPresent => out.push(token("XX")),
        }
    }
}

impl CommandArgs for ExpireCondition {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        match self {
            Self::Always => {}
            Self::Nx => out.push(token("NX")),
            Self::Xx => out.push(token("XX")),
            Self::Gt => out.push(token("GT")),
            Self::Lt => out.push(token("LT")),
        }
    }
}

impl CommandArgs for FlushMode {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        out.push(token(self.keyword()));
    }
}

impl CommandArgs for MigrateOption {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        out.push(token(self.keyword()));
    }
}

impl CommandArgs for SortOrder {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        out.push(token(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }));
    }
}

impl<T: CommandArgs> CommandArgs for Option<T> {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if let Some(inner) = self {
            inner.write_args(out);
        }
    }
}

impl CommandArgs for ScanOptions {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if let Some(pattern) = &self.pattern {
            out.extend([token("MATCH"), pattern.clone()]);
        }
        if let Some(count) = self.count {
            out.extend([token("COUNT"), number(count)]);
        }
        if let Some(data_type) = self.data_type {
            out.extend([token("TYPE"), token(data_type.code())]);
        }
    }
}

impl CommandArgs for Limit {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if !self.is_unlimited() {
            out.extend([token("LIMIT"), number(self.offset), number(self.count)]);
        }
    }
}

impl CommandArgs for SortParameters {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if let Some(pattern) = &self.by_pattern {
            out.extend([token("BY"), pattern.clone()]);
        }
        self.limit.write_args(out);
        for pattern in &self.get_patterns {
            out.extend([token("GET"), pattern.clone()]);
        }
        self.order.write_args(out);
        if self.alphabetic {
            out.push(token("ALPHA"));
        }
    }
}

fn write_count(limit: Option<u64>, any: bool, out: &mut Vec<Bytes>) {
    if let Some(count) = limit {
        out.extend([token("COUNT"), number(count)]);
        if any {
            out.push(token("ANY"));
        }
    }
}

impl CommandArgs for GeoRadiusArgs {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if self.with_coord {
            out.push(token("WITHCOORD"));
        }
        if self.with_dist {
            out.push(token("WITHDIST"));
        }
        write_count(self.limit, self.any, out);
        self.sort.write_args(out);
    }
}

impl CommandArgs for GeoSearchStoreArgs {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        write_count(self.limit, self.any, out);
        self.sort.write_args(out);
        if self.store_distance {
            out.push(token("STOREDIST"));
        }
    }
}

impl<T: AsRef<[u8]>> CommandArgs for GeoReference<T> {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        match self {
            Self::Member(member) => out.extend([
                token("FROMMEMBER"),
                Bytes::copy_from_slice(member.as_ref()),
            ]),
            Self::Coordinates(point) => out.extend([
                token("FROMLONLAT"),
                number(point.longitude),
                number(point.latitude),
            ]),
        }
    }
}

impl CommandArgs for GeoShape {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        match self {
            Self::Radius(distance) => out.extend([
                token("BYRADIUS"),
                number(distance.value),
                token(distance.metric.abbreviation()),
            ]),
            Self::Box {
                width,
                height,
                metric,
            } => out.extend([
                token("BYBOX"),
                number(*width),
                number(*height),
                token(metric.abbreviation()),
            ]),
        }
    }
}

impl CommandArgs for BitFieldSubCommand {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        match *self {
            Self::Get { field, offset } => out.extend([
                token("GET"),
                Bytes::from(field.encoding()),
                Bytes::from(offset.encoding()),
            ]),
            Self::Set {
                field,
                offset,
                value,
            } => out.extend([
                token("SET"),
                Bytes::from(field.encoding()),
                Bytes::from(offset.encoding()),
                number(value),
            ]),
            Self::IncrBy {
                field,
                offset,
                increment,
                overflow,
            } => {
                if let Some(overflow) = overflow {
                    out.extend([token("OVERFLOW"), token(overflow.keyword())]);
                }
                out.extend([
                    token("INCRBY"),
                    Bytes::from(field.encoding()),
                    Bytes::from(offset.encoding()),
                    number(increment),
                ]);
            }
        }
    }
}

impl CommandArgs for BitFieldSubCommands {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        for command in self.commands() {
            command.write_args(out);
        }
    }
}

impl CommandArgs for ZAddArgs {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        out.extend(self.keywords().into_iter().map(token));
    }
}

impl CommandArgs for Aggregate {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        out.extend([token("AGGREGATE"), token(self.keyword())]);
    }
}

impl CommandArgs for Weights {
    fn write_args(&self, out: &mut Vec<Bytes>) {
        if !self.is_empty() {
            out.push(token("WEIGHTS"));
            out.extend(self.as_slice().iter().map(|w| format_score(*w)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_connector_core::types::{
        BitFieldType, DataType, Distance, Metric, Offset, Overflow, Point,
    };

    fn encode(args: &impl CommandArgs) -> Vec<String> {
        let mut out = Vec::new();
        args.write_args(&mut out);
        out.iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    fn set_expiration(expiration: Expiration) -> Vec<String> {
        let mut out = Vec::new();
        write_set_expiration(&expiration, &mut out);
        out.iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    fn getex_expiration(expiration: Expiration) -> Vec<String> {
        let mut out = Vec::new();
        write_getex_expiration(&expiration, &mut out);
        out.iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    #[test]
    fn test_set_expiration_tokens() {
        assert!(set_expiration(Expiration::Persistent).is_empty());
        assert_eq!(set_expiration(Expiration::KeepTtl), vec!["KEEPTTL"]);
        assert_eq!(set_expiration(Expiration::Seconds(10)), vec!["EX", "10"]);
        assert_eq!(set_expiration(Expiration::Milliseconds(1500)), vec!["PX", "1500"]);
        assert_eq!(
            set_expiration(Expiration::UnixTimestampSeconds(1_700_000_000)),
            vec!["EXAT", "1700000000"]
        );
        assert_eq!(
            set_expiration(Expiration::UnixTimestampMilliseconds(1_700_000_000_123)),
            vec!["PXAT", "1700000000123"]
        );
    }

    #[test]
    fn test_getex_expiration_tokens() {
        assert_eq!(getex_expiration(Expiration::Persistent), vec!["PERSIST"]);
        assert!(getex_expiration(Expiration::KeepTtl).is_empty());
        assert_eq!(getex_expiration(Expiration::Seconds(5)), vec!["EX", "5"]);
    }

    #[test]
    fn test_score_and_lex_ranges() {
        let (min, max) = score_range(&Range::left_open(1.5, f64::INFINITY));
        assert_eq!((&min[..], &max[..]), (&b"(1.5"[..], &b"+inf"[..]));

        let (min, max) = score_range(&Range::unbounded());
        assert_eq!((&min[..], &max[..]), (&b"-inf"[..], &b"+inf"[..]));

        let (min, max) = lex_range(&Range::right_open(
            Bytes::from_static(b"a"),
            Bytes::from_static(b"c"),
        ));
        assert_eq!((&min[..], &max[..]), (&b"[a"[..], &b"(c"[..]));

        let (min, max) = lex_range(&Range::unbounded());
        assert_eq!((&min[..], &max[..]), (&b"-"[..], &b"+"[..]));
    }

    #[test]
    fn test_timeout_formatting() {
        assert_eq!(&format_timeout(Duration::from_secs(2))[..], b"2");
        assert_eq!(&format_timeout(Duration::from_millis(1500))[..], b"1.5");
        assert_eq!(&format_timeout(Duration::ZERO)[..], b"0");
    }

    #[test]
    fn test_geo_args() {
        let args = GeoRadiusArgs::new()
            .include_distance()
            .include_coordinates()
            .limit_any(5)
            .sort_descending();
        assert_eq!(encode(&args), vec!["WITHCOORD", "WITHDIST", "COUNT", "5", "ANY", "DESC"]);

        let reference: GeoReference<&str> = GeoReference::Coordinates(Point::new(15.0, 37.0));
        assert_eq!(encode(&reference), vec!["FROMLONLAT", "15", "37"]);

        let shape = GeoShape::Radius(Distance::new(200.0, Metric::Kilometers));
        assert_eq!(encode(&shape), vec!["BYRADIUS", "200", "km"]);

        let store = GeoSearchStoreArgs::new().limit(3).store_distance();
        assert_eq!(encode(&store), vec!["COUNT", "3", "STOREDIST"]);
    }

    #[test]
    fn test_bitfield_tokens() {
        let commands = BitFieldSubCommands::new()
            .get(BitFieldType::UINT_8, Offset::bits(0))
            .incr_by_with_overflow(BitFieldType::INT_8, Offset::type_relative(1), 10, Overflow::Fail);
        assert_eq!(
            encode(&commands),
            vec!["GET", "u8", "0", "OVERFLOW", "FAIL", "INCRBY", "i8", "#1", "10"]
        );
    }

    #[test]
    fn test_scan_and_sort_tokens() {
        let scan = ScanOptions::new().pattern("user:*").count(100).data_type(DataType::Hash);
        assert_eq!(encode(&scan), vec!["MATCH", "user:*", "COUNT", "100", "TYPE", "hash"]);

        let sort = SortParameters::new().by("w_*").limit(0, 10).get("#").desc().alpha();
        assert_eq!(
            encode(&sort),
            vec!["BY", "w_*", "LIMIT", "0", "10", "GET", "#", "DESC", "ALPHA"]
        );
        assert!(encode(&Limit::unlimited()).is_empty());
    }

    #[test]
    fn test_weights_and_aggregate() {
        assert_eq!(
            encode(&Weights::of([1.0, 2.5])),
            vec!["WEIGHTS", "1", "2.5"]
        );
        assert_eq!(encode(&Aggregate::Max), vec!["AGGREGATE", "MAX"]);
    }
}
