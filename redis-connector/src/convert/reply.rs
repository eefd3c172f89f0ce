//! Decoding of neutral replies into result types
//!
//! Every decoder has the shape `fn(RespValue) -> RedisResult<T>` so it can be
//! stored inside a [`Request`](crate::commands::Request). Decoders that need
//! to know how a command was issued (geo flags, units, script return type)
//! take those as extra parameters and are called from dedicated commands.

use crate::convert::driver::server_error;
use bytes::Bytes;
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::types::{
    ClientInfo, ClusterNode, DataType, Distance, GeoLocation, GeoResult, GeoResults, LinkState,
    Metric, NodeFlag, Point, Properties, ReturnType, ScanPage, ScriptOutput, SlotRange, TimeUnit,
    Tuple, ValueEncoding,
};
use redis_connector_core::value::RespValue;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Turn an error reply into an error, pass everything else through
pub fn check(value: RespValue) -> RedisResult<RespValue> {
    match value {
        RespValue::Error(message) => Err(server_error(message)),
        other => Ok(other),
    }
}

fn unexpected(expected: &str, value: &RespValue) -> RedisError {
    RedisError::UnexpectedResponse(format!("expected {expected}, got {value:?}"))
}

/// Any status reply
pub fn ok(value: RespValue) -> RedisResult<()> {
    match value {
        RespValue::SimpleString(_) => Ok(()),
        other => Err(unexpected("status reply", &other)),
    }
}

/// Status text such as `PONG` or `Background saving started`
pub fn status(value: RespValue) -> RedisResult<String> {
    value.as_string()
}

/// `1`/`0`, `OK` or nil as a boolean
pub fn boolean(value: RespValue) -> RedisResult<bool> {
    match value {
        RespValue::Integer(i) => Ok(i != 0),
        RespValue::Null => Ok(false),
        RespValue::SimpleString(ref s) if s == "OK" => Ok(true),
        other => Ok(other.as_int()? != 0),
    }
}

/// Integer reply
pub fn integer(value: RespValue) -> RedisResult<i64> {
    value.as_int()
}

/// Integer reply or nil
pub fn optional_integer(value: RespValue) -> RedisResult<Option<i64>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_int().map(Some),
    }
}

/// Floating point reply, sent as a bulk string
pub fn float(value: RespValue) -> RedisResult<f64> {
    value.as_float()
}

/// Floating point reply or nil
pub fn optional_float(value: RespValue) -> RedisResult<Option<f64>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_float().map(Some),
    }
}

/// Bulk reply
pub fn bytes(value: RespValue) -> RedisResult<Bytes> {
    value.as_bytes()
}

/// Bulk reply or nil
pub fn optional_bytes(value: RespValue) -> RedisResult<Option<Bytes>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_bytes().map(Some),
    }
}

/// Bulk reply or nil, as UTF-8 text
pub fn optional_string(value: RespValue) -> RedisResult<Option<String>> {
    match value {
        RespValue::Null => Ok(None),
        other => other.as_string().map(Some),
    }
}

/// Array of bulk strings
pub fn bytes_list(value: RespValue) -> RedisResult<Vec<Bytes>> {
    value.into_array()?.iter().map(RespValue::as_bytes).collect()
}

/// Array of bulk strings that may contain nil
pub fn optional_bytes_list(value: RespValue) -> RedisResult<Vec<Option<Bytes>>> {
    value.into_array()?.into_iter().map(optional_bytes).collect()
}

/// Array of bulk strings as an unordered set
pub fn bytes_set(value: RespValue) -> RedisResult<HashSet<Bytes>> {
    value.into_array()?.iter().map(RespValue::as_bytes).collect()
}

/// Array of integers
pub fn integers(value: RespValue) -> RedisResult<Vec<i64>> {
    value.into_array()?.iter().map(RespValue::as_int).collect()
}

/// Array of `1`/`0` flags
pub fn booleans(value: RespValue) -> RedisResult<Vec<bool>> {
    value.into_array()?.into_iter().map(boolean).collect()
}

/// Split an array into pairs
///
/// RESP2 sends pairs flat (`[k1, v1, k2, v2]`), RESP3 nests them
/// (`[[k1, v1], [k2, v2]]`). Both are accepted.
fn pairs(value: RespValue) -> RedisResult<Vec<(RespValue, RespValue)>> {
    let items = value.into_array()?;
    if matches!(items.first(), Some(RespValue::Array(_))) {
        return items
            .into_iter()
            .map(|item| {
                let mut pair = item.into_array()?.into_iter();
                match (pair.next(), pair.next()) {
                    (Some(k), Some(v)) => Ok((k, v)),
                    _ => Err(RedisError::UnexpectedResponse(
                        "expected a two element array".to_string(),
                    )),
                }
            })
            .collect();
    }

    if items.len() % 2 != 0 {
        return Err(RedisError::UnexpectedResponse(format!(
            "expected an even number of elements, got {}",
            items.len()
        )));
    }
    let mut iter = items.into_iter();
    let mut out = Vec::with_capacity(iter.len() / 2);
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        out.push((k, v));
    }
    Ok(out)
}

/// Field/value pairs
pub fn bytes_pairs(value: RespValue) -> RedisResult<Vec<(Bytes, Bytes)>> {
    pairs(value)?
        .into_iter()
        .map(|(k, v)| Ok((k.as_bytes()?, v.as_bytes()?)))
        .collect()
}

/// Field/value pairs as a map
pub fn bytes_map(value: RespValue) -> RedisResult<HashMap<Bytes, Bytes>> {
    Ok(bytes_pairs(value)?.into_iter().collect())
}

/// Name/count pairs such as the reply of `PUBSUB NUMSUB`
pub fn counts(value: RespValue) -> RedisResult<Vec<(Bytes, i64)>> {
    pairs(value)?
        .into_iter()
        .map(|(k, v)| Ok((k.as_bytes()?, v.as_int()?)))
        .collect()
}

/// Member/score pairs
pub fn tuples(value: RespValue) -> RedisResult<Vec<Tuple>> {
    pairs(value)?
        .into_iter()
        .map(|(member, score)| {
            Ok(Tuple {
                value: member.as_bytes()?,
                score: score.as_float()?,
            })
        })
        .collect()
}

/// A single member/score pair, absent on an empty reply
pub fn optional_tuple(value: RespValue) -> RedisResult<Option<Tuple>> {
    Ok(tuples(value)?.into_iter().next())
}

/// `[key, member, score]` as returned by `BZPOPMIN`/`BZPOPMAX`
pub fn keyed_tuple(value: RespValue) -> RedisResult<Option<(Bytes, Tuple)>> {
    let items = value.into_array()?;
    match items.as_slice() {
        [] => Ok(None),
        [key, member, score] => Ok(Some((
            key.as_bytes()?,
            Tuple {
                value: member.as_bytes()?,
                score: score.as_float()?,
            },
        ))),
        _ => Err(RedisError::UnexpectedResponse(format!(
            "expected [key, member, score], got {} elements",
            items.len()
        ))),
    }
}

/// `[key, element]` as returned by `BLPOP`/`BRPOP`
pub fn keyed_value(value: RespValue) -> RedisResult<Option<(Bytes, Bytes)>> {
    let items = value.into_array()?;
    match items.as_slice() {
        [] => Ok(None),
        [key, element] => Ok(Some((key.as_bytes()?, element.as_bytes()?))),
        _ => Err(RedisError::UnexpectedResponse(format!(
            "expected [key, element], got {} elements",
            items.len()
        ))),
    }
}

/// Scores that may be nil
pub fn optional_scores(value: RespValue) -> RedisResult<Vec<Option<f64>>> {
    value.into_array()?.into_iter().map(optional_float).collect()
}

fn scan_page<T>(
    value: RespValue,
    items: impl FnOnce(RespValue) -> RedisResult<Vec<T>>,
) -> RedisResult<ScanPage<T>> {
    let mut parts = value.into_array()?.into_iter();
    let (cursor, page) = match (parts.next(), parts.next()) {
        (Some(cursor), Some(page)) => (cursor, page),
        _ => {
            return Err(RedisError::UnexpectedResponse(
                "expected [cursor, items]".to_string(),
            ))
        }
    };
    let cursor = cursor
        .as_string()?
        .parse::<u64>()
        .map_err(|e| RedisError::Type(format!("Invalid scan cursor: {e}")))?;
    Ok(ScanPage {
        cursor,
        items: items(page)?,
    })
}

/// `SCAN`/`SSCAN` page
pub fn scan_bytes(value: RespValue) -> RedisResult<ScanPage<Bytes>> {
    scan_page(value, bytes_list)
}

/// `HSCAN` page
pub fn scan_pairs(value: RespValue) -> RedisResult<ScanPage<(Bytes, Bytes)>> {
    scan_page(value, bytes_pairs)
}

/// `ZSCAN` page
pub fn scan_tuples(value: RespValue) -> RedisResult<ScanPage<Tuple>> {
    scan_page(value, tuples)
}

fn point(value: &RespValue) -> RedisResult<Option<Point>> {
    match value {
        RespValue::Null => Ok(None),
        RespValue::Array(coords) if coords.is_empty() => Ok(None),
        RespValue::Array(coords) if coords.len() == 2 => Ok(Some(Point::new(
            coords[0].as_float()?,
            coords[1].as_float()?,
        ))),
        other => Err(unexpected("[longitude, latitude]", other)),
    }
}

/// `GEOPOS` reply
pub fn positions(value: RespValue) -> RedisResult<Vec<Option<Point>>> {
    value.into_array()?.iter().map(point).collect()
}

/// `GEOHASH` reply
pub fn geohashes(value: RespValue) -> RedisResult<Vec<Option<String>>> {
    value.into_array()?.into_iter().map(optional_string).collect()
}

/// `GEODIST` reply in the requested unit
pub fn distance(value: RespValue, metric: Metric) -> RedisResult<Option<Distance>> {
    Ok(optional_float(value)?.map(|d| Distance::new(d, metric)))
}

/// `GEORADIUS`/`GEOSEARCH` reply
///
/// Without `WITHDIST`/`WITHCOORD` every hit is a plain member name.
/// Otherwise each hit is `[name, distance?, coordinates?]` in that order.
/// Distances that were not requested are reported as zero.
pub fn geo_results(
    value: RespValue,
    with_dist: bool,
    with_coord: bool,
    metric: Metric,
) -> RedisResult<GeoResults<Bytes>> {
    let items = value.into_array()?;
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let result = match item {
            RespValue::Array(fields) => {
                let mut fields = fields.into_iter();
                let missing = || RedisError::UnexpectedResponse("truncated geo result".to_string());
                let name = fields.next().ok_or_else(missing)?.as_bytes()?;
                let distance = if with_dist {
                    fields.next().ok_or_else(missing)?.as_float()?
                } else {
                    0.0
                };
                let point = if with_coord {
                    point(&fields.next().ok_or_else(missing)?)?
                } else {
                    None
                };
                GeoResult {
                    content: GeoLocation { name, point },
                    distance: Distance::new(distance, metric),
                }
            }
            name => GeoResult {
                content: GeoLocation {
                    name: name.as_bytes()?,
                    point: None,
                },
                distance: Distance::new(0.0, metric),
            },
        };
        results.push(result);
    }
    Ok(GeoResults::new(results, metric))
}

/// `key:value` text as returned by `INFO` and `CLUSTER INFO`
pub fn info_properties(value: RespValue) -> RedisResult<Properties> {
    Ok(parse_info(&value.as_string()?))
}

/// Parse `key:value` lines, skipping `# Section` headers
pub fn parse_info(text: &str) -> Properties {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Name/value pairs as returned by `CONFIG GET`
pub fn properties_from_pairs(value: RespValue) -> RedisResult<Properties> {
    pairs(value)?
        .into_iter()
        .map(|(k, v)| Ok((k.as_string()?, v.as_string()?)))
        .collect()
}

/// `CLIENT LIST` reply, one entry per line of `key=value` tokens
pub fn client_list(value: RespValue) -> RedisResult<Vec<ClientInfo>> {
    let text = value.as_string()?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            ClientInfo::new(
                line.split_whitespace()
                    .filter_map(|token| token.split_once('='))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        })
        .collect())
}

/// `TIME` reply as microseconds since the epoch
pub fn time_micros(value: RespValue) -> RedisResult<i64> {
    let items = value.into_array()?;
    match items.as_slice() {
        [seconds, micros] => Ok(seconds.as_int()? * 1_000_000 + micros.as_int()?),
        _ => Err(RedisError::UnexpectedResponse(format!(
            "expected [seconds, microseconds], got {} elements",
            items.len()
        ))),
    }
}

/// `TIME` reply converted to `unit`
pub fn time_in(value: RespValue, unit: TimeUnit) -> RedisResult<i64> {
    Ok(unit.convert(time_micros(value)?, TimeUnit::Microseconds))
}

/// Convert a TTL reply, leaving the `-1` (no expiry) and `-2` (no key)
/// markers untouched
pub fn ttl_in(value: RespValue, from: TimeUnit, to: TimeUnit) -> RedisResult<i64> {
    let ttl = value.as_int()?;
    Ok(if ttl > 0 { to.convert(ttl, from) } else { ttl })
}

/// `TYPE` reply
pub fn data_type(value: RespValue) -> RedisResult<DataType> {
    let code = value.as_string()?;
    DataType::from_code(&code).ok_or_else(|| RedisError::Type(format!("Unknown data type: {code}")))
}

/// `OBJECT ENCODING` reply
pub fn value_encoding(value: RespValue) -> RedisResult<ValueEncoding> {
    match value {
        RespValue::Null => Ok(ValueEncoding::Vacant),
        other => Ok(ValueEncoding::from_name(&other.as_string()?)),
    }
}

/// `OBJECT IDLETIME` reply
pub fn idle_time(value: RespValue) -> RedisResult<Option<Duration>> {
    Ok(optional_integer(value)?.map(|secs| Duration::from_secs(secs.max(0) as u64)))
}

/// `BITFIELD` reply; nil where an `OVERFLOW FAIL` increment was refused
pub fn bitfield_results(value: RespValue) -> RedisResult<Vec<Option<i64>>> {
    value.into_array()?.into_iter().map(optional_integer).collect()
}

/// Script reply interpreted according to `return_type`
pub fn script_output(value: RespValue, return_type: ReturnType) -> RedisResult<ScriptOutput> {
    Ok(match return_type {
        ReturnType::Boolean => ScriptOutput::Boolean(boolean(value)?),
        ReturnType::Integer => ScriptOutput::Integer(value.as_int()?),
        ReturnType::Multi => ScriptOutput::Multi(value.into_array()?),
        ReturnType::Status => ScriptOutput::Status(value.as_string()?),
        ReturnType::Value => ScriptOutput::Value(optional_bytes(value)?),
    })
}

/// `CLUSTER NODES` reply
pub fn cluster_nodes(value: RespValue) -> RedisResult<Vec<ClusterNode>> {
    parse_cluster_nodes(&value.as_string()?)
}

/// Parse the text of `CLUSTER NODES`
pub fn parse_cluster_nodes(text: &str) -> RedisResult<Vec<ClusterNode>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_cluster_node)
        .collect()
}

fn parse_cluster_node(line: &str) -> RedisResult<ClusterNode> {
    let malformed = || RedisError::Protocol(format!("Malformed CLUSTER NODES line: {line}"));
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(malformed());
    }

    // ip:port@cport[,hostname]
    let (address, hostname) = match parts[1].split_once(',') {
        Some((address, hostname)) if !hostname.is_empty() => {
            (address, Some(hostname.to_string()))
        }
        Some((address, _)) => (address, None),
        None => (parts[1], None),
    };
    let address = address.split('@').next().unwrap_or(address);
    let (host, port) = address.rsplit_once(':').ok_or_else(malformed)?;
    let port = port.parse::<u16>().map_err(|_| malformed())?;

    let slots = parts[8..]
        .iter()
        .filter(|token| !token.starts_with('['))
        .map(|token| parse_slot_range(token).ok_or_else(malformed))
        .collect::<RedisResult<Vec<_>>>()?;

    Ok(ClusterNode {
        id: parts[0].to_string(),
        host: host.to_string(),
        port,
        hostname,
        flags: parts[2].split(',').filter_map(NodeFlag::from_raw).collect(),
        master_id: Some(parts[3])
            .filter(|id| *id != "-")
            .map(str::to_string),
        config_epoch: parts[6].parse().unwrap_or(0),
        link_state: if parts[7] == "connected" {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        },
        slots,
    })
}

fn parse_slot_range(token: &str) -> Option<SlotRange> {
    match token.split_once('-') {
        Some((start, end)) => Some(SlotRange::new(start.parse().ok()?, end.parse().ok()?)),
        None => token.parse().ok().map(SlotRange::single),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> RespValue {
        RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn test_tuples_accept_flat_and_nested_pairs() {
        let flat = RespValue::Array(vec![bulk("a"), bulk("1"), bulk("b"), bulk("2.5")]);
        let nested = RespValue::Array(vec![
            RespValue::Array(vec![bulk("a"), bulk("1")]),
            RespValue::Array(vec![bulk("b"), bulk("2.5")]),
        ]);
        let expected = vec![Tuple::new("a", 1.0), Tuple::new("b", 2.5)];
        assert_eq!(tuples(flat).unwrap(), expected);
        assert_eq!(tuples(nested).unwrap(), expected);
        assert!(tuples(RespValue::Array(vec![bulk("a")])).is_err());
    }

    #[test]
    fn test_ttl_markers_are_preserved() {
        assert_eq!(
            ttl_in(RespValue::Integer(-1), TimeUnit::Seconds, TimeUnit::Milliseconds).unwrap(),
            -1
        );
        assert_eq!(
            ttl_in(RespValue::Integer(-2), TimeUnit::Seconds, TimeUnit::Milliseconds).unwrap(),
            -2
        );
        assert_eq!(
            ttl_in(RespValue::Integer(90), TimeUnit::Seconds, TimeUnit::Minutes).unwrap(),
            1
        );
    }

    #[test]
    fn test_info_parsing() {
        let text = "# Server\r\nredis_version:7.2.0\r\ntcp_port:6379\r\n\r\n# Clients\r\nconnected_clients:1\r\n";
        let props = info_properties(bulk(text)).unwrap();
        assert_eq!(props.get("redis_version").map(String::as_str), Some("7.2.0"));
        assert_eq!(props.get("connected_clients").map(String::as_str), Some("1"));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn test_client_list_parsing() {
        let text = "id=3 addr=127.0.0.1:5000 name= age=10 db=0 cmd=client|list\nid=4 addr=127.0.0.1:5001 name=worker age=2 db=1 cmd=get\n";
        let clients = client_list(bulk(text)).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].id(), Some(3));
        assert_eq!(clients[0].name(), None);
        assert_eq!(clients[1].name(), Some("worker"));
        assert_eq!(clients[1].database(), Some(1));
    }

    #[test]
    fn test_cluster_nodes_parsing() {
        let text = "\
e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 127.0.0.1:30001@31001,host-1 myself,master - 0 0 1 connected 0-5460 7000 [5461->-07c37dfeb235213a872192d90877d0cd55635b91]
07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30004@31004 slave e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 0 1426238317239 4 connected
";
        let nodes = parse_cluster_nodes(text).unwrap();
        assert_eq!(nodes.len(), 2);

        let master = &nodes[0];
        assert!(master.is_master());
        assert!(master.is_myself());
        assert_eq!(master.hostname.as_deref(), Some("host-1"));
        assert_eq!(master.port, 30001);
        assert_eq!(master.slots, vec![SlotRange::new(0, 5460), SlotRange::single(7000)]);
        assert!(master.is_connected());

        let replica = &nodes[1];
        assert!(replica.is_replica());
        assert_eq!(replica.master_id.as_deref(), Some(master.id.as_str()));
        assert_eq!(replica.config_epoch, 4);
        assert!(replica.slots.is_empty());

        assert!(parse_cluster_nodes("garbage line").is_err());
    }

    #[test]
    fn test_geo_results_shapes() {
        let plain = RespValue::Array(vec![bulk("Palermo"), bulk("Catania")]);
        let results = geo_results(plain, false, false, Metric::Kilometers).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.results[0].distance, Distance::kilometers(0.0));
        assert_eq!(results.results[0].content.point, None);

        let detailed = RespValue::Array(vec![RespValue::Array(vec![
            bulk("Palermo"),
            bulk("190.4424"),
            RespValue::Array(vec![bulk("13.36138933897018433"), bulk("38.11555639549629859")]),
        ])]);
        let results = geo_results(detailed, true, true, Metric::Kilometers).unwrap();
        let hit = &results.results[0];
        assert_eq!(hit.content.name, Bytes::from_static(b"Palermo"));
        assert!((hit.distance.value - 190.4424).abs() < 1e-9);
        let point = hit.content.point.unwrap();
        assert!((point.longitude - 13.361_389).abs() < 1e-5);
        assert!((results.average_distance.value - 190.4424).abs() < 1e-9);
    }

    #[test]
    fn test_scan_page() {
        let reply = RespValue::Array(vec![
            bulk("17"),
            RespValue::Array(vec![bulk("k1"), bulk("k2")]),
        ]);
        let page = scan_bytes(reply).unwrap();
        assert_eq!(page.cursor, 17);
        assert_eq!(page.items.len(), 2);
        assert!(!page.is_finished());
    }

    #[test]
    fn test_script_output_by_return_type() {
        assert_eq!(
            script_output(RespValue::Null, ReturnType::Boolean).unwrap(),
            ScriptOutput::Boolean(false)
        );
        assert_eq!(
            script_output(RespValue::Integer(7), ReturnType::Integer).unwrap(),
            ScriptOutput::Integer(7)
        );
        assert_eq!(
            script_output(RespValue::Null, ReturnType::Value).unwrap(),
            ScriptOutput::Value(None)
        );
        assert_eq!(
            script_output(RespValue::ok(), ReturnType::Status).unwrap(),
            ScriptOutput::Status("OK".into())
        );
    }

    #[test]
    fn test_error_reply_is_checked() {
        assert!(matches!(
            check(RespValue::Error("NOSCRIPT missing".into())),
            Err(RedisError::NoScript(_))
        ));
        assert_eq!(check(RespValue::Integer(1)).unwrap(), RespValue::Integer(1));
    }

    #[test]
    fn test_keyed_replies() {
        assert_eq!(keyed_value(RespValue::Null).unwrap(), None);
        let popped = keyed_tuple(RespValue::Array(vec![bulk("z"), bulk("m"), bulk("3")]))
            .unwrap()
            .unwrap();
        assert_eq!(popped.0, Bytes::from_static(b"z"));
        assert_eq!(popped.1, Tuple::new("m", 3.0));
    }
}
