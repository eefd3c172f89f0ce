//! Translation between neutral commands/replies and redis-rs types

use crate::commands::Command;
use redis_connector_core::error::RedisError;
use redis_connector_core::value::RespValue;
use bytes::Bytes;
use redis::ErrorKind;

/// Build a `redis::Cmd` from a neutral command
///
/// Names made of several words (`CONFIG GET`, `CLIENT LIST`) are split:
/// the first word becomes the command, the rest are prepended to the
/// arguments.
pub fn to_redis_cmd<C: Command + ?Sized>(command: &C) -> redis::Cmd {
    let mut words = command.command_name().split_whitespace();
    let mut cmd = redis::cmd(words.next().unwrap_or_default());
    for word in words {
        cmd.arg(word);
    }
    for arg in command.args() {
        cmd.arg(&arg[..]);
    }
    cmd
}

/// Convert a redis-rs reply into the neutral RESP2 shaped value
pub fn from_redis_value(value: redis::Value) -> RespValue {
    match value {
        redis::Value::Nil => RespValue::Null,
        redis::Value::Int(i) => RespValue::Integer(i),
        redis::Value::BulkString(bytes) => RespValue::BulkString(Bytes::from(bytes)),
        redis::Value::Array(items) | redis::Value::Set(items) => {
            RespValue::Array(items.into_iter().map(from_redis_value).collect())
        }
        redis::Value::SimpleString(s) => RespValue::SimpleString(s),
        redis::Value::Okay => RespValue::ok(),
        redis::Value::Map(pairs) => RespValue::Array(
            pairs
                .into_iter()
                .flat_map(|(k, v)| [from_redis_value(k), from_redis_value(v)])
                .collect(),
        ),
        redis::Value::Double(d) => RespValue::BulkString(Bytes::from(format_double(d))),
        redis::Value::Boolean(b) => RespValue::Integer(i64::from(b)),
        redis::Value::VerbatimString { text, .. } => RespValue::BulkString(Bytes::from(text)),
        redis::Value::Push { data, .. } => {
            RespValue::Array(data.into_iter().map(from_redis_value).collect())
        }
        redis::Value::Attribute { data, .. } => from_redis_value(*data),
        redis::Value::BigNumber(n) => RespValue::BulkString(Bytes::from(n.to_string())),
        redis::Value::ServerError(err) => RespValue::Error(match err.details() {
            Some(details) => format!("{} {details}", err.code()),
            None => err.code().to_string(),
        }),
    }
}

fn format_double(d: f64) -> String {
    if d == f64::INFINITY {
        "inf".to_string()
    } else if d == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        d.to_string()
    }
}

/// Translate a redis-rs error into a [`RedisError`]
pub fn translate_error(err: redis::RedisError) -> RedisError {
    if err.is_timeout() {
        return RedisError::Timeout;
    }
    if err.is_connection_refusal() || err.is_connection_dropped() {
        return RedisError::Connection(err.to_string());
    }

    let detail = || err.detail().unwrap_or_default().to_string();
    match err.kind() {
        ErrorKind::Moved => RedisError::parse_redirect(&format!("MOVED {}", detail()))
            .unwrap_or_else(|| RedisError::Cluster(err.to_string())),
        ErrorKind::Ask => RedisError::parse_redirect(&format!("ASK {}", detail()))
            .unwrap_or_else(|| RedisError::Cluster(err.to_string())),
        ErrorKind::ClusterDown | ErrorKind::CrossSlot | ErrorKind::TryAgain => {
            RedisError::Cluster(err.to_string())
        }
        ErrorKind::NoScriptError => RedisError::NoScript(detail()),
        ErrorKind::ExecAbortError => RedisError::ExecAborted(err.to_string()),
        ErrorKind::AuthenticationFailed => RedisError::Auth(err.to_string()),
        ErrorKind::ReadOnly => RedisError::ReadOnly(err.to_string()),
        ErrorKind::TypeError => RedisError::Type(err.to_string()),
        ErrorKind::InvalidClientConfig => RedisError::Config(err.to_string()),
        ErrorKind::ParseError => RedisError::Protocol(err.to_string()),
        ErrorKind::IoError => RedisError::Connection(err.to_string()),
        ErrorKind::ResponseError | ErrorKind::ExtensionError => match (err.code(), err.detail()) {
            (Some(code), Some(detail)) => server_error(format!("{code} {detail}")),
            _ => server_error(err.to_string()),
        },
        _ if err.is_io_error() => RedisError::Connection(err.to_string()),
        _ => server_error(err.to_string()),
    }
}

/// Classify an error reply by its prefix
pub fn server_error(message: String) -> RedisError {
    let code = message.split_whitespace().next().unwrap_or_default();
    match code {
        "MOVED" | "ASK" => {
            RedisError::parse_redirect(&message).unwrap_or(RedisError::Server(message))
        }
        "NOSCRIPT" => RedisError::NoScript(message),
        "EXECABORT" => RedisError::ExecAborted(message),
        "WRONGTYPE" => RedisError::Type(message),
        "NOAUTH" | "WRONGPASS" | "NOPERM" => RedisError::Auth(message),
        "READONLY" => RedisError::ReadOnly(message),
        "CLUSTERDOWN" | "CROSSSLOT" | "TRYAGAIN" => RedisError::Cluster(message),
        _ => RedisError::Server(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Request;
    use crate::convert::reply;

    #[test]
    fn test_multi_word_command_is_split() {
        let request = Request::new("CONFIG GET", reply::properties_from_pairs).arg("maxmemory");
        let packed = to_redis_cmd(&request).get_packed_command();
        let expected = redis::cmd("CONFIG")
            .arg("GET")
            .arg("maxmemory")
            .get_packed_command();
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_resp3_values_are_flattened() {
        let map = redis::Value::Map(vec![(
            redis::Value::SimpleString("field".into()),
            redis::Value::Int(1),
        )]);
        assert_eq!(
            from_redis_value(map),
            RespValue::Array(vec![
                RespValue::SimpleString("field".into()),
                RespValue::Integer(1)
            ])
        );
        assert_eq!(from_redis_value(redis::Value::Boolean(true)), RespValue::Integer(1));
        assert_eq!(
            from_redis_value(redis::Value::Double(1.5)),
            RespValue::BulkString(Bytes::from_static(b"1.5"))
        );
        assert_eq!(from_redis_value(redis::Value::Okay), RespValue::ok());
        assert_eq!(from_redis_value(redis::Value::Nil), RespValue::Null);
    }

    #[test]
    fn test_error_values_keep_their_code() {
        let wrong_type = redis::parse_redis_value(
            b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
        )
        .unwrap();
        assert_eq!(
            from_redis_value(wrong_type),
            RespValue::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".into()
            )
        );

        let moved = redis::parse_redis_value(b"-MOVED 3999 127.0.0.1:6381\r\n").unwrap();
        assert_eq!(
            from_redis_value(moved),
            RespValue::Error("MOVED 3999 127.0.0.1:6381".into())
        );

        let bare = redis::parse_redis_value(b"-LOADING\r\n").unwrap();
        assert_eq!(from_redis_value(bare), RespValue::Error("LOADING".into()));
    }

    #[test]
    fn test_server_error_classification() {
        assert!(matches!(
            server_error("MOVED 3999 127.0.0.1:6381".into()),
            RedisError::Moved { slot: 3999, .. }
        ));
        assert!(matches!(
            server_error("NOSCRIPT No matching script".into()),
            RedisError::NoScript(_)
        ));
        assert!(matches!(
            server_error("WRONGTYPE Operation against a key".into()),
            RedisError::Type(_)
        ));
        assert!(matches!(
            server_error("CROSSSLOT Keys in request".into()),
            RedisError::Cluster(_)
        ));
        assert!(matches!(server_error("ERR unknown".into()), RedisError::Server(_)));
    }

    #[test]
    fn test_translate_driver_errors() {
        let io = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(translate_error(io), RedisError::Connection(_)));

        let timeout = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        assert!(matches!(translate_error(timeout), RedisError::Timeout));

        let type_error = redis::RedisError::from((ErrorKind::TypeError, "bad type"));
        assert!(matches!(translate_error(type_error), RedisError::Type(_)));
    }
}
