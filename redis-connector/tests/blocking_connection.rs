//! Blocking connection against a scripted server

mod common;

use bytes::Bytes;
use common::{array, bulk, error, MockRedis};
use redis::Value;
use redis_connector::commands::{
    HashCommands, KeyCommands, ScriptingCommands, ServerCommands, StringCommands,
    TransactionCommands, ZSetCommands,
};
use redis_connector::connection::{BlockingConnection, Pipeline, Transaction};
use redis_connector::types::{
    BitOperation, ExpireCondition, Range, ReturnType, ScanOptions, TimeUnit, Tuple, ZAddArgs,
};
use redis_connector::RedisError;
use std::ops::Bound;
use std::time::{Duration, UNIX_EPOCH};

fn connect() -> (MockRedis, BlockingConnection<MockRedis>) {
    common::init_tracing();
    let server = MockRedis::new();
    (server.clone(), BlockingConnection::new(server))
}

#[test]
fn test_set_and_get() {
    let (server, mut conn) = connect();
    server.reply(Value::Okay).reply(bulk("value"));

    conn.set("key", "value").unwrap();
    assert_eq!(conn.get("key").unwrap(), Some(Bytes::from_static(b"value")));
    assert_eq!(
        server.sent(),
        vec![vec!["SET", "key", "value"], vec!["GET", "key"]]
    );
}

#[test]
fn test_missing_key_is_none() {
    let (server, mut conn) = connect();
    server.reply(Value::Nil);
    assert_eq!(conn.get("missing").unwrap(), None);
}

#[test]
fn test_multi_word_command() {
    let (server, mut conn) = connect();
    server.reply(array(vec![bulk("maxmemory"), bulk("0")]));

    let config = conn.config_get("maxmemory").unwrap();
    assert_eq!(config.get("maxmemory").map(String::as_str), Some("0"));
    assert_eq!(server.sent(), vec![vec!["CONFIG", "GET", "maxmemory"]]);
}

#[test]
fn test_hgetall_builds_a_map() {
    let (server, mut conn) = connect();
    server.reply(array(vec![bulk("f1"), bulk("v1"), bulk("f2"), bulk("v2")]));

    let hash = conn.hgetall("h").unwrap();
    assert_eq!(hash.len(), 2);
    assert_eq!(
        hash.get(&Bytes::from_static(b"f2")),
        Some(&Bytes::from_static(b"v2"))
    );
}

#[test]
fn test_expire_picks_precision() {
    let (server, mut conn) = connect();
    server.reply(Value::Int(1)).reply(Value::Int(0));

    assert!(conn
        .expire("k", Duration::from_secs(10), ExpireCondition::Always)
        .unwrap());
    assert!(!conn
        .expire("k", Duration::from_millis(1500), ExpireCondition::Nx)
        .unwrap());
    assert_eq!(
        server.sent(),
        vec![vec!["EXPIRE", "k", "10"], vec!["PEXPIRE", "k", "1500", "NX"]]
    );
}

#[test]
fn test_expire_at_picks_precision() {
    let (server, mut conn) = connect();
    server.reply(Value::Int(1)).reply(Value::Int(1));

    let whole_seconds = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let with_millis = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
    assert!(conn
        .expire_at("k", whole_seconds, ExpireCondition::Always)
        .unwrap());
    assert!(conn.expire_at("k", with_millis, ExpireCondition::Gt).unwrap());
    assert_eq!(
        server.sent(),
        vec![
            vec!["EXPIREAT", "k", "1700000000"],
            vec!["PEXPIREAT", "k", "1700000000250", "GT"],
        ]
    );
}

#[test]
fn test_ttl_is_converted_to_the_requested_unit() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Int(7200))
        .reply(Value::Int(1500))
        .reply(Value::Int(-1))
        .reply(Value::Int(-2));

    assert_eq!(conn.ttl_in("k", TimeUnit::Hours).unwrap(), 2);
    assert_eq!(conn.pttl_in("k", TimeUnit::Seconds).unwrap(), 1);
    assert_eq!(conn.ttl_in("persistent", TimeUnit::Milliseconds).unwrap(), -1);
    assert_eq!(conn.pttl_in("missing", TimeUnit::Minutes).unwrap(), -2);
    assert_eq!(server.names(), ["TTL", "PTTL", "TTL", "PTTL"]);
}

#[test]
fn test_bit_pos_range_arguments() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Int(3))
        .reply(Value::Int(3))
        .reply(Value::Int(3))
        .reply(Value::Int(3));

    conn.bit_pos("b", true, &Range::unbounded()).unwrap();
    conn.bit_pos("b", false, &Range::at_least(2)).unwrap();
    conn.bit_pos("b", true, &Range::at_most(5)).unwrap();
    conn.bit_pos("b", true, &Range::new(Bound::Excluded(1), Bound::Included(-1)))
        .unwrap();
    assert_eq!(
        server.sent(),
        vec![
            vec!["BITPOS", "b", "1"],
            vec!["BITPOS", "b", "0", "2"],
            vec!["BITPOS", "b", "1", "0", "5"],
            vec!["BITPOS", "b", "1", "1", "-1"],
        ]
    );
}

#[test]
fn test_invalid_arguments_are_not_sent() {
    let (server, mut conn) = connect();

    assert!(matches!(
        conn.bit_op(BitOperation::Not, "dest", &["a", "b"]),
        Err(RedisError::InvalidArgument(_))
    ));
    assert!(matches!(
        conn.zadd_multiple(
            "z",
            &[Tuple::new("m", 1.0)],
            ZAddArgs::empty().if_not_exists().if_exists()
        ),
        Err(RedisError::InvalidArgument(_))
    ));
    assert!(matches!(
        conn.set_ex("k", Duration::ZERO, "v"),
        Err(RedisError::InvalidArgument(_))
    ));
    assert!(server.sent().is_empty());
}

#[test]
fn test_driver_errors_are_translated() {
    let (server, mut conn) = connect();
    server.fail(redis::RedisError::from((
        redis::ErrorKind::Moved,
        "An error was signalled by the server",
        "3999 127.0.0.1:6381".to_string(),
    )));
    server.fail(redis::RedisError::from(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "timed out",
    )));

    match conn.incr("counter") {
        Err(RedisError::Moved { slot, host, port }) => {
            assert_eq!((slot, host.as_str(), port), (3999, "127.0.0.1", 6381));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(conn.incr("counter"), Err(RedisError::Timeout)));
}

#[test]
fn test_scan_iter_follows_the_cursor() {
    let (server, mut conn) = connect();
    server
        .reply(array(vec![bulk("17"), array(vec![bulk("a"), bulk("b")])]))
        .reply(array(vec![bulk("0"), array(vec![bulk("c")])]));

    let keys: Vec<Bytes> = conn
        .scan_iter(ScanOptions::new().pattern("*").count(2))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        keys,
        vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"b"),
            Bytes::from_static(b"c"),
        ]
    );
    assert_eq!(
        server.sent(),
        vec![
            vec!["SCAN", "0", "MATCH", "*", "COUNT", "2"],
            vec!["SCAN", "17", "MATCH", "*", "COUNT", "2"],
        ]
    );
}

#[test]
fn test_scan_iter_stops_after_an_error() {
    let (server, mut conn) = connect();
    server.reply(Value::SimpleString("garbage".to_string()));

    let mut members = conn.sscan_iter("s", ScanOptions::new());
    assert!(members.next().unwrap().is_err());
    assert!(members.next().is_none());
}

#[test]
fn test_pipeline_round_trip() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(bulk("v"))
        .reply(Value::Int(4));

    let mut pipeline = Pipeline::new();
    pipeline.set("k", "v");
    let get = pipeline.get("k");
    let incr = pipeline.incr("n");

    let mut results = conn.run_pipeline(&pipeline).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results.take(incr).unwrap(), 4);
    assert_eq!(results.take(get).unwrap(), Some(Bytes::from_static(b"v")));
    assert_eq!(server.names(), ["SET", "GET", "INCR"]);
}

#[test]
fn test_pipeline_error_reply_fails_only_its_handle() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(error(
            "WRONGTYPE Operation against a key holding the wrong kind of value",
        ))
        .reply(error("NOSCRIPT No matching script. Please use EVAL."))
        .reply(Value::Int(4));

    let mut pipeline = Pipeline::new();
    let set = pipeline.set("k", "v");
    let get = pipeline.get("h");
    let missing_script = pipeline.eval_sha("abc", ReturnType::Integer, &["k"], &["1"]);
    let incr = pipeline.incr("n");

    let mut results = conn.run_pipeline(&pipeline).unwrap();
    assert!(results.take(set).is_ok());
    assert!(matches!(results.take(get), Err(RedisError::Type(_))));
    assert!(matches!(results.take(missing_script), Err(RedisError::NoScript(_))));
    assert_eq!(results.take(incr).unwrap(), 4);
}

#[test]
fn test_transaction_exec() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(array(vec![Value::Int(1), Value::Int(2)]));

    let mut transaction = Transaction::new();
    let first = transaction.incr("n");
    let second = transaction.incr("n");

    let mut results = conn.exec(&transaction).unwrap().expect("not aborted");
    assert_eq!(results.take(first).unwrap(), 1);
    assert_eq!(results.take(second).unwrap(), 2);
    assert_eq!(server.names(), ["MULTI", "INCR", "INCR", "EXEC"]);
}

#[test]
fn test_transaction_aborted_by_watch() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(Value::Okay)
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(Value::Nil);

    conn.watch(&["balance"]).unwrap();
    let mut transaction = Transaction::new();
    transaction.del(&["balance"]);
    assert!(conn.exec(&transaction).unwrap().is_none());
}

#[test]
fn test_transaction_discarded_by_the_server() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(error("ERR unknown command 'NOPE'"))
        .reply(error(
            "EXECABORT Transaction discarded because of previous errors.",
        ));

    let mut transaction = Transaction::new();
    transaction.incr("n");
    assert!(matches!(
        conn.exec(&transaction),
        Err(RedisError::ExecAborted(_))
    ));
}

#[test]
fn test_transaction_error_reply_inside_exec() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(array(vec![
            error("WRONGTYPE Operation against a key holding the wrong kind of value"),
            Value::Int(2),
        ]));

    let mut transaction = Transaction::new();
    let first = transaction.incr("h");
    let second = transaction.incr("n");

    let mut results = conn.exec(&transaction).unwrap().expect("not aborted");
    assert!(matches!(results.take(first), Err(RedisError::Type(_))));
    assert_eq!(results.take(second).unwrap(), 2);
}
