//! Async connection against a scripted server

mod common;

use bytes::Bytes;
use common::{array, bulk, error, MockRedis};
use futures_util::StreamExt;
use redis::Value;
use redis_connector::commands::{
    ConnectionCommands, ListCommands, ScriptingCommands, SetCommands, StringCommands,
};
use redis_connector::connection::{AsyncConnection, Pipeline, Transaction};
use redis_connector::types::{ReturnType, ScanOptions, ScriptOutput};
use redis_connector::{ConnectionConfig, RedisConnectionFactory, RedisError, RedisScript};
use std::time::Duration;

fn connect() -> (MockRedis, AsyncConnection<MockRedis>) {
    common::init_tracing();
    let server = MockRedis::new();
    (server.clone(), AsyncConnection::new(server))
}

#[tokio::test]
async fn test_commands_resolve_to_decoded_values() {
    let (server, mut conn) = connect();
    server
        .reply(Value::SimpleString("PONG".to_string()))
        .reply(Value::Int(3))
        .reply(array(vec![bulk("a"), Value::Nil]));

    assert_eq!(conn.ping().await.unwrap(), "PONG");
    assert_eq!(conn.rpush("list", &["x", "y", "z"]).await.unwrap(), 3);
    assert_eq!(
        conn.mget(&["a", "b"]).await.unwrap(),
        vec![Some(Bytes::from_static(b"a")), None]
    );
    assert_eq!(server.sent()[1], ["RPUSH", "list", "x", "y", "z"]);
}

#[tokio::test]
async fn test_rejection_resolves_without_io() {
    let (server, mut conn) = connect();
    let outcome = conn.lpush("list", &[] as &[&str]).await;
    assert!(matches!(outcome, Err(RedisError::InvalidArgument(_))));
    assert!(server.sent().is_empty());
}

#[tokio::test]
async fn test_operation_timeout() {
    let (server, conn) = connect();
    let mut conn = conn.with_operation_timeout(Duration::from_millis(20));
    server.hang();
    assert!(matches!(conn.get("k").await, Err(RedisError::Timeout)));
}

#[tokio::test]
async fn test_server_error_reply() {
    let (server, mut conn) = connect();
    server.reply(Value::Okay);
    server.fail(redis::RedisError::from((
        redis::ErrorKind::ExecAbortError,
        "Transaction discarded because of previous errors",
    )));

    let mut transaction = Transaction::new();
    transaction.incr("k");
    assert!(matches!(
        conn.exec(&transaction).await,
        Err(RedisError::ExecAborted(_))
    ));
}

#[tokio::test]
async fn test_pipeline() {
    let (server, mut conn) = connect();
    server.reply(Value::Int(1)).reply(Value::Int(1));

    let mut pipeline = Pipeline::new();
    let added = pipeline.sadd("s", &["a"]);
    let member = pipeline.sismember("s", "a");
    let mut results = conn.run_pipeline(&pipeline).await.unwrap();
    assert_eq!(results.take(added).unwrap(), 1);
    assert!(results.take(member).unwrap());
}

#[tokio::test]
async fn test_pipeline_error_reply_is_classified() {
    let (server, mut conn) = connect();
    server
        .reply(error("READONLY You can't write against a read only replica."))
        .reply(bulk("v"));

    let mut pipeline = Pipeline::new();
    let set = pipeline.set("k", "v");
    let get = pipeline.get("k");
    let mut results = conn.run_pipeline(&pipeline).await.unwrap();
    assert!(matches!(results.take(set), Err(RedisError::ReadOnly(_))));
    assert_eq!(results.take(get).unwrap(), Some(Bytes::from_static(b"v")));
}

#[tokio::test]
async fn test_exec_abort_reply_value() {
    let (server, mut conn) = connect();
    server
        .reply(Value::Okay)
        .reply(Value::SimpleString("QUEUED".to_string()))
        .reply(error("EXECABORT Transaction discarded because of previous errors."));

    let mut transaction = Transaction::new();
    transaction.incr("k");
    assert!(matches!(
        conn.exec(&transaction).await,
        Err(RedisError::ExecAborted(_))
    ));
}

#[tokio::test]
async fn test_sscan_stream() {
    let (server, mut conn) = connect();
    server
        .reply(array(vec![bulk("5"), array(vec![bulk("m1")])]))
        .reply(array(vec![bulk("0"), array(vec![bulk("m2"), bulk("m3")])]));

    let members: Vec<Bytes> = conn
        .sscan_stream("s", ScanOptions::new())
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(members.len(), 3);
    assert_eq!(server.sent()[1], ["SSCAN", "s", "5"]);
}

#[tokio::test]
async fn test_script_falls_back_to_eval() {
    let (server, mut conn) = connect();
    server
        .fail(redis::RedisError::from((
            redis::ErrorKind::NoScriptError,
            "No matching script",
        )))
        .reply(Value::Int(7));

    let script = RedisScript::new("return tonumber(ARGV[1])", ReturnType::Integer);
    let output = script
        .execute_async(&mut conn, &[] as &[&str], &["7"])
        .await
        .unwrap();
    assert_eq!(output, ScriptOutput::Integer(7));

    let sent = server.sent();
    assert_eq!(sent[0][..2], ["EVALSHA".to_string(), script.sha().to_string()]);
    assert_eq!(sent[1], ["EVAL", "return tonumber(ARGV[1])", "0", "7"]);
}

#[tokio::test]
async fn test_script_exists() {
    let (server, mut conn) = connect();
    server.reply(array(vec![Value::Int(1), Value::Int(0)]));
    assert_eq!(
        conn.script_exists(&["abc", "def"]).await.unwrap(),
        vec![true, false]
    );
}

#[tokio::test]
async fn test_factory_announces_the_client_name() {
    let (server, mut conn) = connect();
    server.reply(Value::Okay);

    let named = RedisConnectionFactory::new(
        ConnectionConfig::new("redis://localhost:6379").with_client_name("worker-1"),
    )
    .unwrap();
    named.announce_client_name(&mut conn).await.unwrap();
    let anonymous = RedisConnectionFactory::new(ConnectionConfig::default()).unwrap();
    anonymous.announce_client_name(&mut conn).await.unwrap();

    assert_eq!(server.sent(), vec![vec!["CLIENT", "SETNAME", "worker-1"]]);
}
