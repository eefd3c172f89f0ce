//! Tests against a running Redis server
//!
//! Run with `cargo test -- --ignored`; the server is taken from `REDIS_URL`
//! and defaults to `redis://127.0.0.1:6379`.

mod common;

use bytes::Bytes;
use futures_util::StreamExt;
use redis_connector::commands::{
    ConnectionCommands, GeoCommands, HashCommands, KeyCommands, PubSubCommands, StringCommands,
    ZSetCommands,
};
use redis_connector::connection::{Pipeline, Transaction};
use redis_connector::types::{Metric, Point, ReturnType, ScanOptions, ScriptOutput};
use redis_connector::{ConnectionConfig, RedisConnectionFactory, RedisError, RedisScript};
use std::time::Duration;

fn factory() -> RedisConnectionFactory {
    common::init_tracing();
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    RedisConnectionFactory::new(
        ConnectionConfig::new(url)
            .with_client_name("redis-connector-tests")
            .with_operation_timeout(Duration::from_secs(5)),
    )
    .expect("valid configuration")
}

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("redis-connector:{prefix}:{nanos}")
}

#[test]
#[ignore = "needs a running Redis server"]
fn test_blocking_strings_and_hashes() {
    let mut conn = factory().get_connection().unwrap();
    let key = unique("blocking");
    let hash = unique("hash");

    conn.set(&key, "1").unwrap();
    assert_eq!(conn.incr_by(&key, 41).unwrap(), 42);
    conn.hset(&hash, "field", "value").unwrap();
    assert_eq!(conn.hgetall(&hash).unwrap().len(), 1);
    assert_eq!(conn.del(&[&key, &hash]).unwrap(), 2);
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_async_round_trip() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let key = unique("async");

    assert_eq!(conn.ping().await.unwrap(), "PONG");
    conn.set(&key, "value").await.unwrap();
    assert_eq!(conn.get(&key).await.unwrap(), Some(Bytes::from("value")));
    assert!(conn
        .expire(&key, Duration::from_secs(60), Default::default())
        .await
        .unwrap());
    assert!(conn.ttl(&key).await.unwrap() > 0);
    conn.del(&[&key]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_wrong_type_is_classified() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let key = unique("wrongtype");

    conn.hset(&key, "f", "v").await.unwrap();
    assert!(matches!(conn.incr(&key).await, Err(RedisError::Type(_))));
    conn.del(&[&key]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_pipeline_and_transaction() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let key = unique("batch");

    let mut pipeline = Pipeline::new();
    pipeline.set(&key, "10");
    let incremented = pipeline.incr(&key);
    let mut results = conn.run_pipeline(&pipeline).await.unwrap();
    assert_eq!(results.take(incremented).unwrap(), 11);

    let mut transaction = Transaction::new();
    let doubled = transaction.incr_by(&key, 11);
    let removed = transaction.del(&[&key]);
    let mut results = conn.exec(&transaction).await.unwrap().unwrap();
    assert_eq!(results.take(doubled).unwrap(), 22);
    assert_eq!(results.take(removed).unwrap(), 1);
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_sorted_sets_and_geo() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let zset = unique("zset");
    let geo = unique("geo");

    conn.zadd(&zset, 2.0, "b").await.unwrap();
    conn.zadd(&zset, 1.0, "a").await.unwrap();
    let tuples = conn.zrange_with_scores(&zset, 0, -1).await.unwrap();
    assert_eq!(tuples.len(), 2);

    conn.geo_add(&geo, Point::new(13.361_389, 38.115_556), "Palermo")
        .await
        .unwrap();
    conn.geo_add(&geo, Point::new(15.087_269, 37.502_669), "Catania")
        .await
        .unwrap();
    let distance = conn
        .geo_dist(&geo, "Palermo", "Catania", Metric::Kilometers)
        .await
        .unwrap()
        .unwrap();
    assert!((distance.value - 166.274).abs() < 0.01);

    conn.del(&[&zset, &geo]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_scan_stream() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let prefix = unique("scan");
    let keys: Vec<String> = (0..25).map(|i| format!("{prefix}:{i}")).collect();
    for key in &keys {
        conn.set(key, "x").await.unwrap();
    }

    let found: Vec<Bytes> = conn
        .scan_stream(ScanOptions::new().pattern(format!("{prefix}:*")).count(5))
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(found.len(), keys.len());
    conn.del(keys.as_slice()).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_script_is_loaded_on_demand() {
    let mut conn = factory().get_async_connection().await.unwrap();
    let script = RedisScript::new(
        "return redis.call('INCRBY', KEYS[1], ARGV[1])",
        ReturnType::Integer,
    );
    let key = unique("script");

    let first = script.execute_async(&mut conn, &[&key], &["2"]).await.unwrap();
    let second = script.execute_async(&mut conn, &[&key], &["3"]).await.unwrap();
    assert_eq!(first, ScriptOutput::Integer(2));
    assert_eq!(second, ScriptOutput::Integer(5));
    conn.del(&[&key]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running Redis server"]
async fn test_publish_and_receive() {
    let factory = factory();
    let channel = unique("channel");
    let mut subscription = factory.get_async_subscription().await.unwrap();
    subscription.subscribe(&[&channel]).await.unwrap();
    assert_eq!(subscription.channels().len(), 1);

    let mut publisher = factory.get_async_connection().await.unwrap();
    assert_eq!(publisher.publish(&channel, "hello").await.unwrap(), 1);

    let mut messages = Box::pin(subscription.messages());
    let message = tokio::time::timeout(Duration::from_secs(5), messages.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.channel, Bytes::from(channel));
    assert_eq!(message.body_str(), Some("hello"));
}
