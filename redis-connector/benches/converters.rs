//! Converter throughput: building driver commands and decoding replies

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use redis_connector::cluster::calculate_slot;
use redis_connector::commands::Request;
use redis_connector::convert::{from_redis_value, reply, to_redis_cmd};
use redis_connector::types::ScanOptions;
use redis_connector::RespValue;

fn bench_command_building(c: &mut Criterion) {
    c.bench_function("to_redis_cmd_get", |b| {
        b.iter(|| {
            let request = Request::new("GET", reply::optional_bytes).key(black_box("user:1000"));
            black_box(to_redis_cmd(&request).get_packed_command());
        });
    });

    let keys: Vec<String> = (0..100).map(|i| format!("key:{i}")).collect();
    c.bench_function("to_redis_cmd_mget_100", |b| {
        b.iter(|| {
            let request = Request::new("MGET", reply::optional_bytes_list).multi_key(black_box(&keys[..]));
            black_box(to_redis_cmd(&request).get_packed_command());
        });
    });

    c.bench_function("to_redis_cmd_scan_options", |b| {
        let options = ScanOptions::new().pattern("user:*").count(100);
        b.iter(|| {
            let request = Request::new("SCAN", reply::scan_bytes)
                .num(black_box(42u64))
                .with(&options);
            black_box(to_redis_cmd(&request));
        });
    });
}

fn bench_reply_decoding(c: &mut Criterion) {
    let bulk = redis::Value::BulkString(b"hello world".to_vec());
    c.bench_function("decode_bulk_string", |b| {
        b.iter(|| black_box(reply::optional_bytes(from_redis_value(black_box(bulk.clone())))));
    });

    let array = redis::Value::Array(
        (0..100)
            .map(|i| redis::Value::BulkString(format!("value:{i}").into_bytes()))
            .collect(),
    );
    c.bench_function("decode_array_100", |b| {
        b.iter(|| black_box(reply::optional_bytes_list(from_redis_value(black_box(array.clone())))));
    });

    let hash = RespValue::Array(
        (0..50)
            .flat_map(|i| {
                [
                    RespValue::BulkString(Bytes::from(format!("field:{i}"))),
                    RespValue::BulkString(Bytes::from(format!("value:{i}"))),
                ]
            })
            .collect(),
    );
    c.bench_function("decode_hash_50", |b| {
        b.iter(|| black_box(reply::bytes_map(black_box(hash.clone()))));
    });

    let scored = RespValue::Array(
        (0..50)
            .flat_map(|i| {
                [
                    RespValue::BulkString(Bytes::from(format!("member:{i}"))),
                    RespValue::BulkString(Bytes::from(format!("{i}.5"))),
                ]
            })
            .collect(),
    );
    c.bench_function("decode_tuples_50", |b| {
        b.iter(|| black_box(reply::tuples(black_box(scored.clone()))));
    });

    let info = "# Server\r\nredis_version:7.2.4\r\nredis_mode:standalone\r\nos:Linux\r\n\
                # Clients\r\nconnected_clients:12\r\nblocked_clients:0\r\n"
        .repeat(10);
    c.bench_function("parse_info", |b| {
        b.iter(|| black_box(reply::parse_info(black_box(&info))));
    });
}

fn bench_slot_calculation(c: &mut Criterion) {
    c.bench_function("calculate_slot", |b| {
        b.iter(|| black_box(calculate_slot(black_box(b"user:1000:profile"))));
    });

    c.bench_function("calculate_slot_hash_tag", |b| {
        b.iter(|| black_box(calculate_slot(black_box(b"{user:1000}:profile"))));
    });
}

criterion_group!(
    benches,
    bench_command_building,
    bench_reply_decoding,
    bench_slot_calculation
);
criterion_main!(benches);
