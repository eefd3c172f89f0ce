//! Scripted stand-in for a Redis server, usable as a blocking or async
//! redis-rs connection

#![allow(dead_code)]

use redis::{RedisFuture, RedisResult, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    sent: Vec<Vec<Vec<u8>>>,
    replies: VecDeque<RedisResult<Value>>,
    hang: bool,
}

/// Records every command it receives and answers with queued replies;
/// once the queue is empty it answers nil
#[derive(Clone, Default)]
pub struct MockRedis {
    state: Arc<Mutex<State>>,
}

impl MockRedis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next reply
    pub fn reply(&self, value: Value) -> &Self {
        self.state.lock().unwrap().replies.push_back(Ok(value));
        self
    }

    /// Queue a driver error as the next reply
    pub fn fail(&self, error: redis::RedisError) -> &Self {
        self.state.lock().unwrap().replies.push_back(Err(error));
        self
    }

    /// Never answer async requests
    pub fn hang(&self) {
        self.state.lock().unwrap().hang = true;
    }

    /// Commands received so far, arguments rendered lossily as text
    pub fn sent(&self) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|cmd| {
                cmd.iter()
                    .map(|arg| String::from_utf8_lossy(arg).into_owned())
                    .collect()
            })
            .collect()
    }

    /// Command names received so far
    pub fn names(&self) -> Vec<String> {
        self.sent().into_iter().map(|cmd| cmd[0].clone()).collect()
    }

    fn handle(&self, packed: &[u8]) -> RedisResult<Vec<Value>> {
        let commands = parse_commands(packed);
        let mut state = self.state.lock().unwrap();
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            state.sent.push(command);
            replies.push(state.replies.pop_front().unwrap_or(Ok(Value::Nil)));
        }
        replies.into_iter().collect()
    }

    fn handle_one(&self, packed: &[u8]) -> RedisResult<Value> {
        self.handle(packed)?
            .pop()
            .ok_or_else(|| redis::RedisError::from((redis::ErrorKind::ClientError, "empty request")))
    }

    fn handle_many(&self, packed: &[u8], offset: usize, count: usize) -> RedisResult<Vec<Value>> {
        Ok(self
            .handle(packed)?
            .into_iter()
            .skip(offset)
            .take(count)
            .collect())
    }

    fn hanging(&self) -> bool {
        self.state.lock().unwrap().hang
    }
}

impl redis::ConnectionLike for MockRedis {
    fn req_packed_command(&mut self, cmd: &[u8]) -> RedisResult<Value> {
        self.handle_one(cmd)
    }

    fn req_packed_commands(
        &mut self,
        cmd: &[u8],
        offset: usize,
        count: usize,
    ) -> RedisResult<Vec<Value>> {
        self.handle_many(cmd, offset, count)
    }

    fn get_db(&self) -> i64 {
        0
    }

    fn check_connection(&mut self) -> bool {
        true
    }

    fn is_open(&self) -> bool {
        true
    }
}

impl redis::aio::ConnectionLike for MockRedis {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a redis::Cmd) -> RedisFuture<'a, Value> {
        if self.hanging() {
            return Box::pin(std::future::pending());
        }
        let reply = self.handle_one(&cmd.get_packed_command());
        Box::pin(async move { reply })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a redis::Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        if self.hanging() {
            return Box::pin(std::future::pending());
        }
        let replies = self.handle_many(&cmd.get_packed_pipeline(), offset, count);
        Box::pin(async move { replies })
    }

    fn get_db(&self) -> i64 {
        0
    }
}

/// Split packed RESP requests into their arguments
fn parse_commands(mut packed: &[u8]) -> Vec<Vec<Vec<u8>>> {
    let mut commands = Vec::new();
    while !packed.is_empty() {
        let (count, rest) = read_header(packed, b'*');
        packed = rest;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let (len, rest) = read_header(packed, b'$');
            args.push(rest[..len].to_vec());
            packed = &rest[len + 2..];
        }
        commands.push(args);
    }
    commands
}

fn read_header(buf: &[u8], marker: u8) -> (usize, &[u8]) {
    assert_eq!(buf[0], marker, "unexpected request framing");
    let end = buf.windows(2).position(|w| w == b"\r\n").unwrap();
    let n = std::str::from_utf8(&buf[1..end]).unwrap().parse().unwrap();
    (n, &buf[end + 2..])
}

pub fn bulk(s: &str) -> Value {
    Value::BulkString(s.as_bytes().to_vec())
}

pub fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

/// An error reply as the driver decodes it inside pipeline and EXEC results
pub fn error(line: &str) -> Value {
    redis::parse_redis_value(format!("-{line}\r\n").as_bytes()).unwrap()
}

/// Install a test subscriber so `tracing` output shows up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
