//! Lua scripts addressed by digest
//!
//! A [`RedisScript`] carries its source and SHA1 digest. Executing it sends
//! `EVALSHA` first and only falls back to `EVAL` with the full source when
//! the server answers `NOSCRIPT`, which also loads the script for later
//! calls.
//!
//! ```no_run
//! use redis_connector::connection::BlockingConnection;
//! use redis_connector::types::{ReturnType, ScriptOutput};
//! use redis_connector::RedisScript;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = redis::Client::open("redis://127.0.0.1/")?;
//! let mut conn = BlockingConnection::new(client.get_connection()?);
//!
//! let script = RedisScript::new("return redis.call('INCRBY', KEYS[1], ARGV[1])", ReturnType::Integer);
//! let value = script.execute(&mut conn, &["counter"], &["5"])?;
//! assert!(matches!(value, ScriptOutput::Integer(_)));
//! # Ok(())
//! # }
//! ```

use crate::commands::EvalCommand;
use crate::connection::{AsyncConnection, BlockingConnection};
use redis_connector_core::error::{RedisError, RedisResult};
use redis_connector_core::types::{ReturnType, ScriptOutput};
use sha1::{Digest, Sha1};
use tracing::debug;

/// A Lua script with its digest and reply interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisScript {
    source: String,
    sha: String,
    return_type: ReturnType,
}

impl RedisScript {
    /// Create a script; the digest is computed once here
    pub fn new(source: impl Into<String>, return_type: ReturnType) -> Self {
        let source = source.into();
        let sha = calculate_sha1(&source);
        Self {
            source,
            sha,
            return_type,
        }
    }

    /// Hex SHA1 digest of the source
    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// Lua source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// How replies are interpreted
    pub const fn return_type(&self) -> ReturnType {
        self.return_type
    }

    /// `EVALSHA` invocation with `keys` and `args`
    pub fn invocation<K: AsRef<[u8]>, A: AsRef<[u8]>>(&self, keys: &[K], args: &[A]) -> EvalCommand {
        EvalCommand::eval_sha(&self.sha, self.return_type)
            .with_keys(keys)
            .with_args(args)
    }

    /// Run on a blocking connection
    pub fn execute<C, K, A>(
        &self,
        conn: &mut BlockingConnection<C>,
        keys: &[K],
        args: &[A],
    ) -> RedisResult<ScriptOutput>
    where
        C: redis::ConnectionLike,
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        let command = self.invocation(keys, args);
        let first = conn.send(&command);
        match first {
            Err(RedisError::NoScript(_)) => {
                debug!(sha = %self.sha, "script not cached, sending source");
                conn.send(&command.with_script(&self.source))
            }
            other => other,
        }
    }

    /// Run on an async connection
    ///
    /// On a cluster connection pass its
    /// [`native`](crate::cluster::ClusterConnection::native) connection so
    /// the script is routed by its keys.
    pub async fn execute_async<C, K, A>(
        &self,
        conn: &mut AsyncConnection<C>,
        keys: &[K],
        args: &[A],
    ) -> RedisResult<ScriptOutput>
    where
        C: redis::aio::ConnectionLike + Send,
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        let command = self.invocation(keys, args);
        let first = conn.send(&command).await;
        match first {
            Err(RedisError::NoScript(_)) => {
                debug!(sha = %self.sha, "script not cached, sending source");
                conn.send(&command.with_script(&self.source)).await
            }
            other => other,
        }
    }
}

fn calculate_sha1(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn test_sha1_calculation() {
        assert_eq!(
            calculate_sha1("hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_script_sha_consistency() {
        let first = RedisScript::new("return 1", ReturnType::Integer);
        assert_eq!(first.sha().len(), 40);
        assert_eq!(first.sha(), RedisScript::new("return 1", ReturnType::Integer).sha());
        assert_ne!(first.sha(), RedisScript::new("return 2", ReturnType::Integer).sha());
    }

    #[test]
    fn test_invocation_uses_digest() {
        let script = RedisScript::new("return KEYS[1]", ReturnType::Value);
        let command = script.invocation(&["k"], &["a", "b"]);
        assert_eq!(command.command_name(), "EVALSHA");
        assert_eq!(&command.args()[0][..], script.sha().as_bytes());
        assert_eq!(command.keys(), vec![&b"k"[..]]);
    }
}
