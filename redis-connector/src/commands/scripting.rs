//! Lua scripting commands

use super::{Command, CommandExecutor, Request};
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{ReturnType, ScriptOutput};
use redis_connector_core::value::RespValue;

/// `EVAL` or `EVALSHA` with keys, arguments and a reply interpretation
#[derive(Debug, Clone)]
pub struct EvalCommand {
    by_sha: bool,
    script: Bytes,
    keys: Vec<Bytes>,
    args: Vec<Bytes>,
    return_type: ReturnType,
}

impl EvalCommand {
    /// `EVAL script numkeys ...`
    pub fn eval(script: impl AsRef<[u8]>, return_type: ReturnType) -> Self {
        Self {
            by_sha: false,
            script: Bytes::copy_from_slice(script.as_ref()),
            keys: Vec::new(),
            args: Vec::new(),
            return_type,
        }
    }

    /// `EVALSHA sha1 numkeys ...`
    pub fn eval_sha(sha1: impl AsRef<[u8]>, return_type: ReturnType) -> Self {
        Self {
            by_sha: true,
            ..Self::eval(sha1, return_type)
        }
    }

    /// Append a key
    #[must_use]
    pub fn key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.keys.push(Bytes::copy_from_slice(key.as_ref()));
        self
    }

    /// Append keys
    #[must_use]
    pub fn with_keys<K: AsRef<[u8]>>(mut self, keys: &[K]) -> Self {
        self.keys
            .extend(keys.iter().map(|k| Bytes::copy_from_slice(k.as_ref())));
        self
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Append arguments
    #[must_use]
    pub fn with_args<A: AsRef<[u8]>>(mut self, args: &[A]) -> Self {
        self.args
            .extend(args.iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// The same invocation by body instead of digest
    #[must_use]
    pub fn with_script(mut self, script: impl AsRef<[u8]>) -> Self {
        self.by_sha = false;
        self.script = Bytes::copy_from_slice(script.as_ref());
        self
    }

    /// Whether this runs by digest
    pub const fn is_by_sha(&self) -> bool {
        self.by_sha
    }
}

impl Command for EvalCommand {
    type Output = ScriptOutput;

    fn command_name(&self) -> &str {
        if self.by_sha {
            "EVALSHA"
        } else {
            "EVAL"
        }
    }

    fn args(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(2 + self.keys.len() + self.args.len());
        args.push(self.script.clone());
        args.push(Bytes::from(self.keys.len().to_string()));
        args.extend(self.keys.iter().cloned());
        args.extend(self.args.iter().cloned());
        args
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        reply::script_output(response, self.return_type)
    }

    fn keys(&self) -> Vec<&[u8]> {
        self.keys.iter().map(|k| &k[..]).collect()
    }
}

/// Server side scripting
pub trait ScriptingCommands: CommandExecutor {
    /// `EVAL script numkeys key [key ...] arg [arg ...]`
    fn eval<S, K, A>(
        &mut self,
        script: S,
        return_type: ReturnType,
        keys: &[K],
        args: &[A],
    ) -> Self::Reply<'_, ScriptOutput>
    where
        S: AsRef<[u8]>,
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        self.execute(EvalCommand::eval(script, return_type).with_keys(keys).with_args(args))
    }

    /// `EVALSHA sha1 numkeys key [key ...] arg [arg ...]`
    fn eval_sha<S, K, A>(
        &mut self,
        sha1: S,
        return_type: ReturnType,
        keys: &[K],
        args: &[A],
    ) -> Self::Reply<'_, ScriptOutput>
    where
        S: AsRef<[u8]>,
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        self.execute(EvalCommand::eval_sha(sha1, return_type).with_keys(keys).with_args(args))
    }

    /// `SCRIPT LOAD script`, the digest
    fn script_load<S: AsRef<[u8]>>(&mut self, script: S) -> Self::Reply<'_, String> {
        self.execute(Request::new("SCRIPT LOAD", reply::status).arg(script))
    }

    /// `SCRIPT EXISTS sha1 [sha1 ...]`
    fn script_exists<S: AsRef<[u8]>>(&mut self, digests: &[S]) -> Self::Reply<'_, Vec<bool>> {
        self.execute(Request::new("SCRIPT EXISTS", reply::booleans).multi_arg(digests))
    }

    /// `SCRIPT FLUSH`
    fn script_flush(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("SCRIPT FLUSH", reply::ok))
    }

    /// `SCRIPT KILL`
    fn script_kill(&mut self) -> Self::Reply<'_, ()> {
        self.execute(Request::new("SCRIPT KILL", reply::ok))
    }
}

impl<T: CommandExecutor> ScriptingCommands for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_layout() {
        let command = EvalCommand::eval("return 1", ReturnType::Integer)
            .key("k1")
            .key("k2")
            .arg("a");
        assert_eq!(command.command_name(), "EVAL");
        let args: Vec<_> = command.args().iter().map(|a| a.to_vec()).collect();
        assert_eq!(
            args,
            vec![b"return 1".to_vec(), b"2".to_vec(), b"k1".to_vec(), b"k2".to_vec(), b"a".to_vec()]
        );
        assert_eq!(command.keys(), vec![&b"k1"[..], &b"k2"[..]]);
    }

    #[test]
    fn test_with_script_switches_to_eval() {
        let command = EvalCommand::eval_sha("abc", ReturnType::Value).with_script("return nil");
        assert!(!command.is_by_sha());
        assert_eq!(command.command_name(), "EVAL");
        assert_eq!(
            command.parse_response(RespValue::Null).unwrap(),
            ScriptOutput::Value(None)
        );
    }
}
