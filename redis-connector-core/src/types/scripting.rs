//! Lua scripting types

use crate::value::RespValue;
use bytes::Bytes;

/// How the reply of a script is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    /// Integer reply 1/0 or nil as boolean
    Boolean,
    /// Integer reply
    Integer,
    /// Array reply
    Multi,
    /// Status reply
    Status,
    /// Bulk reply
    #[default]
    Value,
}

/// Decoded script reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutput {
    /// From [`ReturnType::Boolean`]
    Boolean(bool),
    /// From [`ReturnType::Integer`]
    Integer(i64),
    /// From [`ReturnType::Multi`]
    Multi(Vec<RespValue>),
    /// From [`ReturnType::Status`]
    Status(String),
    /// From [`ReturnType::Value`]
    Value(Option<Bytes>),
}

impl ScriptOutput {
    /// Boolean result, if this is one
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer result, if this is one
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}
