//! Driver-neutral reply value
//!
//! Every driver reply is normalised into the RESP2 shape before decoding:
//! RESP3 maps flatten into alternating key/value arrays, sets become arrays,
//! doubles become bulk strings and booleans become integers.

use crate::error::{RedisError, RedisResult};
use bytes::Bytes;

/// Normalised reply value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple string: +OK\r\n
    SimpleString(String),
    /// Error: -ERR message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n
    BulkString(Bytes),
    /// Null bulk string or null array
    Null,
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// The `+OK` status reply
    #[must_use]
    pub fn ok() -> Self {
        Self::SimpleString("OK".to_string())
    }

    /// Convert to a string if possible
    pub fn as_string(&self) -> RedisResult<String> {
        match self {
            Self::SimpleString(s) => Ok(s.clone()),
            Self::BulkString(b) => String::from_utf8(b.to_vec())
                .map_err(|e| RedisError::Type(format!("Invalid UTF-8: {e}"))),
            Self::Integer(i) => Ok(i.to_string()),
            Self::Null => Err(RedisError::Type("Value is null".to_string())),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to string"
            ))),
        }
    }

    /// Convert to an integer if possible
    pub fn as_int(&self) -> RedisResult<i64> {
        match self {
            Self::Integer(i) => Ok(*i),
            Self::BulkString(_) | Self::SimpleString(_) => {
                let s = self.as_string()?;
                s.parse::<i64>()
                    .map_err(|e| RedisError::Type(format!("Cannot parse integer: {e}")))
            }
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to integer"
            ))),
        }
    }

    /// Convert to a float if possible; accepts `inf`, `+inf` and `-inf`
    pub fn as_float(&self) -> RedisResult<f64> {
        match self {
            Self::Integer(i) => Ok(*i as f64),
            Self::BulkString(_) | Self::SimpleString(_) => {
                let s = self.as_string()?;
                s.trim()
                    .parse::<f64>()
                    .map_err(|e| RedisError::Type(format!("Cannot parse float '{s}': {e}")))
            }
            _ => Err(RedisError::Type(format!("Cannot convert {self:?} to float"))),
        }
    }

    /// Convert to bytes if possible
    pub fn as_bytes(&self) -> RedisResult<Bytes> {
        match self {
            Self::BulkString(b) => Ok(b.clone()),
            Self::SimpleString(s) => Ok(Bytes::from(s.as_bytes().to_vec())),
            Self::Integer(i) => Ok(Bytes::from(i.to_string())),
            Self::Null => Err(RedisError::Type("Value is null".to_string())),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to bytes"
            ))),
        }
    }

    /// Convert to an array if possible
    pub fn as_array(&self) -> RedisResult<Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr.clone()),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to array"
            ))),
        }
    }

    /// Take the elements of an array; a null reply is an empty array
    pub fn into_array(self) -> RedisResult<Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            Self::Null => Ok(Vec::new()),
            other => Err(RedisError::Type(format!(
                "Cannot convert {other:?} to array"
            ))),
        }
    }

    /// Check if this is a null value
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is the `OK` status reply
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::SimpleString(s) if s == "OK")
    }

    /// Check if this is an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Extract error message if this is an error
    #[must_use]
    pub fn into_error(self) -> Option<String> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        Self::BulkString(Bytes::from(s.into_bytes()))
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        Self::BulkString(Bytes::from(s.as_bytes().to_vec()))
    }
}

impl From<i64> for RespValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<Vec<u8>> for RespValue {
    fn from(b: Vec<u8>) -> Self {
        Self::BulkString(Bytes::from(b))
    }
}

impl From<Bytes> for RespValue {
    fn from(b: Bytes) -> Self {
        Self::BulkString(b)
    }
}

impl From<Vec<Self>> for RespValue {
    fn from(arr: Vec<Self>) -> Self {
        Self::Array(arr)
    }
}

impl TryFrom<RespValue> for String {
    type Error = RedisError;

    fn try_from(value: RespValue) -> Result<Self, Self::Error> {
        value.as_string()
    }
}

impl TryFrom<RespValue> for i64 {
    type Error = RedisError;

    fn try_from(value: RespValue) -> Result<Self, Self::Error> {
        value.as_int()
    }
}

impl TryFrom<RespValue> for bool {
    type Error = RedisError;

    fn try_from(value: RespValue) -> Result<Self, Self::Error> {
        match value {
            RespValue::Integer(1) => Ok(true),
            RespValue::Integer(0) | RespValue::Null => Ok(false),
            RespValue::SimpleString(ref s) if s == "OK" => Ok(true),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {:?} to bool",
                value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_float_handles_infinity() {
        assert_eq!(RespValue::from("+inf").as_float().unwrap(), f64::INFINITY);
        assert_eq!(
            RespValue::from("-inf").as_float().unwrap(),
            f64::NEG_INFINITY
        );
        assert_eq!(RespValue::from("1.5").as_float().unwrap(), 1.5);
        assert_eq!(RespValue::Integer(3).as_float().unwrap(), 3.0);
        assert!(RespValue::Null.as_float().is_err());
    }

    #[test]
    fn test_into_array_null_is_empty() {
        assert!(RespValue::Null.into_array().unwrap().is_empty());
        assert!(RespValue::Integer(1).into_array().is_err());
    }

    #[test]
    fn test_bool_conversion() {
        assert!(bool::try_from(RespValue::Integer(1)).unwrap());
        assert!(!bool::try_from(RespValue::Null).unwrap());
        assert!(bool::try_from(RespValue::ok()).unwrap());
        assert!(bool::try_from(RespValue::from("x")).is_err());
    }
}
