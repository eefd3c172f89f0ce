//! Key level types: data types, encodings, sorting and list positions

use crate::types::range::Limit;
use bytes::Bytes;

/// Type of the value stored at a key, as reported by `TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Key does not exist
    None,
    /// String value
    String,
    /// List value
    List,
    /// Set value
    Set,
    /// Sorted set value
    ZSet,
    /// Hash value
    Hash,
    /// Stream value
    Stream,
}

impl DataType {
    /// The code Redis uses for this type
    pub const fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::String => "string",
            Self::List => "list",
            Self::Set => "set",
            Self::ZSet => "zset",
            Self::Hash => "hash",
            Self::Stream => "stream",
        }
    }

    /// Parse a type code; unknown codes yield `None`
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "string" => Self::String,
            "list" => Self::List,
            "set" => Self::Set,
            "zset" => Self::ZSet,
            "hash" => Self::Hash,
            "stream" => Self::Stream,
            _ => return None,
        })
    }
}

/// Internal encoding reported by `OBJECT ENCODING`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueEncoding {
    /// Key does not exist
    Vacant,
    /// Raw string
    Raw,
    /// Integer stored as string
    Int,
    /// Embedded string
    Embstr,
    /// Hash table
    Hashtable,
    /// Compact list pack (Redis 7+)
    Listpack,
    /// Ziplist (before Redis 7)
    Ziplist,
    /// Quicklist
    Quicklist,
    /// Linked list (legacy)
    Linkedlist,
    /// Integer set
    Intset,
    /// Skip list
    Skiplist,
    /// Stream
    Stream,
    /// Encoding this crate does not know about
    Other(String),
}

impl ValueEncoding {
    /// Parse an encoding name
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "raw" => Self::Raw,
            "int" => Self::Int,
            "embstr" => Self::Embstr,
            "hashtable" => Self::Hashtable,
            "listpack" => Self::Listpack,
            "ziplist" => Self::Ziplist,
            "quicklist" => Self::Quicklist,
            "linkedlist" => Self::Linkedlist,
            "intset" => Self::Intset,
            "skiplist" => Self::Skiplist,
            "stream" => Self::Stream,
            _ => Self::Other(name.to_string()),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending (`ASC`)
    Asc,
    /// Descending (`DESC`)
    Desc,
}

/// Parameters of the `SORT` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortParameters {
    /// `BY` pattern
    pub by_pattern: Option<Bytes>,
    /// `LIMIT offset count`
    pub limit: Option<Limit>,
    /// `GET` patterns, in order
    pub get_patterns: Vec<Bytes>,
    /// `ASC` / `DESC`
    pub order: Option<SortOrder>,
    /// `ALPHA`
    pub alphabetic: bool,
}

impl SortParameters {
    /// Parameters without any option
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by the values of external keys
    #[must_use]
    pub fn by(mut self, pattern: impl AsRef<[u8]>) -> Self {
        self.by_pattern = Some(Bytes::copy_from_slice(pattern.as_ref()));
        self
    }

    /// Restrict the returned range
    #[must_use]
    pub const fn limit(mut self, offset: i64, count: i64) -> Self {
        self.limit = Some(Limit::new(offset, count));
        self
    }

    /// Fetch external keys instead of the sorted elements
    #[must_use]
    pub fn get(mut self, pattern: impl AsRef<[u8]>) -> Self {
        self.get_patterns
            .push(Bytes::copy_from_slice(pattern.as_ref()));
        self
    }

    /// Sort ascending
    #[must_use]
    pub const fn asc(mut self) -> Self {
        self.order = Some(SortOrder::Asc);
        self
    }

    /// Sort descending
    #[must_use]
    pub const fn desc(mut self) -> Self {
        self.order = Some(SortOrder::Desc);
        self
    }

    /// Compare lexicographically instead of numerically
    #[must_use]
    pub const fn alpha(mut self) -> Self {
        self.alphabetic = true;
        self
    }
}

/// Bitwise operation for `BITOP`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOperation {
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Bitwise XOR
    Xor,
    /// Bitwise NOT; takes exactly one source key
    Not,
}

impl BitOperation {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
        }
    }
}

/// Insert position for `LINSERT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPosition {
    /// Before the pivot
    Before,
    /// After the pivot
    After,
}

/// End of a list for `LMOVE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDirection {
    /// Head of the list
    Left,
    /// Tail of the list
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_codes() {
        for ty in [
            DataType::None,
            DataType::String,
            DataType::List,
            DataType::Set,
            DataType::ZSet,
            DataType::Hash,
            DataType::Stream,
        ] {
            assert_eq!(DataType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(DataType::from_code("ZSET"), Some(DataType::ZSet));
        assert_eq!(DataType::from_code("ReJSON-RL"), None);
    }

    #[test]
    fn test_value_encoding() {
        assert_eq!(ValueEncoding::from_name("listpack"), ValueEncoding::Listpack);
        assert_eq!(
            ValueEncoding::from_name("custom"),
            ValueEncoding::Other("custom".to_string())
        );
    }
}
