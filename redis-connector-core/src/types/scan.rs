//! Cursor based iteration options

use crate::types::keys::DataType;
use bytes::Bytes;

/// Options for `SCAN`, `HSCAN`, `SSCAN` and `ZSCAN`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// `MATCH` pattern
    pub pattern: Option<Bytes>,
    /// `COUNT` hint
    pub count: Option<u64>,
    /// `TYPE` filter, only honoured by `SCAN`
    pub data_type: Option<DataType>,
}

impl ScanOptions {
    /// Options without any restriction
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return elements matching the glob-style pattern
    #[must_use]
    pub fn pattern(mut self, pattern: impl AsRef<[u8]>) -> Self {
        self.pattern = Some(Bytes::copy_from_slice(pattern.as_ref()));
        self
    }

    /// Hint how many elements the server should inspect per call
    #[must_use]
    pub const fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Only return keys of the given type
    #[must_use]
    pub const fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Whether no option is set
    pub const fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.count.is_none() && self.data_type.is_none()
    }
}

/// One page returned by a scan call
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage<T> {
    /// Cursor to pass to the next call; `0` once iteration is complete
    pub cursor: u64,
    /// Elements of this page
    pub items: Vec<T>,
}

impl<T> ScanPage<T> {
    /// Whether the server reported the end of the iteration
    pub const fn is_finished(&self) -> bool {
        self.cursor == 0
    }
}
