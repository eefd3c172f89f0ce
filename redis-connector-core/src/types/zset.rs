//! Sorted set types

use crate::error::{RedisError, RedisResult};
use bytes::Bytes;

/// A member of a sorted set together with its score
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    /// Member
    pub value: Bytes,
    /// Score
    pub score: f64,
}

impl Tuple {
    /// Create a new tuple
    pub fn new(value: impl AsRef<[u8]>, score: f64) -> Self {
        Self {
            value: Bytes::copy_from_slice(value.as_ref()),
            score,
        }
    }
}

/// Flags for `ZADD`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddArgs {
    nx: bool,
    xx: bool,
    gt: bool,
    lt: bool,
    ch: bool,
}

impl ZAddArgs {
    /// No flags
    pub const fn empty() -> Self {
        Self {
            nx: false,
            xx: false,
            gt: false,
            lt: false,
            ch: false,
        }
    }

    /// Only add new members (`NX`)
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.nx = true;
        self
    }

    /// Only update existing members (`XX`)
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.xx = true;
        self
    }

    /// Only update when the new score is greater (`GT`)
    #[must_use]
    pub const fn if_greater(mut self) -> Self {
        self.gt = true;
        self
    }

    /// Only update when the new score is less (`LT`)
    #[must_use]
    pub const fn if_less(mut self) -> Self {
        self.lt = true;
        self
    }

    /// Count changed members instead of added ones (`CH`)
    #[must_use]
    pub const fn changed(mut self) -> Self {
        self.ch = true;
        self
    }

    /// Flag keywords in server order
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.nx {
            flags.push("NX");
        }
        if self.xx {
            flags.push("XX");
        }
        if self.gt {
            flags.push("GT");
        }
        if self.lt {
            flags.push("LT");
        }
        if self.ch {
            flags.push("CH");
        }
        flags
    }

    /// Reject combinations the server refuses
    pub fn validate(&self) -> RedisResult<()> {
        if self.nx && self.xx {
            return Err(RedisError::InvalidArgument(
                "ZADD NX and XX are mutually exclusive".to_string(),
            ));
        }
        if self.nx && (self.gt || self.lt) {
            return Err(RedisError::InvalidArgument(
                "ZADD NX cannot be combined with GT or LT".to_string(),
            ));
        }
        if self.gt && self.lt {
            return Err(RedisError::InvalidArgument(
                "ZADD GT and LT are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How scores of the same member are combined by `ZUNION`/`ZINTER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum of scores
    Sum,
    /// Minimum score
    Min,
    /// Maximum score
    Max,
}

impl Aggregate {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Per-source score multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Explicit weights, one per source key
    pub fn of(weights: impl Into<Vec<f64>>) -> Self {
        Self(weights.into())
    }

    /// `count` sources all weighted by `weight`
    pub fn from_uniform(count: usize, weight: f64) -> Self {
        Self(vec![weight; count])
    }

    /// Multiply every weight by `factor`
    #[must_use]
    pub fn multiply(self, factor: f64) -> Self {
        Self(self.0.into_iter().map(|w| w * factor).collect())
    }

    /// Weights in order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of weights
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no weights
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zadd_validation() {
        assert!(ZAddArgs::empty().validate().is_ok());
        assert!(ZAddArgs::empty().if_exists().if_greater().changed().validate().is_ok());
        assert!(ZAddArgs::empty().if_not_exists().if_exists().validate().is_err());
        assert!(ZAddArgs::empty().if_not_exists().if_less().validate().is_err());
        assert!(ZAddArgs::empty().if_greater().if_less().validate().is_err());
    }

    #[test]
    fn test_zadd_keywords() {
        let args = ZAddArgs::empty().if_exists().if_greater().changed();
        assert_eq!(args.keywords(), vec!["XX", "GT", "CH"]);
    }

    #[test]
    fn test_weights() {
        let w = Weights::from_uniform(3, 2.0).multiply(1.5);
        assert_eq!(w.as_slice(), &[3.0, 3.0, 3.0]);
        assert_eq!(Weights::of([1.0, 2.0]).len(), 2);
    }
}
