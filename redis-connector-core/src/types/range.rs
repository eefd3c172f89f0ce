//! Ranges and limits for score, lexicographic and index queries

use std::ops::Bound;

/// A range with independently bounded ends
///
/// Used for sorted set score ranges (`f64`), lexicographic ranges (`Bytes`)
/// and bit positions (`i64`).
#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    /// Lower end
    pub lower: Bound<T>,
    /// Upper end
    pub upper: Bound<T>,
}

impl<T> Range<T> {
    /// Range with explicit bounds
    pub const fn new(lower: Bound<T>, upper: Bound<T>) -> Self {
        Self { lower, upper }
    }

    /// Range covering everything
    pub const fn unbounded() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[lower, upper]`
    pub const fn closed(lower: T, upper: T) -> Self {
        Self::new(Bound::Included(lower), Bound::Included(upper))
    }

    /// `(lower, upper)`
    pub const fn open(lower: T, upper: T) -> Self {
        Self::new(Bound::Excluded(lower), Bound::Excluded(upper))
    }

    /// `(lower, upper]`
    pub const fn left_open(lower: T, upper: T) -> Self {
        Self::new(Bound::Excluded(lower), Bound::Included(upper))
    }

    /// `[lower, upper)`
    pub const fn right_open(lower: T, upper: T) -> Self {
        Self::new(Bound::Included(lower), Bound::Excluded(upper))
    }

    /// `[lower, +inf)`
    pub const fn at_least(lower: T) -> Self {
        Self::new(Bound::Included(lower), Bound::Unbounded)
    }

    /// `(-inf, upper]`
    pub const fn at_most(upper: T) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(upper))
    }

    /// `(lower, +inf)`
    pub const fn greater_than(lower: T) -> Self {
        Self::new(Bound::Excluded(lower), Bound::Unbounded)
    }

    /// `(-inf, upper)`
    pub const fn less_than(upper: T) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(upper))
    }

    /// Value of the lower bound, ignoring inclusiveness
    pub fn lower_value(&self) -> Option<&T> {
        bound_value(&self.lower)
    }

    /// Value of the upper bound, ignoring inclusiveness
    pub fn upper_value(&self) -> Option<&T> {
        bound_value(&self.upper)
    }
}

impl<T> Default for Range<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

fn bound_value<T>(bound: &Bound<T>) -> Option<&T> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// `LIMIT offset count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Number of elements to skip
    pub offset: i64,
    /// Number of elements to return; negative means all
    pub count: i64,
}

impl Limit {
    /// Limit with the given offset and count
    pub const fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }

    /// No limit at all; nothing is sent to the server
    pub const fn unlimited() -> Self {
        Self {
            offset: 0,
            count: -1,
        }
    }

    /// Whether the limit restricts anything
    pub const fn is_unlimited(&self) -> bool {
        self.count < 0 && self.offset == 0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_constructors() {
        let r = Range::left_open(1.0, 2.0);
        assert_eq!(r.lower, Bound::Excluded(1.0));
        assert_eq!(r.upper, Bound::Included(2.0));
        assert_eq!(r.lower_value(), Some(&1.0));

        let all: Range<i64> = Range::default();
        assert!(all.lower_value().is_none());
        assert!(all.upper_value().is_none());
    }

    #[test]
    fn test_limit() {
        assert!(Limit::unlimited().is_unlimited());
        assert!(!Limit::new(0, 10).is_unlimited());
        assert!(!Limit::new(5, -1).is_unlimited());
    }
}
