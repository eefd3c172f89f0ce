//! `BITFIELD` sub-commands

use crate::error::{RedisError, RedisResult};

/// Integer type of a bitfield: signed up to 64 bits, unsigned up to 63 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitFieldType {
    signed: bool,
    bits: u8,
}

impl BitFieldType {
    /// 8 bit signed integer
    pub const INT_8: Self = Self::new_unchecked(true, 8);
    /// 16 bit signed integer
    pub const INT_16: Self = Self::new_unchecked(true, 16);
    /// 32 bit signed integer
    pub const INT_32: Self = Self::new_unchecked(true, 32);
    /// 64 bit signed integer
    pub const INT_64: Self = Self::new_unchecked(true, 64);
    /// 8 bit unsigned integer
    pub const UINT_8: Self = Self::new_unchecked(false, 8);
    /// 16 bit unsigned integer
    pub const UINT_16: Self = Self::new_unchecked(false, 16);
    /// 32 bit unsigned integer
    pub const UINT_32: Self = Self::new_unchecked(false, 32);

    const fn new_unchecked(signed: bool, bits: u8) -> Self {
        Self { signed, bits }
    }

    /// Signed integer of `bits` bits (1..=64)
    pub fn signed(bits: u8) -> RedisResult<Self> {
        if (1..=64).contains(&bits) {
            Ok(Self::new_unchecked(true, bits))
        } else {
            Err(RedisError::InvalidArgument(format!(
                "Signed bitfield width must be between 1 and 64, got {bits}"
            )))
        }
    }

    /// Unsigned integer of `bits` bits (1..=63)
    pub fn unsigned(bits: u8) -> RedisResult<Self> {
        if (1..=63).contains(&bits) {
            Ok(Self::new_unchecked(false, bits))
        } else {
            Err(RedisError::InvalidArgument(format!(
                "Unsigned bitfield width must be between 1 and 63, got {bits}"
            )))
        }
    }

    /// Whether the type is signed
    pub const fn is_signed(&self) -> bool {
        self.signed
    }

    /// Width in bits
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Encoding understood by the server, e.g. `i8` or `u4`
    pub fn encoding(&self) -> String {
        format!("{}{}", if self.signed { 'i' } else { 'u' }, self.bits)
    }
}

/// Bit offset inside the string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    value: u64,
    type_relative: bool,
}

impl Offset {
    /// Absolute bit offset
    pub const fn bits(value: u64) -> Self {
        Self {
            value,
            type_relative: false,
        }
    }

    /// Offset multiplied by the width of the field type (`#n`)
    pub const fn type_relative(value: u64) -> Self {
        Self {
            value,
            type_relative: true,
        }
    }

    /// Offset value
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Whether the offset is multiplied by the type width
    pub const fn is_type_relative(&self) -> bool {
        self.type_relative
    }

    /// Encoding understood by the server
    pub fn encoding(&self) -> String {
        if self.type_relative {
            format!("#{}", self.value)
        } else {
            self.value.to_string()
        }
    }
}

/// Overflow behaviour for `INCRBY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Wrap around (default)
    Wrap,
    /// Saturate at the minimum or maximum value
    Sat,
    /// Refuse the operation and reply nil
    Fail,
}

impl Overflow {
    /// Keyword sent to the server
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Wrap => "WRAP",
            Self::Sat => "SAT",
            Self::Fail => "FAIL",
        }
    }
}

/// A single `BITFIELD` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitFieldSubCommand {
    /// `GET type offset`
    Get {
        /// Field type
        field: BitFieldType,
        /// Field offset
        offset: Offset,
    },
    /// `SET type offset value`
    Set {
        /// Field type
        field: BitFieldType,
        /// Field offset
        offset: Offset,
        /// New value
        value: i64,
    },
    /// `[OVERFLOW mode] INCRBY type offset increment`
    IncrBy {
        /// Field type
        field: BitFieldType,
        /// Field offset
        offset: Offset,
        /// Increment
        increment: i64,
        /// Overflow behaviour, if not the server default
        overflow: Option<Overflow>,
    },
}

/// Ordered list of `BITFIELD` operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitFieldSubCommands {
    commands: Vec<BitFieldSubCommand>,
}

impl BitFieldSubCommands {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field
    #[must_use]
    pub fn get(mut self, field: BitFieldType, offset: Offset) -> Self {
        self.commands.push(BitFieldSubCommand::Get { field, offset });
        self
    }

    /// Write a field
    #[must_use]
    pub fn set(mut self, field: BitFieldType, offset: Offset, value: i64) -> Self {
        self.commands
            .push(BitFieldSubCommand::Set { field, offset, value });
        self
    }

    /// Increment a field with the server's default overflow handling
    #[must_use]
    pub fn incr_by(mut self, field: BitFieldType, offset: Offset, increment: i64) -> Self {
        self.commands.push(BitFieldSubCommand::IncrBy {
            field,
            offset,
            increment,
            overflow: None,
        });
        self
    }

    /// Increment a field with explicit overflow handling
    #[must_use]
    pub fn incr_by_with_overflow(
        mut self,
        field: BitFieldType,
        offset: Offset,
        increment: i64,
        overflow: Overflow,
    ) -> Self {
        self.commands.push(BitFieldSubCommand::IncrBy {
            field,
            offset,
            increment,
            overflow: Some(overflow),
        });
        self
    }

    /// Operations in order
    pub fn commands(&self) -> &[BitFieldSubCommand] {
        &self.commands
    }

    /// Whether there are no operations
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether every operation only reads, so `BITFIELD_RO` can be used
    pub fn is_read_only(&self) -> bool {
        self.commands
            .iter()
            .all(|c| matches!(c, BitFieldSubCommand::Get { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_bounds() {
        assert_eq!(BitFieldType::signed(64).unwrap().encoding(), "i64");
        assert_eq!(BitFieldType::unsigned(4).unwrap().encoding(), "u4");
        assert!(BitFieldType::unsigned(64).is_err());
        assert!(BitFieldType::signed(0).is_err());
        assert!(BitFieldType::signed(65).is_err());
    }

    #[test]
    fn test_offset_encoding() {
        assert_eq!(Offset::bits(100).encoding(), "100");
        assert_eq!(Offset::type_relative(2).encoding(), "#2");
    }

    #[test]
    fn test_read_only_detection() {
        let reads = BitFieldSubCommands::new().get(BitFieldType::UINT_8, Offset::bits(0));
        assert!(reads.is_read_only());
        let writes = reads.set(BitFieldType::INT_8, Offset::bits(8), -1);
        assert!(!writes.is_read_only());
        assert_eq!(writes.commands().len(), 2);
    }
}
