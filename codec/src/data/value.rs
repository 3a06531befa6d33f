use bytes::Bytes;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::QName;

/// A fixed-point decimal, stored as an unscaled integer and the number of
/// fraction digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decimal64 {
    unscaled: i64,
    scale: u8,
}

impl Decimal64 {
    pub const MAX_SCALE: u8 = 18;

    pub fn new(unscaled: i64, scale: u8) -> Option<Self> {
        (scale <= Self::MAX_SCALE).then_some(Self { unscaled, scale })
    }

    pub fn unscaled(&self) -> i64 {
        self.unscaled
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Changes the number of fraction digits, failing if precision would be
    /// lost or the result overflows.
    pub fn rescale(&self, scale: u8) -> Option<Self> {
        if scale > Self::MAX_SCALE {
            return None;
        }

        let unscaled = if scale >= self.scale {
            self.unscaled
                .checked_mul(10i64.checked_pow((scale - self.scale) as u32)?)?
        } else {
            let divisor = 10i64.checked_pow((self.scale - scale) as u32)?;
            if self.unscaled % divisor != 0 {
                return None;
            }
            self.unscaled / divisor
        };

        Some(Self { unscaled, scale })
    }
}

impl Display for Decimal64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }

        let divisor = 10u64.pow(self.scale as u32);
        let abs = self.unscaled.unsigned_abs();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = self.scale as usize
        )
    }
}

/// A scalar value in the generic tree, one variant per built-in type.
/// Enumerations are carried as their [Value::String] name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Decimal64(Decimal64),
    String(SmolStr),
    Binary(Bytes),
    Empty,
    Bits(BTreeSet<SmolStr>),
    Identity(QName),
}

impl Value {
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Decimal64(_) => "decimal64",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Empty => "empty",
            Value::Bits(_) => "bits",
            Value::Identity(_) => "identityref",
        }
    }

    /// Returns the value widened to an i128, if it is an integer.
    pub fn as_integer(&self) -> Option<i128> {
        Some(match self {
            Value::Int8(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::Int64(v) => *v as i128,
            Value::Uint8(v) => *v as i128,
            Value::Uint16(v) => *v as i128,
            Value::Uint32(v) => *v as i128,
            Value::Uint64(v) => *v as i128,
            _ => return None,
        })
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint8(v) => write!(f, "{}", v),
            Value::Uint16(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Decimal64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v.as_str()),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Empty => write!(f, "[empty]"),
            Value::Bits(bits) => write!(f, "{{{}}}", itertools::join(bits, " ")),
            Value::Identity(name) => write!(f, "{}", name),
        }
    }
}
