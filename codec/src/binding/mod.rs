//! The typed side of the codec: classes, scalars, data objects, typed paths
//! and the registry describing generated types.
use bytes::Bytes;
use smol_str::SmolStr;
use std::any::TypeId;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use crate::data::Decimal64;
use crate::Error;

mod naming;
mod object;
mod path;
mod registry;

pub use naming::accessor_name;
pub use object::{downcast, BindingValue, DataObject, FieldValues};
pub use path::{BindingKey, BindingPathArgument, InstanceIdentifier, InstanceIdentifierBuilder};
pub use registry::{AccessorInfo, BindingKind, BindingRegistry, BindingTypeInfo, Constructor};

/// Identifies a generated type at runtime.
#[derive(Clone, Copy)]
pub struct BindingClass {
    id: TypeId,
    name: &'static str,
}

impl BindingClass {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn simple_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for BindingClass {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BindingClass {}

impl Hash for BindingClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialOrd for BindingClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BindingClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then(self.id.cmp(&other.id))
    }
}

impl Display for BindingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

impl Debug for BindingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

/// A scalar as exposed by generated accessors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingScalar {
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
    Enumeration {
        class: BindingClass,
        value: i32,
    },
    Bits {
        class: BindingClass,
        bits: BTreeSet<SmolStr>,
    },
    Identity(BindingClass),
    /// A value of a generated typedef wrapper.
    Typedef {
        class: BindingClass,
        value: Box<BindingScalar>,
    },
    /// A value of a generated union, tagged with the member it was built
    /// from.
    Union {
        class: BindingClass,
        member: SmolStr,
        value: Box<BindingScalar>,
    },
}

impl BindingScalar {
    pub fn type_of(&self) -> &'static str {
        match self {
            BindingScalar::Boolean(_) => "boolean",
            BindingScalar::Int8(_) => "int8",
            BindingScalar::Int16(_) => "int16",
            BindingScalar::Int32(_) => "int32",
            BindingScalar::Int64(_) => "int64",
            BindingScalar::Uint8(_) => "uint8",
            BindingScalar::Uint16(_) => "uint16",
            BindingScalar::Uint32(_) => "uint32",
            BindingScalar::Uint64(_) => "uint64",
            BindingScalar::Decimal64(_) => "decimal64",
            BindingScalar::String(_) => "string",
            BindingScalar::Binary(_) => "binary",
            BindingScalar::Empty => "empty",
            BindingScalar::Enumeration { .. } => "enumeration",
            BindingScalar::Bits { .. } => "bits",
            BindingScalar::Identity(_) => "identity",
            BindingScalar::Typedef { .. } => "typedef",
            BindingScalar::Union { .. } => "union",
        }
    }

    pub fn typedef(class: BindingClass, value: impl Into<BindingScalar>) -> Self {
        BindingScalar::Typedef {
            class,
            value: Box::new(value.into()),
        }
    }

    pub fn union(class: BindingClass, member: impl Into<SmolStr>, value: impl Into<BindingScalar>) -> Self {
        BindingScalar::Union {
            class,
            member: member.into(),
            value: Box::new(value.into()),
        }
    }
}

pub(crate) fn unexpected(expected: &str, got: &BindingScalar) -> Error {
    Error::InvalidValue(format!("expected {}, got {}", expected, got.type_of()))
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for BindingScalar {
                fn from(value: $ty) -> Self {
                    BindingScalar::$variant(value)
                }
            }

            impl TryFrom<BindingScalar> for $ty {
                type Error = Error;

                fn try_from(value: BindingScalar) -> Result<Self, Self::Error> {
                    match value {
                        BindingScalar::$variant(v) => Ok(v),
                        other => Err(unexpected(stringify!($variant), &other)),
                    }
                }
            }
        )*
    };
}

scalar_conversions! {
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    Decimal64 => Decimal64,
    SmolStr => String,
    Bytes => Binary,
}

impl From<&str> for BindingScalar {
    fn from(value: &str) -> Self {
        BindingScalar::String(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingClass, BindingScalar};
    use crate::Error;
    use smol_str::SmolStr;

    struct Marker;

    #[test]
    fn class_identity() {
        assert_eq!(BindingClass::of::<Marker>(), BindingClass::of::<Marker>());
        assert_ne!(BindingClass::of::<Marker>(), BindingClass::of::<u8>());
        assert_eq!("Marker", BindingClass::of::<Marker>().simple_name());
    }

    #[test]
    fn scalar_conversion() {
        assert_eq!(Ok(7u16), u16::try_from(BindingScalar::from(7u16)));
        assert_eq!(
            Ok(SmolStr::new("x")),
            SmolStr::try_from(BindingScalar::from("x"))
        );
        assert!(matches!(
            i32::try_from(BindingScalar::Boolean(true)),
            Err(Error::InvalidValue(_))
        ));
    }
}
