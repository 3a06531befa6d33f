use smol_str::SmolStr;
use std::ops::RangeInclusive;

use crate::QName;

/// One named member of an enumeration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumPair {
    pub name: SmolStr,
    pub value: i32,
}

impl EnumPair {
    pub fn new(name: impl Into<SmolStr>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Restrictions a derived type places on its base type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Restrictions {
    /// Allowed range of integer values.
    pub range: Option<RangeInclusive<i128>>,
    /// Allowed length of strings (in characters) and binaries (in bytes).
    pub length: Option<RangeInclusive<u64>>,
}

impl Restrictions {
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.length.is_none()
    }
}

/// A typedef, deriving a named type from a base type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivedType {
    pub name: QName,
    pub base: TypeDefinition,
    pub restrictions: Restrictions,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeafrefStep {
    Parent,
    Child(QName),
}

/// The target path of a leafref, either absolute or relative to the leaf
/// defining it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeafrefPath {
    pub absolute: bool,
    pub steps: Vec<LeafrefStep>,
}

impl LeafrefPath {
    /// Parses a path such as `../item/id` or `/top/item/id`, resolving
    /// unprefixed and prefixed names into `namespace`.
    pub fn parse(namespace: &str, path: &str) -> Self {
        let absolute = path.starts_with('/');
        let steps = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                ".." => LeafrefStep::Parent,
                name => {
                    let local = name.rsplit_once(':').map_or(name, |(_, local)| local);
                    LeafrefStep::Child(QName::new(namespace, local))
                }
            })
            .collect();

        Self { absolute, steps }
    }
}

/// The type of a leaf or leaf-list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDefinition {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64 { fraction_digits: u8 },
    String,
    Binary,
    Empty,
    Enumeration(Vec<EnumPair>),
    Bits(Vec<SmolStr>),
    IdentityRef { base: QName },
    Union(Vec<TypeDefinition>),
    Leafref(LeafrefPath),
    Derived(Box<DerivedType>),
}

impl TypeDefinition {
    pub fn derived(name: QName, base: TypeDefinition, restrictions: Restrictions) -> Self {
        TypeDefinition::Derived(Box::new(DerivedType {
            name,
            base,
            restrictions,
        }))
    }

    /// The name of this type, as used to identify union members.
    pub fn name(&self) -> SmolStr {
        SmolStr::new_inline(match self {
            TypeDefinition::Boolean => "boolean",
            TypeDefinition::Int8 => "int8",
            TypeDefinition::Int16 => "int16",
            TypeDefinition::Int32 => "int32",
            TypeDefinition::Int64 => "int64",
            TypeDefinition::Uint8 => "uint8",
            TypeDefinition::Uint16 => "uint16",
            TypeDefinition::Uint32 => "uint32",
            TypeDefinition::Uint64 => "uint64",
            TypeDefinition::Decimal64 { .. } => "decimal64",
            TypeDefinition::String => "string",
            TypeDefinition::Binary => "binary",
            TypeDefinition::Empty => "empty",
            TypeDefinition::Enumeration(_) => "enumeration",
            TypeDefinition::Bits(_) => "bits",
            TypeDefinition::IdentityRef { .. } => "identityref",
            TypeDefinition::Union(_) => "union",
            TypeDefinition::Leafref(_) => "leafref",
            TypeDefinition::Derived(derived) => return derived.name.local_name().into(),
        })
    }

    /// Follows typedefs down to the built-in type they are based on.
    pub fn base_type(&self) -> &TypeDefinition {
        let mut current = self;
        while let TypeDefinition::Derived(derived) = current {
            current = &derived.base;
        }
        current
    }
}
