use std::fmt::{self, Debug, Display};

use super::{BindingClass, BindingScalar};
use crate::Error;

/// The key of a keyed list entry, as a generated key type's leaf values in
/// key order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingKey {
    class: BindingClass,
    values: Vec<BindingScalar>,
}

impl BindingKey {
    pub fn new(class: BindingClass, values: Vec<BindingScalar>) -> Self {
        Self { class, values }
    }

    pub fn class(&self) -> BindingClass {
        self.class
    }

    pub fn values(&self) -> &[BindingScalar] {
        &self.values
    }
}

/// A single step of an [InstanceIdentifier].
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum BindingPathArgument {
    /// A container, or a list without selecting an entry.
    Item {
        class: BindingClass,
        /// The case enclosing this child, if it sits inside a choice.
        case: Option<BindingClass>,
    },
    /// One entry of a keyed list.
    KeyedItem {
        class: BindingClass,
        case: Option<BindingClass>,
        key: BindingKey,
    },
    Augmentation {
        class: BindingClass,
    },
}

impl BindingPathArgument {
    pub fn item(class: BindingClass) -> Self {
        BindingPathArgument::Item { class, case: None }
    }

    pub fn class(&self) -> BindingClass {
        match self {
            BindingPathArgument::Item { class, .. }
            | BindingPathArgument::KeyedItem { class, .. }
            | BindingPathArgument::Augmentation { class } => *class,
        }
    }

    pub fn case(&self) -> Option<BindingClass> {
        match self {
            BindingPathArgument::Item { case, .. } | BindingPathArgument::KeyedItem { case, .. } => {
                *case
            }
            BindingPathArgument::Augmentation { .. } => None,
        }
    }

    pub fn key(&self) -> Option<&BindingKey> {
        match self {
            BindingPathArgument::KeyedItem { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl Display for BindingPathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(case) = self.case() {
            write!(f, "{}:", case)?;
        }
        match self {
            BindingPathArgument::Item { class, .. } => write!(f, "{}", class),
            BindingPathArgument::KeyedItem { class, key, .. } => {
                write!(f, "{}[{:?}]", class, key.values())
            }
            BindingPathArgument::Augmentation { class } => write!(f, "augmentation({})", class),
        }
    }
}

impl Debug for BindingPathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A path into the typed object graph.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InstanceIdentifier {
    args: Vec<BindingPathArgument>,
}

impl InstanceIdentifier {
    /// Starts a path at the top-level type `T`.
    pub fn builder<T: 'static>() -> InstanceIdentifierBuilder {
        InstanceIdentifierBuilder {
            args: vec![BindingPathArgument::item(BindingClass::of::<T>())],
        }
    }

    /// Starts a path at an entry of the top-level list `T`.
    pub fn keyed_builder<T: 'static>(key: impl Into<BindingKey>) -> InstanceIdentifierBuilder {
        InstanceIdentifierBuilder {
            args: vec![BindingPathArgument::KeyedItem {
                class: BindingClass::of::<T>(),
                case: None,
                key: key.into(),
            }],
        }
    }

    pub fn from_args(args: Vec<BindingPathArgument>) -> Result<Self, Error> {
        if args.is_empty() {
            return Err(Error::SchemaMismatch(
                "an instance identifier needs at least one argument".into(),
            ));
        }
        Ok(Self { args })
    }

    pub fn path_arguments(&self) -> &[BindingPathArgument] {
        &self.args
    }

    /// The type of the object this path points at.
    pub fn target_type(&self) -> BindingClass {
        // never empty, see the constructors
        self.args[self.args.len() - 1].class()
    }

    pub fn child(&self, arg: BindingPathArgument) -> Self {
        let mut args = self.args.clone();
        args.push(arg);
        Self { args }
    }

    pub fn contains(&self, other: &InstanceIdentifier) -> bool {
        other.args.starts_with(&self.args)
    }

    /// Returns the steps of `self` following `ancestor`.
    pub fn relative_to(&self, ancestor: &InstanceIdentifier) -> Result<Vec<BindingPathArgument>, Error> {
        self.args
            .strip_prefix(ancestor.args.as_slice())
            .map(<[BindingPathArgument]>::to_vec)
            .ok_or_else(|| Error::NotAncestor {
                ancestor: ancestor.to_string(),
                path: self.to_string(),
            })
    }
}

impl Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

impl Debug for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[derive(Clone, Debug)]
pub struct InstanceIdentifierBuilder {
    args: Vec<BindingPathArgument>,
}

impl InstanceIdentifierBuilder {
    pub fn child<T: 'static>(mut self) -> Self {
        self.args
            .push(BindingPathArgument::item(BindingClass::of::<T>()));
        self
    }

    pub fn keyed_child<T: 'static>(mut self, key: impl Into<BindingKey>) -> Self {
        self.args.push(BindingPathArgument::KeyedItem {
            class: BindingClass::of::<T>(),
            case: None,
            key: key.into(),
        });
        self
    }

    /// Descends into `T`, which is a child of case `C` of a choice.
    pub fn case_child<C: 'static, T: 'static>(mut self) -> Self {
        self.args.push(BindingPathArgument::Item {
            class: BindingClass::of::<T>(),
            case: Some(BindingClass::of::<C>()),
        });
        self
    }

    pub fn augmentation<A: 'static>(mut self) -> Self {
        self.args.push(BindingPathArgument::Augmentation {
            class: BindingClass::of::<A>(),
        });
        self
    }

    pub fn build(self) -> InstanceIdentifier {
        InstanceIdentifier { args: self.args }
    }
}
