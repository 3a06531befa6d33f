use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use itertools::Itertools;

use super::{BindingClass, BindingScalar};
use crate::Error;

/// An instance of a generated container, list entry, case, augmentation or
/// RPC input/output type.
///
/// Children are exposed through [DataObject::field], keyed by accessor name.
/// Absent children return `None`; empty lists and leaf-lists are absent.
pub trait DataObject: Any + Debug + Send + Sync {
    /// The generated type this object implements.
    fn implemented_interface(&self) -> BindingClass;

    fn field(&self, accessor: &str) -> Option<BindingValue>;

    fn field_names(&self) -> Vec<&'static str>;

    fn augmentations(&self) -> Vec<Arc<dyn DataObject>> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Value equality across implementations: two objects are equal if they
/// implement the same type, expose the same fields and carry equal
/// augmentations. An eagerly built object and a lazy view over the same
/// data compare equal.
impl PartialEq for dyn DataObject {
    fn eq(&self, other: &Self) -> bool {
        if self.implemented_interface() != other.implemented_interface() {
            return false;
        }

        let names = self
            .field_names()
            .into_iter()
            .chain(other.field_names())
            .unique();
        for name in names {
            if self.field(name) != other.field(name) {
                return false;
            }
        }

        let sorted = |o: &dyn DataObject| {
            let mut augs = o.augmentations();
            augs.sort_by_key(|a| a.implemented_interface());
            augs
        };
        let (ours, theirs) = (sorted(self), sorted(other));
        ours.len() == theirs.len() && ours.iter().zip(theirs.iter()).all(|(a, b)| **a == **b)
    }
}

/// What an accessor returns.
#[derive(Clone, Debug)]
pub enum BindingValue {
    Scalar(BindingScalar),
    /// A leaf-list.
    Scalars(Vec<BindingScalar>),
    /// A container, or the instantiated case of a choice.
    Object(Arc<dyn DataObject>),
    /// The entries of a list.
    Objects(Vec<Arc<dyn DataObject>>),
}

impl BindingValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BindingValue::Scalar(_) => "scalar",
            BindingValue::Scalars(_) => "leaf-list",
            BindingValue::Object(_) => "object",
            BindingValue::Objects(_) => "list",
        }
    }

    /// Wraps an optional scalar.
    pub fn scalar<T: Clone + Into<BindingScalar>>(value: &Option<T>) -> Option<Self> {
        value.clone().map(|v| BindingValue::Scalar(v.into()))
    }

    /// Wraps a leaf-list, treating an empty one as absent.
    pub fn scalars<T: Clone + Into<BindingScalar>>(values: &[T]) -> Option<Self> {
        (!values.is_empty())
            .then(|| BindingValue::Scalars(values.iter().cloned().map(Into::into).collect()))
    }

    pub fn object<T: DataObject>(value: &Option<Arc<T>>) -> Option<Self> {
        value
            .clone()
            .map(|v| BindingValue::Object(v as Arc<dyn DataObject>))
    }

    /// Wraps list entries, treating an empty list as absent.
    pub fn objects<T: DataObject>(values: &[Arc<T>]) -> Option<Self> {
        (!values.is_empty()).then(|| {
            BindingValue::Objects(
                values
                    .iter()
                    .map(|v| v.clone() as Arc<dyn DataObject>)
                    .collect(),
            )
        })
    }
}

impl PartialEq for BindingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BindingValue::Scalar(a), BindingValue::Scalar(b)) => a == b,
            (BindingValue::Scalars(a), BindingValue::Scalars(b)) => a == b,
            (BindingValue::Object(a), BindingValue::Object(b)) => **a == **b,
            (BindingValue::Objects(a), BindingValue::Objects(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| **a == **b)
            }
            _ => false,
        }
    }
}

/// Downcasts a data object to the concrete generated type.
pub fn downcast<T: DataObject>(object: Arc<dyn DataObject>) -> Result<Arc<T>, Error> {
    let class = object.implemented_interface();
    object.into_any().downcast::<T>().map_err(|_| {
        Error::InvalidData(format!(
            "expected an instance of {}, got {}",
            std::any::type_name::<T>(),
            class
        ))
    })
}

/// Converted children handed to a generated constructor.
#[derive(Debug, Default)]
pub struct FieldValues {
    values: HashMap<&'static str, BindingValue>,
    augmentations: Vec<Arc<dyn DataObject>>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, accessor: &'static str, value: BindingValue) {
        self.values.insert(accessor, value);
    }

    pub fn take(&mut self, accessor: &str) -> Option<BindingValue> {
        self.values.remove(accessor)
    }

    pub fn take_scalar<T>(&mut self, accessor: &str) -> Result<Option<T>, Error>
    where
        T: TryFrom<BindingScalar, Error = Error>,
    {
        match self.take(accessor) {
            None => Ok(None),
            Some(BindingValue::Scalar(s)) => T::try_from(s).map(Some),
            Some(other) => Err(mismatch(accessor, "scalar", &other)),
        }
    }

    /// Like [FieldValues::take_scalar], but fails if the value is absent.
    pub fn require_scalar<T>(&mut self, accessor: &str) -> Result<T, Error>
    where
        T: TryFrom<BindingScalar, Error = Error>,
    {
        self.take_scalar(accessor)?
            .ok_or_else(|| Error::InvalidData(format!("mandatory field {} is missing", accessor)))
    }

    pub fn take_scalars<T>(&mut self, accessor: &str) -> Result<Vec<T>, Error>
    where
        T: TryFrom<BindingScalar, Error = Error>,
    {
        match self.take(accessor) {
            None => Ok(Vec::new()),
            Some(BindingValue::Scalars(values)) => values.into_iter().map(T::try_from).collect(),
            Some(other) => Err(mismatch(accessor, "leaf-list", &other)),
        }
    }

    pub fn take_object<T: DataObject>(&mut self, accessor: &str) -> Result<Option<Arc<T>>, Error> {
        match self.take(accessor) {
            None => Ok(None),
            Some(BindingValue::Object(o)) => downcast(o).map(Some),
            Some(other) => Err(mismatch(accessor, "object", &other)),
        }
    }

    pub fn take_objects<T: DataObject>(&mut self, accessor: &str) -> Result<Vec<Arc<T>>, Error> {
        match self.take(accessor) {
            None => Ok(Vec::new()),
            Some(BindingValue::Objects(entries)) => entries.into_iter().map(downcast).collect(),
            Some(other) => Err(mismatch(accessor, "list", &other)),
        }
    }

    /// Takes the instantiated case of a choice, converting it into the
    /// generated choice type.
    pub fn take_choice<T>(&mut self, accessor: &str) -> Result<Option<T>, Error>
    where
        T: TryFrom<Arc<dyn DataObject>, Error = Error>,
    {
        match self.take(accessor) {
            None => Ok(None),
            Some(BindingValue::Object(o)) => T::try_from(o).map(Some),
            Some(other) => Err(mismatch(accessor, "case", &other)),
        }
    }

    pub fn push_augmentation(&mut self, augmentation: Arc<dyn DataObject>) {
        self.augmentations.push(augmentation);
    }

    pub fn take_augmentations(&mut self) -> Vec<Arc<dyn DataObject>> {
        std::mem::take(&mut self.augmentations)
    }
}

fn mismatch(accessor: &str, expected: &str, got: &BindingValue) -> Error {
    Error::InvalidData(format!(
        "field {}: expected {}, got {}",
        accessor,
        expected,
        got.kind_name()
    ))
}
