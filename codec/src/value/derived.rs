use std::sync::Arc;

use crate::binding::{unexpected, BindingClass, BindingScalar};
use crate::data::Value;
use crate::schema::Restrictions;
use crate::Error;

use super::ValueCodec;

/// Enforces range and length restrictions of a typedef on the generic
/// value, in both directions.
#[derive(Debug)]
pub struct RestrictedCodec {
    inner: Arc<dyn ValueCodec>,
    restrictions: Restrictions,
}

impl RestrictedCodec {
    pub fn new(inner: Arc<dyn ValueCodec>, restrictions: Restrictions) -> Self {
        Self {
            inner,
            restrictions,
        }
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        if let (Some(range), Some(v)) = (&self.restrictions.range, value.as_integer()) {
            if !range.contains(&v) {
                return Err(Error::InvalidValue(format!(
                    "{} is outside of range {}..={}",
                    v,
                    range.start(),
                    range.end()
                )));
            }
        }

        if let Some(length) = &self.restrictions.length {
            let len = match value {
                Value::String(s) => Some(s.chars().count() as u64),
                Value::Binary(b) => Some(b.len() as u64),
                _ => None,
            };
            if let Some(len) = len.filter(|l| !length.contains(l)) {
                return Err(Error::InvalidValue(format!(
                    "length {} is outside of {}..={}",
                    len,
                    length.start(),
                    length.end()
                )));
            }
        }

        Ok(())
    }
}

impl ValueCodec for RestrictedCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        let value = self.inner.serialize(value)?;
        self.check(&value)?;
        Ok(value)
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        self.check(value)?;
        self.inner.deserialize(value)
    }
}

/// Wraps and unwraps the generated typedef type around its base value.
#[derive(Debug)]
pub struct TypedefCodec {
    class: BindingClass,
    inner: Arc<dyn ValueCodec>,
}

impl TypedefCodec {
    pub fn new(class: BindingClass, inner: Arc<dyn ValueCodec>) -> Self {
        Self { class, inner }
    }
}

impl ValueCodec for TypedefCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        match value {
            BindingScalar::Typedef { class, value } if *class == self.class => {
                self.inner.serialize(value)
            }
            other => Err(unexpected(self.class.simple_name(), other)),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        Ok(BindingScalar::Typedef {
            class: self.class,
            value: Box::new(self.inner.deserialize(value)?),
        })
    }
}
