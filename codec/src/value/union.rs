use smol_str::SmolStr;
use std::sync::Arc;
use tracing::trace;

use crate::binding::{unexpected, BindingClass, BindingScalar};
use crate::data::Value;
use crate::Error;

use super::ValueCodec;

/// Converts values of a union type by trying its members strictly in
/// declaration order. The first member accepting a value wins, so
/// ambiguous values always resolve to the earliest matching member.
#[derive(Debug)]
pub struct UnionCodec {
    class: BindingClass,
    members: Vec<(SmolStr, Arc<dyn ValueCodec>)>,
}

impl UnionCodec {
    pub fn new(class: BindingClass, members: Vec<(SmolStr, Arc<dyn ValueCodec>)>) -> Self {
        Self { class, members }
    }
}

impl ValueCodec for UnionCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        let inner = match value {
            BindingScalar::Union { class, value, .. } if *class == self.class => value,
            other => return Err(unexpected(self.class.simple_name(), other)),
        };

        for (name, codec) in &self.members {
            match codec.serialize(inner) {
                Ok(v) => return Ok(v),
                Err(e) => trace!(member = %name, err = %e, "union member rejected value"),
            }
        }

        Err(Error::InvalidValue(format!(
            "{} does not fit any member of {}",
            inner.type_of(),
            self.class
        )))
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        for (name, codec) in &self.members {
            match codec.deserialize(value) {
                Ok(v) => {
                    return Ok(BindingScalar::Union {
                        class: self.class,
                        member: name.clone(),
                        value: Box::new(v),
                    })
                }
                Err(e) => trace!(member = %name, err = %e, "union member rejected value"),
            }
        }

        Err(Error::InvalidValue(format!(
            "{} does not fit any member of {}",
            value, self.class
        )))
    }
}
