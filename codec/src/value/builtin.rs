use crate::binding::{unexpected, BindingScalar};
use crate::data::{Decimal64, Value};
use crate::schema::TypeDefinition;
use crate::Error;

use super::ValueCodec;

/// Converts the built-in types which map one-to-one between both worlds.
#[derive(Debug)]
pub struct BuiltinCodec {
    type_def: TypeDefinition,
}

impl BuiltinCodec {
    pub fn new(type_def: TypeDefinition) -> Result<Self, Error> {
        match type_def {
            TypeDefinition::Boolean
            | TypeDefinition::Int8
            | TypeDefinition::Int16
            | TypeDefinition::Int32
            | TypeDefinition::Int64
            | TypeDefinition::Uint8
            | TypeDefinition::Uint16
            | TypeDefinition::Uint32
            | TypeDefinition::Uint64
            | TypeDefinition::Decimal64 { .. }
            | TypeDefinition::String
            | TypeDefinition::Binary
            | TypeDefinition::Empty => Ok(Self { type_def }),
            other => Err(Error::SchemaConstruction(format!(
                "{} is not a built-in type",
                other.name()
            ))),
        }
    }

    fn expected(&self) -> String {
        self.type_def.name().to_string()
    }
}

fn rescale(value: &Decimal64, fraction_digits: u8) -> Result<Decimal64, Error> {
    value.rescale(fraction_digits).ok_or_else(|| {
        Error::InvalidValue(format!(
            "{} does not fit decimal64 with {} fraction digits",
            value, fraction_digits
        ))
    })
}

impl ValueCodec for BuiltinCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        Ok(match (&self.type_def, value) {
            (TypeDefinition::Boolean, BindingScalar::Boolean(v)) => Value::Boolean(*v),
            (TypeDefinition::Int8, BindingScalar::Int8(v)) => Value::Int8(*v),
            (TypeDefinition::Int16, BindingScalar::Int16(v)) => Value::Int16(*v),
            (TypeDefinition::Int32, BindingScalar::Int32(v)) => Value::Int32(*v),
            (TypeDefinition::Int64, BindingScalar::Int64(v)) => Value::Int64(*v),
            (TypeDefinition::Uint8, BindingScalar::Uint8(v)) => Value::Uint8(*v),
            (TypeDefinition::Uint16, BindingScalar::Uint16(v)) => Value::Uint16(*v),
            (TypeDefinition::Uint32, BindingScalar::Uint32(v)) => Value::Uint32(*v),
            (TypeDefinition::Uint64, BindingScalar::Uint64(v)) => Value::Uint64(*v),
            (TypeDefinition::Decimal64 { fraction_digits }, BindingScalar::Decimal64(v)) => {
                Value::Decimal64(rescale(v, *fraction_digits)?)
            }
            (TypeDefinition::String, BindingScalar::String(v)) => Value::String(v.clone()),
            (TypeDefinition::Binary, BindingScalar::Binary(v)) => Value::Binary(v.clone()),
            (TypeDefinition::Empty, BindingScalar::Empty) => Value::Empty,
            (_, other) => return Err(unexpected(&self.expected(), other)),
        })
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        Ok(match (&self.type_def, value) {
            (TypeDefinition::Boolean, Value::Boolean(v)) => BindingScalar::Boolean(*v),
            (TypeDefinition::Int8, Value::Int8(v)) => BindingScalar::Int8(*v),
            (TypeDefinition::Int16, Value::Int16(v)) => BindingScalar::Int16(*v),
            (TypeDefinition::Int32, Value::Int32(v)) => BindingScalar::Int32(*v),
            (TypeDefinition::Int64, Value::Int64(v)) => BindingScalar::Int64(*v),
            (TypeDefinition::Uint8, Value::Uint8(v)) => BindingScalar::Uint8(*v),
            (TypeDefinition::Uint16, Value::Uint16(v)) => BindingScalar::Uint16(*v),
            (TypeDefinition::Uint32, Value::Uint32(v)) => BindingScalar::Uint32(*v),
            (TypeDefinition::Uint64, Value::Uint64(v)) => BindingScalar::Uint64(*v),
            (TypeDefinition::Decimal64 { fraction_digits }, Value::Decimal64(v)) => {
                BindingScalar::Decimal64(rescale(v, *fraction_digits)?)
            }
            (TypeDefinition::String, Value::String(v)) => BindingScalar::String(v.clone()),
            (TypeDefinition::Binary, Value::Binary(v)) => BindingScalar::Binary(v.clone()),
            (TypeDefinition::Empty, Value::Empty) => BindingScalar::Empty,
            (_, other) => {
                return Err(Error::InvalidValue(format!(
                    "expected {}, got {}",
                    self.expected(),
                    other.type_of()
                )))
            }
        })
    }
}
