use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::binding::{unexpected, BindingClass, BindingRegistry, BindingScalar};
use crate::data::Value;
use crate::schema::{EnumPair, SchemaContext};
use crate::{Error, QName};

use super::ValueCodec;

/// Maps enumeration values to their names. The generic tree carries the
/// name as a string.
#[derive(Debug)]
pub struct EnumCodec {
    class: BindingClass,
    pairs: Vec<EnumPair>,
}

impl EnumCodec {
    pub fn new(class: BindingClass, pairs: Vec<EnumPair>) -> Self {
        Self { class, pairs }
    }
}

impl ValueCodec for EnumCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        match value {
            BindingScalar::Enumeration { class, value } if *class == self.class => self
                .pairs
                .iter()
                .find(|p| p.value == *value)
                .map(|p| Value::String(p.name.clone()))
                .ok_or_else(|| {
                    Error::InvalidValue(format!("{} is not a value of {}", value, self.class))
                }),
            other => Err(unexpected(self.class.simple_name(), other)),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        let name = match value {
            Value::String(name) => name,
            other => {
                return Err(Error::InvalidValue(format!(
                    "expected enumeration name, got {}",
                    other.type_of()
                )))
            }
        };

        self.pairs
            .iter()
            .find(|p| &p.name == name)
            .map(|p| BindingScalar::Enumeration {
                class: self.class,
                value: p.value,
            })
            .ok_or_else(|| Error::InvalidValue(format!("{} is not a name of {}", name, self.class)))
    }
}

#[derive(Debug)]
pub struct BitsCodec {
    class: BindingClass,
    names: Vec<SmolStr>,
}

impl BitsCodec {
    pub fn new(class: BindingClass, names: Vec<SmolStr>) -> Self {
        Self { class, names }
    }

    fn check(&self, bits: &BTreeSet<SmolStr>) -> Result<(), Error> {
        match bits.iter().find(|b| !self.names.contains(*b)) {
            Some(unknown) => Err(Error::InvalidValue(format!(
                "{} is not a bit of {}",
                unknown, self.class
            ))),
            None => Ok(()),
        }
    }
}

impl ValueCodec for BitsCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        match value {
            BindingScalar::Bits { class, bits } if *class == self.class => {
                self.check(bits)?;
                Ok(Value::Bits(bits.clone()))
            }
            other => Err(unexpected(self.class.simple_name(), other)),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        match value {
            Value::Bits(bits) => {
                self.check(bits)?;
                Ok(BindingScalar::Bits {
                    class: self.class,
                    bits: bits.clone(),
                })
            }
            other => Err(Error::InvalidValue(format!(
                "expected bits, got {}",
                other.type_of()
            ))),
        }
    }
}

/// Maps generated identity types to identity names, checking that they
/// derive from the base the leaf is restricted to.
#[derive(Debug)]
pub struct IdentityCodec {
    base: QName,
    schema: Arc<SchemaContext>,
    registry: Arc<BindingRegistry>,
}

impl IdentityCodec {
    pub fn new(base: QName, schema: Arc<SchemaContext>, registry: Arc<BindingRegistry>) -> Self {
        Self {
            base,
            schema,
            registry,
        }
    }

    fn check(&self, name: &QName) -> Result<(), Error> {
        if self.schema.is_derived_from(name, &self.base) {
            Ok(())
        } else {
            Err(Error::InvalidValue(format!(
                "identity {} is not derived from {}",
                name, self.base
            )))
        }
    }
}

impl ValueCodec for IdentityCodec {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error> {
        match value {
            BindingScalar::Identity(class) => {
                let name = self.registry.identity_name(class).ok_or_else(|| {
                    Error::InvalidValue(format!("{} is not a known identity", class))
                })?;
                self.check(name)?;
                Ok(Value::Identity(name.clone()))
            }
            other => Err(unexpected("identity", other)),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error> {
        match value {
            Value::Identity(name) => {
                self.check(name)?;
                self.registry
                    .identity_class(name)
                    .map(BindingScalar::Identity)
                    .ok_or_else(|| {
                        Error::InvalidValue(format!("no generated type for identity {}", name))
                    })
            }
            other => Err(Error::InvalidValue(format!(
                "expected identityref, got {}",
                other.type_of()
            ))),
        }
    }
}
