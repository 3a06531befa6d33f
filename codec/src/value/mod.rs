//! Scalar conversion between [BindingScalar]s and generic [Value]s.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::binding::{BindingClass, BindingRegistry, BindingScalar};
use crate::data::Value;
use crate::schema::{SchemaContext, TypeDefinition};
use crate::{Error, QName};

mod builtin;
mod derived;
mod enumeration;
mod leafref;
mod union;

pub use builtin::BuiltinCodec;
pub use derived::{RestrictedCodec, TypedefCodec};
pub use enumeration::{BitsCodec, EnumCodec, IdentityCodec};
pub use union::UnionCodec;

/// A pure, stateless conversion of one scalar type.
pub trait ValueCodec: Send + Sync + Debug {
    fn serialize(&self, value: &BindingScalar) -> Result<Value, Error>;
    fn deserialize(&self, value: &Value) -> Result<BindingScalar, Error>;
}

type CodecKey = (Option<BindingClass>, TypeDefinition);

/// Builds value codecs and interns them by (class, resolved type).
#[derive(Debug)]
pub struct ValueCodecFactory {
    schema: Arc<SchemaContext>,
    registry: Arc<BindingRegistry>,
    codecs: RwLock<HashMap<CodecKey, Arc<dyn ValueCodec>>>,
}

impl ValueCodecFactory {
    pub fn new(schema: Arc<SchemaContext>, registry: Arc<BindingRegistry>) -> Self {
        Self {
            schema,
            registry,
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the codec for a leaf at `leaf_path` in the data tree,
    /// following leafrefs to the type of the leaf they point to.
    pub fn leaf_codec(
        &self,
        class: Option<BindingClass>,
        type_def: &TypeDefinition,
        leaf_path: &[QName],
    ) -> Result<Arc<dyn ValueCodec>, Error> {
        let resolved = leafref::resolve(&self.schema, type_def, leaf_path)?;
        self.codec(class, &resolved)
    }

    /// Returns the interned codec for an already resolved type.
    pub fn codec(
        &self,
        class: Option<BindingClass>,
        type_def: &TypeDefinition,
    ) -> Result<Arc<dyn ValueCodec>, Error> {
        let key = (class, type_def.clone());
        if let Some(codec) = self.codecs.read().get(&key) {
            trace!(type_name = %type_def.name(), "value codec cache hit");
            return Ok(codec.clone());
        }

        let built = self.build(class, type_def)?;
        debug!(type_name = %type_def.name(), class = ?class, "built value codec");
        Ok(self.codecs.write().entry(key).or_insert(built).clone())
    }

    fn build(
        &self,
        class: Option<BindingClass>,
        type_def: &TypeDefinition,
    ) -> Result<Arc<dyn ValueCodec>, Error> {
        Ok(match type_def {
            TypeDefinition::Derived(derived) => match derived.base.base_type() {
                // generated as the typedef type itself, not as a wrapper
                TypeDefinition::Enumeration(_)
                | TypeDefinition::Bits(_)
                | TypeDefinition::Union(_) => self.codec(class, &derived.base)?,
                _ => {
                    let base = self.codec(None, &derived.base)?;
                    let inner: Arc<dyn ValueCodec> = if derived.restrictions.is_empty() {
                        base
                    } else {
                        Arc::new(RestrictedCodec::new(base, derived.restrictions.clone()))
                    };
                    match class {
                        Some(class) => Arc::new(TypedefCodec::new(class, inner)),
                        None => inner,
                    }
                }
            },
            TypeDefinition::Enumeration(pairs) => {
                Arc::new(EnumCodec::new(required(class, type_def)?, pairs.clone()))
            }
            TypeDefinition::Bits(names) => {
                Arc::new(BitsCodec::new(required(class, type_def)?, names.clone()))
            }
            TypeDefinition::IdentityRef { base } => Arc::new(IdentityCodec::new(
                base.clone(),
                self.schema.clone(),
                self.registry.clone(),
            )),
            TypeDefinition::Union(members) => {
                let class = required(class, type_def)?;
                let members = members
                    .iter()
                    .map(|member| {
                        let name = member.name();
                        let member_class = self.union_member_class(&class, member);
                        Ok((name, self.codec(member_class, member)?))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Arc::new(UnionCodec::new(class, members))
            }
            TypeDefinition::Leafref(_) => {
                return Err(Error::SchemaConstruction(
                    "leafref must be resolved before building its codec".into(),
                ))
            }
            builtin => Arc::new(BuiltinCodec::new(builtin.clone())?),
        })
    }

    fn union_member_class(
        &self,
        union: &BindingClass,
        member: &TypeDefinition,
    ) -> Option<BindingClass> {
        self.registry
            .union_member_class(union, &member.name())
            .or_else(|| match member {
                TypeDefinition::Derived(derived) => self.registry.typedef_class(&derived.name),
                _ => None,
            })
    }
}

fn required(class: Option<BindingClass>, type_def: &TypeDefinition) -> Result<BindingClass, Error> {
    class.ok_or_else(|| {
        Error::SchemaConstruction(format!(
            "no generated type is known for {} type",
            type_def.name()
        ))
    })
}

#[cfg(test)]
mod tests;
