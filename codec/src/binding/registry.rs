use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{BindingClass, DataObject, FieldValues};
use crate::{Error, QName};

/// Builds an instance of a generated type from its converted children.
pub type Constructor = fn(FieldValues) -> Result<Arc<dyn DataObject>, Error>;

/// One accessor of a generated type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessorInfo {
    pub name: &'static str,
    /// The generated type the accessor returns: the child type for
    /// containers, lists and choices, the wrapper type for typedefs,
    /// enumerations, bits and unions. `None` for plain built-in leaves.
    pub class: Option<BindingClass>,
}

impl AccessorInfo {
    pub fn leaf(name: &'static str) -> Self {
        Self { name, class: None }
    }

    pub fn typed(name: &'static str, class: BindingClass) -> Self {
        Self {
            name,
            class: Some(class),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Container,
    ListEntry { key: Option<BindingClass> },
    Choice,
    Case { choice: BindingClass },
    Augmentation { target: BindingClass },
    RpcInput,
    RpcOutput,
}

/// Describes one generated type.
#[derive(Clone, Debug)]
pub struct BindingTypeInfo {
    pub class: BindingClass,
    /// The schema node (or augmentation) the type was generated from.
    pub qname: QName,
    pub kind: BindingKind,
    pub accessors: Vec<AccessorInfo>,
    /// `None` for choices, which only exist as a dispatch over their cases.
    pub constructor: Option<Constructor>,
}

impl BindingTypeInfo {
    pub fn accessor(&self, name: &str) -> Option<&AccessorInfo> {
        self.accessors.iter().find(|a| a.name == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RpcClasses {
    input: BindingClass,
    output: BindingClass,
}

/// Everything known about the generated types, as produced alongside them.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    types: HashMap<BindingClass, BindingTypeInfo>,
    top_level: HashMap<QName, BindingClass>,
    cases: HashMap<BindingClass, Vec<BindingClass>>,
    augmentations: HashMap<BindingClass, Vec<BindingClass>>,
    rpcs: HashMap<QName, RpcClasses>,
    typedefs: HashMap<QName, BindingClass>,
    union_members: HashMap<(BindingClass, SmolStr), BindingClass>,
    identities: HashMap<QName, BindingClass>,
    identity_names: HashMap<BindingClass, QName>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: BindingTypeInfo) -> &mut Self {
        debug!(class = %info.class, qname = %info.qname, "registering binding type");
        match info.kind {
            BindingKind::Case { choice } => self.cases.entry(choice).or_default().push(info.class),
            BindingKind::Augmentation { target } => self
                .augmentations
                .entry(target)
                .or_default()
                .push(info.class),
            _ => {}
        }
        self.types.insert(info.class, info);
        self
    }

    /// Registers a type generated for a top-level data node.
    pub fn register_top_level(&mut self, info: BindingTypeInfo) -> &mut Self {
        self.top_level.insert(info.qname.clone(), info.class);
        self.register(info)
    }

    pub fn register_rpc(
        &mut self,
        rpc: QName,
        input: BindingTypeInfo,
        output: BindingTypeInfo,
    ) -> &mut Self {
        self.rpcs.insert(
            rpc,
            RpcClasses {
                input: input.class,
                output: output.class,
            },
        );
        self.register(input).register(output)
    }

    pub fn register_typedef(&mut self, name: QName, class: BindingClass) -> &mut Self {
        self.typedefs.insert(name, class);
        self
    }

    /// Registers the type generated for an inline enumeration, bits or union
    /// member of a union.
    pub fn register_union_member(
        &mut self,
        union: BindingClass,
        member: impl Into<SmolStr>,
        class: BindingClass,
    ) -> &mut Self {
        self.union_members.insert((union, member.into()), class);
        self
    }

    pub fn register_identity(&mut self, name: QName, class: BindingClass) -> &mut Self {
        self.identity_names.insert(class, name.clone());
        self.identities.insert(name, class);
        self
    }

    pub fn type_info(&self, class: &BindingClass) -> Result<&BindingTypeInfo, Error> {
        self.types
            .get(class)
            .ok_or_else(|| Error::SchemaMismatch(format!("{} is not a known binding type", class)))
    }

    pub fn top_level_class(&self, name: &QName) -> Option<BindingClass> {
        self.top_level.get(name).copied()
    }

    pub fn cases_of(&self, choice: &BindingClass) -> &[BindingClass] {
        self.cases.get(choice).map_or(&[], Vec::as_slice)
    }

    pub fn augmentations_of(&self, target: &BindingClass) -> &[BindingClass] {
        self.augmentations.get(target).map_or(&[], Vec::as_slice)
    }

    /// The generated input and output types of an RPC.
    pub fn rpc_classes(&self, rpc: &QName) -> Option<(BindingClass, BindingClass)> {
        self.rpcs.get(rpc).map(|c| (c.input, c.output))
    }

    pub fn typedef_class(&self, name: &QName) -> Option<BindingClass> {
        self.typedefs.get(name).copied()
    }

    pub fn union_member_class(&self, union: &BindingClass, member: &str) -> Option<BindingClass> {
        self.union_members.get(&(*union, SmolStr::new(member))).copied()
    }

    pub fn identity_class(&self, name: &QName) -> Option<BindingClass> {
        self.identities.get(name).copied()
    }

    pub fn identity_name(&self, class: &BindingClass) -> Option<&QName> {
        self.identity_names.get(class)
    }
}
