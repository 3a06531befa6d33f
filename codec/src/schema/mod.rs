//! The schema model the codec is bound to.
//!
//! Schemas are produced by an external parser; the codec only reads them and
//! holds shared references to their nodes.
use std::sync::Arc;

mod types;

pub use types::{
    DerivedType, EnumPair, LeafrefPath, LeafrefStep, Restrictions, TypeDefinition,
};

use crate::QName;

#[derive(Debug, PartialEq, Eq)]
pub enum SchemaNodeKind {
    Container {
        children: Vec<Arc<SchemaNode>>,
        augmentations: Vec<Arc<AugmentationSchema>>,
    },
    List {
        /// Names of the key leaves, in key order. Empty for unkeyed lists.
        key: Vec<QName>,
        children: Vec<Arc<SchemaNode>>,
        augmentations: Vec<Arc<AugmentationSchema>>,
    },
    Leaf {
        type_def: TypeDefinition,
    },
    LeafList {
        type_def: TypeDefinition,
    },
    Choice {
        cases: Vec<Arc<SchemaNode>>,
    },
    Case {
        children: Vec<Arc<SchemaNode>>,
        augmentations: Vec<Arc<AugmentationSchema>>,
    },
}

/// One node of the schema tree.
#[derive(Debug, PartialEq, Eq)]
pub struct SchemaNode {
    qname: QName,
    kind: SchemaNodeKind,
}

impl SchemaNode {
    pub fn new(qname: QName, kind: SchemaNodeKind) -> Arc<Self> {
        Arc::new(Self { qname, kind })
    }

    pub fn container(qname: QName, children: Vec<Arc<SchemaNode>>) -> Arc<Self> {
        Self::new(
            qname,
            SchemaNodeKind::Container {
                children,
                augmentations: vec![],
            },
        )
    }

    pub fn list(qname: QName, key: Vec<QName>, children: Vec<Arc<SchemaNode>>) -> Arc<Self> {
        Self::new(
            qname,
            SchemaNodeKind::List {
                key,
                children,
                augmentations: vec![],
            },
        )
    }

    pub fn leaf(qname: QName, type_def: TypeDefinition) -> Arc<Self> {
        Self::new(qname, SchemaNodeKind::Leaf { type_def })
    }

    pub fn leaf_list(qname: QName, type_def: TypeDefinition) -> Arc<Self> {
        Self::new(qname, SchemaNodeKind::LeafList { type_def })
    }

    pub fn choice(qname: QName, cases: Vec<Arc<SchemaNode>>) -> Arc<Self> {
        Self::new(qname, SchemaNodeKind::Choice { cases })
    }

    pub fn case(qname: QName, children: Vec<Arc<SchemaNode>>) -> Arc<Self> {
        Self::new(
            qname,
            SchemaNodeKind::Case {
                children,
                augmentations: vec![],
            },
        )
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn kind(&self) -> &SchemaNodeKind {
        &self.kind
    }

    /// Declared children, in declaration order. For choices these are the
    /// cases.
    pub fn children(&self) -> &[Arc<SchemaNode>] {
        match &self.kind {
            SchemaNodeKind::Container { children, .. }
            | SchemaNodeKind::List { children, .. }
            | SchemaNodeKind::Case { children, .. } => children,
            SchemaNodeKind::Choice { cases } => cases,
            SchemaNodeKind::Leaf { .. } | SchemaNodeKind::LeafList { .. } => &[],
        }
    }

    pub fn augmentations(&self) -> &[Arc<AugmentationSchema>] {
        match &self.kind {
            SchemaNodeKind::Container { augmentations, .. }
            | SchemaNodeKind::List { augmentations, .. }
            | SchemaNodeKind::Case { augmentations, .. } => augmentations,
            _ => &[],
        }
    }

    pub fn type_definition(&self) -> Option<&TypeDefinition> {
        match &self.kind {
            SchemaNodeKind::Leaf { type_def } | SchemaNodeKind::LeafList { type_def } => {
                Some(type_def)
            }
            _ => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, SchemaNodeKind::Choice { .. })
    }

    /// Looks up a child as it appears in the data tree, descending into
    /// choices, cases and augmentations, which have no data node of their
    /// own.
    pub fn data_child(&self, name: &QName) -> Option<Arc<SchemaNode>> {
        find_data_child(
            self.children(),
            self.augmentations().iter().flat_map(|a| a.children()),
            name,
        )
    }
}

fn find_data_child<'a>(
    children: &'a [Arc<SchemaNode>],
    augmented: impl Iterator<Item = &'a Arc<SchemaNode>>,
    name: &QName,
) -> Option<Arc<SchemaNode>> {
    for child in children.iter().chain(augmented) {
        match child.kind() {
            SchemaNodeKind::Choice { cases } => {
                if let Some(found) = cases.iter().find_map(|case| case.data_child(name)) {
                    return Some(found);
                }
            }
            _ if child.qname() == name => return Some(child.clone()),
            _ => {}
        }
    }
    None
}

/// Children added to a container, list entry or case by another module.
#[derive(Debug, PartialEq, Eq)]
pub struct AugmentationSchema {
    qname: QName,
    children: Vec<Arc<SchemaNode>>,
}

impl AugmentationSchema {
    pub fn new(qname: QName, children: Vec<Arc<SchemaNode>>) -> Arc<Self> {
        Arc::new(Self { qname, children })
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn children(&self) -> &[Arc<SchemaNode>] {
        &self.children
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RpcDefinition {
    pub qname: QName,
    pub input: Arc<SchemaNode>,
    pub output: Arc<SchemaNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentitySchema {
    pub qname: QName,
    pub bases: Vec<QName>,
}

/// The complete schema the codec is bound to.
#[derive(Debug, Default)]
pub struct SchemaContext {
    children: Vec<Arc<SchemaNode>>,
    rpcs: Vec<Arc<RpcDefinition>>,
    identities: Vec<IdentitySchema>,
}

impl SchemaContext {
    pub fn new(
        children: Vec<Arc<SchemaNode>>,
        rpcs: Vec<Arc<RpcDefinition>>,
        identities: Vec<IdentitySchema>,
    ) -> Self {
        Self {
            children,
            rpcs,
            identities,
        }
    }

    /// Top-level data nodes.
    pub fn children(&self) -> &[Arc<SchemaNode>] {
        &self.children
    }

    pub fn rpc(&self, name: &QName) -> Option<&Arc<RpcDefinition>> {
        self.rpcs.iter().find(|r| &r.qname == name)
    }

    pub fn identity(&self, name: &QName) -> Option<&IdentitySchema> {
        self.identities.iter().find(|i| &i.qname == name)
    }

    /// Finds the schema node at a data tree path. A path starting with an
    /// RPC name continues into that RPC's input or output.
    pub fn find_data_node(&self, path: &[QName]) -> Option<Arc<SchemaNode>> {
        let (first, rest) = path.split_first()?;

        let mut current = match find_data_child(&self.children, std::iter::empty(), first) {
            Some(node) => node,
            None => {
                let rpc = self.rpc(first)?;
                let (io, rest) = rest.split_first()?;
                let node = [&rpc.input, &rpc.output]
                    .into_iter()
                    .find(|n| n.qname() == io)?
                    .clone();
                return rest
                    .iter()
                    .try_fold(node, |node, name| node.data_child(name));
            }
        };

        for name in rest {
            current = current.data_child(name)?;
        }
        Some(current)
    }

    /// Whether `identity` is `base` or (transitively) derived from it.
    pub fn is_derived_from(&self, identity: &QName, base: &QName) -> bool {
        let mut pending = vec![identity];
        let mut seen = Vec::new();
        while let Some(current) = pending.pop() {
            if current == base {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(schema) = self.identity(current) {
                pending.extend(schema.bases.iter());
            }
        }
        false
    }
}
