//! The codec tree: one node per schema node reachable from a generated type.
//!
//! Nodes are created on first use and published into their parent's child
//! slot, so the tree only ever contains the parts of the schema that have
//! actually been touched. Leaves are not nodes of their own; their value
//! codecs live directly in the parent's slot and are resolved when the
//! parent is built.
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

use crate::binding::{
    accessor_name, BindingClass, BindingKey, BindingKind, BindingPathArgument, BindingRegistry,
    BindingScalar, BindingTypeInfo, BindingValue, DataObject,
};
use crate::config::CodecConfig;
use crate::data::{KeyPredicates, PathArgument};
use crate::schema::{AugmentationSchema, SchemaContext, SchemaNode, SchemaNodeKind};
use crate::value::{ValueCodec, ValueCodecFactory};
use crate::{Error, QName};

mod caching;
mod lazy;
mod reader;
mod streamer;

pub use caching::CachingCodec;
pub use lazy::LazyDataObject;
pub(crate) use streamer::DataObjectStreamer;

/// State shared by every node of one codec tree.
#[derive(Debug)]
pub(crate) struct CodecFactory {
    pub(crate) schema: Arc<SchemaContext>,
    pub(crate) registry: Arc<BindingRegistry>,
    pub(crate) config: CodecConfig,
    pub(crate) values: ValueCodecFactory,
}

impl CodecFactory {
    pub(crate) fn new(
        schema: Arc<SchemaContext>,
        registry: Arc<BindingRegistry>,
        config: CodecConfig,
    ) -> Self {
        Self {
            values: ValueCodecFactory::new(schema.clone(), registry.clone()),
            schema,
            registry,
            config,
        }
    }
}

#[derive(Debug)]
pub(crate) struct KeyLeaf {
    pub(crate) qname: QName,
    pub(crate) accessor: &'static str,
    pub(crate) codec: Arc<dyn ValueCodec>,
}

/// The key definition of a keyed list.
#[derive(Debug)]
pub struct ListKey {
    /// The generated key type, if there is one.
    class: Option<BindingClass>,
    leaves: Vec<KeyLeaf>,
}

impl ListKey {
    /// Converts a typed key into key predicates.
    pub fn predicates(&self, key: &BindingKey) -> Result<KeyPredicates, Error> {
        if Some(key.class()) != self.class {
            return Err(Error::SchemaMismatch(format!(
                "key type {} does not match {:?}",
                key.class(),
                self.class
            )));
        }
        if key.values().len() != self.leaves.len() {
            return Err(Error::SchemaMismatch(format!(
                "key {} has {} values, expected {}",
                key.class(),
                key.values().len(),
                self.leaves.len()
            )));
        }

        self.leaves
            .iter()
            .zip(key.values())
            .map(|(leaf, value)| Ok((leaf.qname.clone(), leaf.codec.serialize(value)?)))
            .collect()
    }

    /// Converts key predicates into a typed key.
    pub fn binding_key(&self, predicates: &KeyPredicates) -> Result<BindingKey, Error> {
        let class = self.class.ok_or_else(|| {
            Error::SchemaMismatch("list has no generated key type".into())
        })?;
        let values = self
            .leaves
            .iter()
            .map(|leaf| {
                let value = predicates.get(&leaf.qname).ok_or_else(|| {
                    Error::InvalidData(format!("key leaf {} is missing", leaf.qname))
                })?;
                leaf.codec.deserialize(value)
            })
            .collect::<Result<_, Error>>()?;
        Ok(BindingKey::new(class, values))
    }

    /// Reads the key predicates of a list entry from its key leaves.
    pub(crate) fn entry_predicates(&self, entry: &dyn DataObject) -> Result<KeyPredicates, Error> {
        self.leaves
            .iter()
            .map(|leaf| match entry.field(leaf.accessor) {
                Some(BindingValue::Scalar(value)) => {
                    Ok((leaf.qname.clone(), leaf.codec.serialize(&value)?))
                }
                _ => Err(Error::InvalidData(format!(
                    "list entry {} lacks key leaf {}",
                    entry.implemented_interface(),
                    leaf.qname
                ))),
            })
            .collect()
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Root,
    Container,
    /// A list. `key` is `None` for unkeyed lists.
    List {
        key: Option<ListKey>,
    },
    Choice,
    Case,
    Augmentation,
}

#[derive(Debug)]
enum SchemaRef {
    Root,
    Node(Arc<SchemaNode>),
    Augmentation(Arc<AugmentationSchema>),
}

#[derive(Debug)]
pub(crate) enum ChildSlot {
    Leaf {
        schema: Arc<SchemaNode>,
        accessor: &'static str,
        codec: Arc<dyn ValueCodec>,
    },
    LeafList {
        schema: Arc<SchemaNode>,
        accessor: &'static str,
        codec: Arc<dyn ValueCodec>,
    },
    Node {
        schema: Arc<SchemaNode>,
        /// `None` for cases of a choice and top-level nodes.
        accessor: Option<&'static str>,
        class: BindingClass,
        node: OnceLock<Arc<CodecNode>>,
    },
}

impl ChildSlot {
    pub(crate) fn qname(&self) -> &QName {
        match self {
            ChildSlot::Leaf { schema, .. }
            | ChildSlot::LeafList { schema, .. }
            | ChildSlot::Node { schema, .. } => schema.qname(),
        }
    }

    pub(crate) fn accessor(&self) -> Option<&'static str> {
        match self {
            ChildSlot::Leaf { accessor, .. } | ChildSlot::LeafList { accessor, .. } => {
                Some(accessor)
            }
            ChildSlot::Node { accessor, .. } => *accessor,
        }
    }

    fn is_choice(&self) -> bool {
        matches!(self, ChildSlot::Node { schema, .. } if schema.is_choice())
    }
}

#[derive(Debug)]
pub(crate) struct AugmentationSlot {
    schema: Arc<AugmentationSchema>,
    class: BindingClass,
    node: OnceLock<Arc<CodecNode>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChildRef {
    Child(usize),
    Augmentation(usize),
}

/// The codec for one schema node in the context of one generated type.
pub struct CodecNode {
    factory: Arc<CodecFactory>,
    parent: Option<Weak<CodecNode>>,
    qname: QName,
    kind: NodeKind,
    type_info: Option<BindingTypeInfo>,
    /// Names of the data nodes from the root down to this node. Choices,
    /// cases and augmentations add nothing.
    data_path: Vec<QName>,
    children: Vec<ChildSlot>,
    augmentations: Vec<AugmentationSlot>,
    by_class: HashMap<BindingClass, ChildRef>,
    by_qname: HashMap<QName, ChildRef>,
    by_accessor: HashMap<&'static str, usize>,
    streamer: OnceLock<Arc<DataObjectStreamer>>,
}

fn class_for(registry: &BindingRegistry, candidates: &[BindingClass], name: &QName) -> Option<BindingClass> {
    candidates
        .iter()
        .find(|c| {
            registry
                .type_info(c)
                .map(|info| &info.qname == name)
                .unwrap_or(false)
        })
        .copied()
}

/// Names under which the children of `case` appear in the generic tree.
fn generic_child_names(case: &SchemaNode) -> impl Iterator<Item = &QName> {
    case.children()
        .iter()
        .chain(case.augmentations().iter().flat_map(|a| a.children()))
        .map(|c| c.qname())
}

impl CodecNode {
    pub(crate) fn root(factory: Arc<CodecFactory>) -> Result<Arc<Self>, Error> {
        Self::build(factory, None, Vec::new(), SchemaRef::Root, None)
    }

    /// Builds a free-standing node for the input or output of an RPC.
    pub(crate) fn rpc(
        factory: Arc<CodecFactory>,
        rpc: &QName,
        schema: Arc<SchemaNode>,
        class: BindingClass,
    ) -> Result<Arc<Self>, Error> {
        Self::build(
            factory,
            None,
            vec![rpc.clone()],
            SchemaRef::Node(schema),
            Some(class),
        )
    }

    fn build(
        factory: Arc<CodecFactory>,
        parent: Option<&Arc<CodecNode>>,
        mut data_path: Vec<QName>,
        schema: SchemaRef,
        class: Option<BindingClass>,
    ) -> Result<Arc<Self>, Error> {
        let registry = factory.registry.clone();
        let type_info = class
            .map(|c| registry.type_info(&c).cloned())
            .transpose()?;

        let (qname, schema_children, schema_augmentations): (_, &[Arc<SchemaNode>], &[_]) =
            match &schema {
                SchemaRef::Root => (QName::new("", ""), factory.schema.children(), &[]),
                SchemaRef::Node(node) => {
                    (node.qname().clone(), node.children(), node.augmentations())
                }
                SchemaRef::Augmentation(aug) => (aug.qname().clone(), aug.children(), &[]),
            };

        if let Some(info) = &type_info {
            if info.qname != qname {
                return Err(Error::SchemaConstruction(format!(
                    "{} was generated for {}, not {}",
                    info.class, info.qname, qname
                )));
            }
        }

        let schema_kind = match &schema {
            SchemaRef::Node(node) => Some(node.kind()),
            _ => None,
        };
        if matches!(
            schema_kind,
            Some(SchemaNodeKind::Container { .. } | SchemaNodeKind::List { .. })
        ) {
            data_path.push(qname.clone());
        }

        let mut children = Vec::with_capacity(schema_children.len());
        for child in schema_children {
            if matches!(schema, SchemaRef::Root) {
                match registry.top_level_class(child.qname()) {
                    Some(class) => children.push(ChildSlot::Node {
                        schema: child.clone(),
                        accessor: None,
                        class,
                        node: OnceLock::new(),
                    }),
                    None => debug!(qname = %child.qname(), "no binding for top-level node"),
                }
                continue;
            }

            if matches!(schema_kind, Some(SchemaNodeKind::Choice { .. })) {
                let choice = class.ok_or_else(|| {
                    Error::SchemaConstruction(format!("choice {} has no binding", qname))
                })?;
                match class_for(&registry, registry.cases_of(&choice), child.qname()) {
                    Some(case) => children.push(ChildSlot::Node {
                        schema: child.clone(),
                        accessor: None,
                        class: case,
                        node: OnceLock::new(),
                    }),
                    None => debug!(case = %child.qname(), "no binding for case"),
                }
                continue;
            }

            let info = type_info.as_ref().ok_or_else(|| {
                Error::SchemaConstruction(format!("{} has no binding", qname))
            })?;
            let name = accessor_name(child.qname().local_name());
            let accessor = info.accessor(&name).ok_or_else(|| {
                Error::SchemaConstruction(format!(
                    "{} has no accessor {} for {}",
                    info.class,
                    name,
                    child.qname()
                ))
            })?;

            children.push(match child.kind() {
                SchemaNodeKind::Leaf { type_def } | SchemaNodeKind::LeafList { type_def } => {
                    let mut leaf_path = data_path.clone();
                    leaf_path.push(child.qname().clone());
                    let codec = factory
                        .values
                        .leaf_codec(accessor.class, type_def, &leaf_path)?;
                    if matches!(child.kind(), SchemaNodeKind::Leaf { .. }) {
                        ChildSlot::Leaf {
                            schema: child.clone(),
                            accessor: accessor.name,
                            codec,
                        }
                    } else {
                        ChildSlot::LeafList {
                            schema: child.clone(),
                            accessor: accessor.name,
                            codec,
                        }
                    }
                }
                SchemaNodeKind::Container { .. }
                | SchemaNodeKind::List { .. }
                | SchemaNodeKind::Choice { .. } => ChildSlot::Node {
                    schema: child.clone(),
                    accessor: Some(accessor.name),
                    class: accessor.class.ok_or_else(|| {
                        Error::SchemaConstruction(format!(
                            "accessor {} of {} has no binding type",
                            accessor.name, info.class
                        ))
                    })?,
                    node: OnceLock::new(),
                },
                SchemaNodeKind::Case { .. } => {
                    return Err(Error::SchemaConstruction(format!(
                        "case {} outside of a choice",
                        child.qname()
                    )))
                }
            });
        }

        let mut augmentations = Vec::new();
        if let Some(class) = class {
            for aug in schema_augmentations {
                match class_for(&registry, registry.augmentations_of(&class), aug.qname()) {
                    Some(aug_class) => augmentations.push(AugmentationSlot {
                        schema: aug.clone(),
                        class: aug_class,
                        node: OnceLock::new(),
                    }),
                    None => debug!(augmentation = %aug.qname(), "no binding for augmentation"),
                }
            }
        }

        let kind = match schema_kind {
            None if matches!(schema, SchemaRef::Root) => NodeKind::Root,
            None => NodeKind::Augmentation,
            Some(SchemaNodeKind::Container { .. }) => NodeKind::Container,
            Some(SchemaNodeKind::List { key, .. }) => NodeKind::List {
                key: Self::list_key(type_info.as_ref(), key, &children)?,
            },
            Some(SchemaNodeKind::Choice { .. }) => NodeKind::Choice,
            Some(SchemaNodeKind::Case { .. }) => NodeKind::Case,
            Some(SchemaNodeKind::Leaf { .. } | SchemaNodeKind::LeafList { .. }) => {
                return Err(Error::SchemaConstruction(format!(
                    "leaf {} has no codec node",
                    qname
                )))
            }
        };

        let mut by_class = HashMap::new();
        let mut by_qname = HashMap::new();
        let mut by_accessor = HashMap::new();
        for (i, slot) in children.iter().enumerate() {
            if let Some(accessor) = slot.accessor() {
                by_accessor.insert(accessor, i);
            }
            match slot {
                ChildSlot::Node { schema, class, .. } => {
                    by_class.insert(*class, ChildRef::Child(i));
                    if matches!(kind, NodeKind::Choice) {
                        for name in generic_child_names(schema) {
                            by_qname.entry(name.clone()).or_insert(ChildRef::Child(i));
                        }
                    } else {
                        by_qname.insert(schema.qname().clone(), ChildRef::Child(i));
                    }
                }
                _ => {
                    by_qname.insert(slot.qname().clone(), ChildRef::Child(i));
                }
            }
        }
        for (i, aug) in augmentations.iter().enumerate() {
            by_class.insert(aug.class, ChildRef::Augmentation(i));
            for child in aug.schema.children() {
                by_qname
                    .entry(child.qname().clone())
                    .or_insert(ChildRef::Augmentation(i));
            }
        }

        debug!(qname = %qname, class = ?class, children = children.len(), "built codec node");

        Ok(Arc::new(CodecNode {
            factory,
            parent: parent.map(Arc::downgrade),
            qname,
            kind,
            type_info,
            data_path,
            children,
            augmentations,
            by_class,
            by_qname,
            by_accessor,
            streamer: OnceLock::new(),
        }))
    }

    fn list_key(
        type_info: Option<&BindingTypeInfo>,
        key: &[QName],
        children: &[ChildSlot],
    ) -> Result<Option<ListKey>, Error> {
        if key.is_empty() {
            return Ok(None);
        }

        let class = match type_info.map(|i| &i.kind) {
            Some(BindingKind::ListEntry { key }) => *key,
            _ => None,
        };
        let leaves = key
            .iter()
            .map(|name| {
                children
                    .iter()
                    .find_map(|slot| match slot {
                        ChildSlot::Leaf {
                            schema,
                            accessor,
                            codec,
                        } if schema.qname() == name => Some(KeyLeaf {
                            qname: name.clone(),
                            accessor: *accessor,
                            codec: codec.clone(),
                        }),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        Error::SchemaConstruction(format!("key leaf {} is not a leaf", name))
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Some(ListKey { class, leaves }))
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The generated type this node converts. `None` for the root.
    pub fn binding_class(&self) -> Option<BindingClass> {
        self.type_info.as_ref().map(|i| i.class)
    }

    pub fn parent(&self) -> Option<Arc<CodecNode>> {
        self.parent.as_ref()?.upgrade()
    }

    pub(crate) fn type_info(&self) -> Result<&BindingTypeInfo, Error> {
        self.type_info
            .as_ref()
            .ok_or_else(|| Error::SchemaMismatch(format!("{} has no binding type", self)))
    }

    pub(crate) fn slots(&self) -> &[ChildSlot] {
        &self.children
    }

    pub(crate) fn augmentation_count(&self) -> usize {
        self.augmentations.len()
    }

    pub(crate) fn child_ref(&self, name: &QName) -> Option<ChildRef> {
        self.by_qname.get(name).copied()
    }

    pub(crate) fn slot_for_accessor(&self, accessor: &str) -> Option<usize> {
        self.by_accessor.get(accessor).copied()
    }

    pub(crate) fn child_node(self: &Arc<Self>, index: usize) -> Result<Arc<CodecNode>, Error> {
        match &self.children[index] {
            ChildSlot::Node {
                schema,
                class,
                node,
                ..
            } => {
                if let Some(existing) = node.get() {
                    return Ok(existing.clone());
                }
                let built = CodecNode::build(
                    self.factory.clone(),
                    Some(self),
                    self.data_path.clone(),
                    SchemaRef::Node(schema.clone()),
                    Some(*class),
                )?;
                Ok(node.get_or_init(|| built).clone())
            }
            slot => Err(Error::SchemaMismatch(format!(
                "{} is a leaf of {}, not a codec node",
                slot.qname(),
                self
            ))),
        }
    }

    pub(crate) fn augmentation_node(self: &Arc<Self>, index: usize) -> Result<Arc<CodecNode>, Error> {
        let slot = &self.augmentations[index];
        if let Some(existing) = slot.node.get() {
            return Ok(existing.clone());
        }
        let built = CodecNode::build(
            self.factory.clone(),
            Some(self),
            self.data_path.clone(),
            SchemaRef::Augmentation(slot.schema.clone()),
            Some(slot.class),
        )?;
        Ok(slot.node.get_or_init(|| built).clone())
    }

    pub(crate) fn resolve(self: &Arc<Self>, child: ChildRef) -> Result<Arc<CodecNode>, Error> {
        match child {
            ChildRef::Child(i) => self.child_node(i),
            ChildRef::Augmentation(i) => self.augmentation_node(i),
        }
    }

    /// Returns the codec for a direct child type: a container, list,
    /// choice, case (on a choice) or augmentation.
    ///
    /// Children of cases are not direct children of the node holding the
    /// choice; the choice and then the case have to be resolved first.
    pub fn stream_child(self: &Arc<Self>, class: BindingClass) -> Result<Arc<CodecNode>, Error> {
        match self.by_class.get(&class) {
            Some(child) => self.resolve(*child),
            None => Err(Error::SchemaMismatch(format!(
                "{} is not a valid child of {}",
                class, self
            ))),
        }
    }

    /// Returns the codec for the node addressed by a single generic path
    /// argument. Cases and augmentations, which do not appear in generic
    /// paths, are entered transparently.
    pub fn yang_path_argument_child(self: &Arc<Self>, arg: &PathArgument) -> Result<Arc<CodecNode>, Error> {
        if let (NodeKind::List { .. }, PathArgument::Entry { name, .. }) = (&self.kind, arg) {
            if name == &self.qname {
                return Ok(self.clone());
            }
        }

        match self.by_qname.get(arg.node_type()) {
            Some(ChildRef::Child(i)) => {
                let child = self.child_node(*i)?;
                if matches!(self.kind, NodeKind::Choice) {
                    // the child is a case, which never appears in generic paths
                    child.yang_path_argument_child(arg)
                } else {
                    Ok(child)
                }
            }
            Some(ChildRef::Augmentation(i)) => {
                self.augmentation_node(*i)?.yang_path_argument_child(arg)
            }
            None => Err(Error::SchemaMismatch(format!(
                "{} is not a valid child of {}",
                arg, self
            ))),
        }
    }

    /// Returns the codec for the node addressed by a single typed path
    /// argument, appending the equivalent generic arguments to `generic`.
    ///
    /// A step naming a child of a case without naming the case is resolved
    /// by searching the choices of this node in declaration order; the first
    /// case declaring the type wins.
    pub fn binding_path_argument_child(
        self: &Arc<Self>,
        arg: &BindingPathArgument,
        mut generic: Option<&mut Vec<PathArgument>>,
    ) -> Result<Arc<CodecNode>, Error> {
        if let BindingPathArgument::Augmentation { class } = arg {
            return match self.by_class.get(class) {
                Some(child @ ChildRef::Augmentation(_)) => self.resolve(*child),
                _ => Err(Error::SchemaMismatch(format!(
                    "{} does not augment {}",
                    class, self
                ))),
            };
        }

        let parent = match arg.case() {
            Some(case) => self.case_child(case, generic.as_deref_mut())?,
            None => self.clone(),
        };

        let class = arg.class();
        let child = match parent.by_class.get(&class) {
            Some(ChildRef::Child(i)) => parent.child_node(*i)?,
            None if arg.case().is_none() => parent.find_in_choices(class, generic.as_deref_mut())?,
            _ => {
                return Err(Error::SchemaMismatch(format!(
                    "{} is not a valid child of {}",
                    arg, parent
                )))
            }
        };

        let mut push = |step: PathArgument| {
            if let Some(acc) = generic.as_deref_mut() {
                acc.push(step);
            }
        };
        match (&child.kind, arg) {
            (NodeKind::Container, BindingPathArgument::Item { .. })
            | (NodeKind::List { .. }, BindingPathArgument::Item { .. }) => {
                push(PathArgument::Node(child.qname.clone()));
            }
            (NodeKind::List { key: Some(key) }, BindingPathArgument::KeyedItem { key: typed, .. }) => {
                let keys = key.predicates(typed)?;
                push(PathArgument::Node(child.qname.clone()));
                push(PathArgument::Entry {
                    name: child.qname.clone(),
                    keys,
                });
            }
            _ => {
                return Err(Error::SchemaMismatch(format!(
                    "{} cannot address {}",
                    arg, child
                )))
            }
        }

        trace!(arg = %arg, node = %child, "resolved binding path argument");
        Ok(child)
    }

    /// Finds case `case` among the choices of this node.
    fn case_child(
        self: &Arc<Self>,
        case: BindingClass,
        generic: Option<&mut Vec<PathArgument>>,
    ) -> Result<Arc<CodecNode>, Error> {
        for (i, slot) in self.children.iter().enumerate() {
            if !slot.is_choice() {
                continue;
            }
            let choice = self.child_node(i)?;
            if let Some(ChildRef::Child(j)) = choice.by_class.get(&case) {
                if let Some(acc) = generic {
                    acc.push(PathArgument::Node(choice.qname.clone()));
                }
                return choice.child_node(*j);
            }
        }

        Err(Error::SchemaMismatch(format!(
            "{} is not a case of any choice in {}",
            case, self
        )))
    }

    /// Finds the first case of any choice of this node declaring `class`.
    fn find_in_choices(
        self: &Arc<Self>,
        class: BindingClass,
        generic: Option<&mut Vec<PathArgument>>,
    ) -> Result<Arc<CodecNode>, Error> {
        for (i, slot) in self.children.iter().enumerate() {
            if !slot.is_choice() {
                continue;
            }
            let choice = self.child_node(i)?;
            for j in 0..choice.children.len() {
                let case = choice.child_node(j)?;
                if let Some(ChildRef::Child(k)) = case.by_class.get(&class) {
                    if let Some(acc) = generic {
                        acc.push(PathArgument::Node(choice.qname.clone()));
                    }
                    return case.child_node(*k);
                }
            }
        }

        Err(Error::SchemaMismatch(format!(
            "{} is not a valid child of {}",
            class, self
        )))
    }

    /// Translates a typed path argument addressing this node into its
    /// generic counterpart. Choices, cases and augmentations have none.
    pub fn serialize_path_argument(&self, arg: &BindingPathArgument) -> Result<Option<PathArgument>, Error> {
        if matches!(
            self.kind,
            NodeKind::Root | NodeKind::Choice | NodeKind::Case | NodeKind::Augmentation
        ) {
            return Ok(None);
        }
        if Some(arg.class()) != self.binding_class() {
            return Err(Error::SchemaMismatch(format!(
                "{} does not address {}",
                arg, self
            )));
        }

        match (&self.kind, arg) {
            (NodeKind::Container | NodeKind::List { .. }, BindingPathArgument::Item { .. }) => {
                Ok(Some(PathArgument::Node(self.qname.clone())))
            }
            (NodeKind::List { key: Some(key) }, BindingPathArgument::KeyedItem { key: typed, .. }) => {
                Ok(Some(PathArgument::Entry {
                    name: self.qname.clone(),
                    keys: key.predicates(typed)?,
                }))
            }
            _ => Err(Error::SchemaMismatch(format!(
                "{} cannot address {}",
                arg, self
            ))),
        }
    }

    /// Translates a generic path argument addressing this node into its
    /// typed counterpart. Returns `None` where no typed step exists: for
    /// choices, cases, augmentations and a keyed list as a whole.
    pub fn deserialize_path_argument(&self, arg: &PathArgument) -> Result<Option<BindingPathArgument>, Error> {
        let class = match (&self.kind, self.binding_class()) {
            (NodeKind::Container | NodeKind::List { .. }, Some(class)) => class,
            _ => return Ok(None),
        };
        if arg.node_type() != &self.qname {
            return Err(Error::SchemaMismatch(format!(
                "{} does not address {}",
                arg, self
            )));
        }

        let case = self.enclosing_case();
        Ok(match (&self.kind, arg) {
            (NodeKind::Container, PathArgument::Node(_))
            | (NodeKind::List { key: None }, PathArgument::Node(_)) => {
                Some(BindingPathArgument::Item { class, case })
            }
            (NodeKind::List { key: Some(_) }, PathArgument::Node(_)) => None,
            (NodeKind::List { key: Some(key) }, PathArgument::Entry { keys, .. }) => {
                Some(BindingPathArgument::KeyedItem {
                    class,
                    case,
                    key: key.binding_key(keys)?,
                })
            }
            _ => {
                return Err(Error::SchemaMismatch(format!(
                    "{} cannot address {}",
                    arg, self
                )))
            }
        })
    }

    fn enclosing_case(&self) -> Option<BindingClass> {
        let parent = self.parent()?;
        match parent.kind {
            NodeKind::Case => parent.binding_class(),
            _ => None,
        }
    }

    /// Creates a caching decorator over this node, memoizing deserialized
    /// objects of the given types. Every call returns an independent cache.
    pub fn create_caching_codec(self: &Arc<Self>, cached_types: HashSet<BindingClass>) -> CachingCodec {
        CachingCodec::new(self.clone(), cached_types)
    }

    /// The per-node serialization plan, computed on first use.
    pub(crate) fn streamer(&self) -> Arc<DataObjectStreamer> {
        self.streamer
            .get_or_init(|| Arc::new(DataObjectStreamer::new(self)))
            .clone()
    }

    pub(crate) fn scalar_codec(&self, index: usize) -> Option<&Arc<dyn ValueCodec>> {
        match &self.children[index] {
            ChildSlot::Leaf { codec, .. } | ChildSlot::LeafList { codec, .. } => Some(codec),
            ChildSlot::Node { .. } => None,
        }
    }

    /// Finds the leaf behind accessor `accessor` of `declaring`, which is
    /// either this node's type, an augmentation of it, or a case of one of
    /// its choices. Returns the leaf's path relative to this node.
    pub(crate) fn leaf_for_accessor(
        self: &Arc<Self>,
        declaring: BindingClass,
        accessor: &str,
    ) -> Result<(Vec<PathArgument>, Arc<dyn ValueCodec>), Error> {
        self.resolve_leaf(declaring, accessor, false)
    }

    /// Like [CodecNode::leaf_for_accessor], for leaf-lists. The codec
    /// converts single entries.
    pub(crate) fn leaf_list_for_accessor(
        self: &Arc<Self>,
        declaring: BindingClass,
        accessor: &str,
    ) -> Result<(Vec<PathArgument>, Arc<dyn ValueCodec>), Error> {
        self.resolve_leaf(declaring, accessor, true)
    }

    fn resolve_leaf(
        self: &Arc<Self>,
        declaring: BindingClass,
        accessor: &str,
        list: bool,
    ) -> Result<(Vec<PathArgument>, Arc<dyn ValueCodec>), Error> {
        let what = if list { "leaf-list" } else { "leaf" };
        let mut matches = Vec::new();
        if self.binding_class() == Some(declaring) {
            self.collect_leaf(accessor, list, Vec::new(), &mut matches);
        }
        if let Some(ChildRef::Augmentation(i)) = self.by_class.get(&declaring) {
            self.augmentation_node(*i)?
                .collect_leaf(accessor, list, Vec::new(), &mut matches);
        }
        for (i, slot) in self.children.iter().enumerate() {
            if !slot.is_choice() {
                continue;
            }
            let choice = self.child_node(i)?;
            if let Some(ChildRef::Child(j)) = choice.by_class.get(&declaring) {
                choice.child_node(*j)?.collect_leaf(
                    accessor,
                    list,
                    vec![PathArgument::Node(choice.qname.clone())],
                    &mut matches,
                );
            }
        }

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(Error::SchemaMismatch(format!(
                "{} has no {} {} reachable from {}",
                declaring, what, accessor, self
            ))),
            n => Err(Error::SchemaMismatch(format!(
                "{}::{} matches {} {}s of {}",
                declaring, accessor, n, what, self
            ))),
        }
    }

    fn collect_leaf(
        &self,
        accessor: &str,
        list: bool,
        prefix: Vec<PathArgument>,
        out: &mut Vec<(Vec<PathArgument>, Arc<dyn ValueCodec>)>,
    ) {
        for slot in &self.children {
            let (schema, a, codec) = match slot {
                ChildSlot::Leaf {
                    schema,
                    accessor,
                    codec,
                } if !list => (schema, accessor, codec),
                ChildSlot::LeafList {
                    schema,
                    accessor,
                    codec,
                } if list => (schema, accessor, codec),
                _ => continue,
            };
            if *a == accessor {
                let mut path = prefix.clone();
                path.push(PathArgument::Node(schema.qname().clone()));
                out.push((path, codec.clone()));
            }
        }
    }

    /// Converts a typed scalar for the leaf at `index`.
    pub(crate) fn serialize_scalar(&self, index: usize, value: &BindingScalar) -> Result<crate::data::Value, Error> {
        let codec = self.scalar_codec(index).ok_or_else(|| {
            Error::SchemaMismatch(format!("{} is not a leaf", self.children[index].qname()))
        })?;
        codec.serialize(value)
    }
}

impl Display for CodecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Root => write!(f, "root"),
            _ => write!(f, "{}", self.qname),
        }
    }
}

impl Debug for CodecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodecNode({})", self)
    }
}
