//! Deserialization of generic nodes into data objects.
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{trace, warn};

use super::caching::ObjectCache;
use super::{ChildRef, ChildSlot, CodecNode, LazyDataObject, NodeKind};
use crate::binding::{BindingValue, DataObject, FieldValues};
use crate::config::DeserializationStrategy;
use crate::data::{DataContainerNode, NormalizedNode, PathArgument};
use crate::Error;

impl CodecNode {
    /// Converts a generic node into an instance of this node's type.
    pub fn deserialize(self: &Arc<Self>, data: &Arc<NormalizedNode>) -> Result<Arc<dyn DataObject>, Error> {
        self.deserialize_with(data, None)
    }

    pub(crate) fn deserialize_with(
        self: &Arc<Self>,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
    ) -> Result<Arc<dyn DataObject>, Error> {
        self.deserialize_checked(data, cache, false)
    }

    /// `validated` is set when `data` is part of a subtree that already
    /// passed [CodecNode::validate], which lazy views skip repeating.
    pub(crate) fn deserialize_checked(
        self: &Arc<Self>,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
        validated: bool,
    ) -> Result<Arc<dyn DataObject>, Error> {
        match cache {
            Some(cache) => cache.get_or_build(self, data, || {
                self.construct(data, Some(cache), validated)
            }),
            None => self.construct(data, None, validated),
        }
    }

    fn construct(
        self: &Arc<Self>,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
        validated: bool,
    ) -> Result<Arc<dyn DataObject>, Error> {
        match self.factory.config.deserialization {
            DeserializationStrategy::Eager => self.build_object(data, cache),
            DeserializationStrategy::Lazy => {
                // a lazy view must fail exactly where eager construction would
                if !validated {
                    self.validate(data)?;
                }
                let view = Arc::new(LazyDataObject::new(
                    self.clone(),
                    data.clone(),
                    cache.cloned(),
                )?);
                if let Some(cache) = cache {
                    cache.register_view(&view)?;
                }
                Ok(view)
            }
        }
    }

    /// The data container this node reads its children from.
    pub(crate) fn container_of<'a>(&self, data: &'a NormalizedNode) -> Result<&'a DataContainerNode, Error> {
        let expected = match (&self.kind, data) {
            (NodeKind::Container, NormalizedNode::Container(c))
            | (NodeKind::List { key: Some(_) }, NormalizedNode::MapEntry(c))
            | (NodeKind::List { key: None }, NormalizedNode::UnkeyedListEntry(c))
            | (NodeKind::Case, NormalizedNode::Choice(c)) => Some(c),
            (NodeKind::Augmentation, _) => data.as_data_container(),
            _ => None,
        };

        match expected {
            Some(c) if data.name() == &self.qname || self.is_transparent() => Ok(c),
            _ => Err(Error::InvalidData(format!(
                "{} cannot be read from {} {}",
                self,
                data.kind_name(),
                data.name()
            ))),
        }
    }

    fn is_transparent(&self) -> bool {
        matches!(self.kind, NodeKind::Case | NodeKind::Augmentation)
    }

    /// Reports a generic child with no counterpart in this node.
    pub(crate) fn unknown_child(&self, arg: &PathArgument) -> Result<(), Error> {
        // augmentations only read the children they declare
        if matches!(self.kind, NodeKind::Augmentation) {
            return Ok(());
        }
        if self.factory.config.strict {
            Err(Error::InvalidData(format!(
                "{} is not a child of {}",
                arg, self
            )))
        } else {
            warn!(child = %arg, node = %self, "skipping unknown child");
            Ok(())
        }
    }

    fn build_object(
        self: &Arc<Self>,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
    ) -> Result<Arc<dyn DataObject>, Error> {
        let info = self.type_info()?;
        let constructor = info.constructor.ok_or_else(|| {
            Error::SchemaMismatch(format!("{} cannot be instantiated", info.class))
        })?;
        let container = self.container_of(data)?;

        let mut fields = FieldValues::new();
        let mut augmentations = BTreeSet::new();
        for (arg, child) in container.children() {
            match self.child_ref(arg.node_type()) {
                Some(ChildRef::Child(index)) => {
                    let (accessor, value) = self.read_slot(index, child, cache, false)?;
                    fields.insert(accessor, value);
                }
                Some(ChildRef::Augmentation(index)) => {
                    augmentations.insert(index);
                }
                None => self.unknown_child(arg)?,
            }
        }
        for index in augmentations {
            let augmentation = self.augmentation_node(index)?.deserialize_with(data, cache)?;
            fields.push_augmentation(augmentation);
        }

        trace!(node = %self, "constructing object");
        constructor(fields)
    }

    /// Converts the generic child stored in slot `index`.
    pub(crate) fn read_slot(
        self: &Arc<Self>,
        index: usize,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
        validated: bool,
    ) -> Result<(&'static str, BindingValue), Error> {
        let slot = &self.children[index];
        let accessor = slot.accessor().ok_or_else(|| {
            Error::SchemaMismatch(format!("{} has no accessor in {}", slot.qname(), self))
        })?;

        let value = match (slot, data.as_ref()) {
            (ChildSlot::Leaf { codec, .. }, NormalizedNode::Leaf(leaf)) => {
                BindingValue::Scalar(codec.deserialize(leaf.value())?)
            }
            (ChildSlot::LeafList { codec, .. }, NormalizedNode::LeafSet(set)) => BindingValue::Scalars(
                set.values()
                    .iter()
                    .map(|v| codec.deserialize(v))
                    .collect::<Result<_, _>>()?,
            ),
            (ChildSlot::Node { .. }, _) => {
                let child = self.child_node(index)?;
                match (&child.kind, data.as_ref()) {
                    (NodeKind::Container, NormalizedNode::Container(_)) => {
                        BindingValue::Object(child.deserialize_checked(data, cache, validated)?)
                    }
                    (NodeKind::List { key: Some(_) }, NormalizedNode::Map(list))
                    | (NodeKind::List { key: None }, NormalizedNode::UnkeyedList(list)) => {
                        BindingValue::Objects(
                            list.entries()
                                .iter()
                                .map(|entry| child.deserialize_checked(entry, cache, validated))
                                .collect::<Result<_, _>>()?,
                        )
                    }
                    (NodeKind::Choice, NormalizedNode::Choice(_)) => {
                        BindingValue::Object(child.deserialize_case(data, cache, validated)?)
                    }
                    _ => return Err(unexpected(&child, data)),
                }
            }
            _ => {
                return Err(Error::InvalidData(format!(
                    "{} cannot be read from {} {}",
                    slot.qname(),
                    data.kind_name(),
                    data.name()
                )))
            }
        };
        Ok((accessor, value))
    }

    /// Reads the case instantiated in a generic choice node. The case is
    /// picked by the first child of the choice.
    fn deserialize_case(
        self: &Arc<Self>,
        data: &Arc<NormalizedNode>,
        cache: Option<&Arc<ObjectCache>>,
        validated: bool,
    ) -> Result<Arc<dyn DataObject>, Error> {
        self.case_for(data)?
            .deserialize_checked(data, cache, validated)
    }

    /// The case of this choice instantiated by `data`, picked by the first
    /// child of the generic choice node.
    fn case_for(self: &Arc<Self>, data: &NormalizedNode) -> Result<Arc<CodecNode>, Error> {
        let container = data
            .as_data_container()
            .ok_or_else(|| unexpected(self, data))?;
        let (first, _) = container
            .children()
            .next()
            .ok_or_else(|| Error::InvalidData(format!("choice {} is empty", self)))?;

        match self.child_ref(first.node_type()) {
            Some(ChildRef::Child(index)) => self.child_node(index),
            _ => Err(Error::InvalidData(format!(
                "{} does not belong to any case of {}",
                first, self
            ))),
        }
    }

    /// Checks that `data` converts into this node's type without building
    /// any object: every scalar is decoded and every nested node visited,
    /// failing with the same error eager construction would report.
    pub(crate) fn validate(self: &Arc<Self>, data: &NormalizedNode) -> Result<(), Error> {
        self.type_info()?;
        let container = self.container_of(data)?;

        let mut augmentations = BTreeSet::new();
        for (arg, child) in container.children() {
            match self.child_ref(arg.node_type()) {
                Some(ChildRef::Child(index)) => self.validate_slot(index, child)?,
                Some(ChildRef::Augmentation(index)) => {
                    augmentations.insert(index);
                }
                None => self.unknown_child(arg)?,
            }
        }
        for index in augmentations {
            self.augmentation_node(index)?.validate(data)?;
        }
        Ok(())
    }

    fn validate_slot(self: &Arc<Self>, index: usize, data: &NormalizedNode) -> Result<(), Error> {
        match (&self.children[index], data) {
            (ChildSlot::Leaf { codec, .. }, NormalizedNode::Leaf(leaf)) => {
                codec.deserialize(leaf.value())?;
            }
            (ChildSlot::LeafList { codec, .. }, NormalizedNode::LeafSet(set)) => {
                for value in set.values() {
                    codec.deserialize(value)?;
                }
            }
            (ChildSlot::Node { .. }, _) => {
                let child = self.child_node(index)?;
                match (&child.kind, data) {
                    (NodeKind::Container, NormalizedNode::Container(_)) => child.validate(data)?,
                    (NodeKind::List { key: Some(_) }, NormalizedNode::Map(list))
                    | (NodeKind::List { key: None }, NormalizedNode::UnkeyedList(list)) => {
                        for entry in list.entries() {
                            child.validate(entry)?;
                        }
                    }
                    (NodeKind::Choice, NormalizedNode::Choice(_)) => {
                        child.case_for(data)?.validate(data)?
                    }
                    _ => return Err(unexpected(&child, data)),
                }
            }
            (slot, _) => {
                return Err(Error::InvalidData(format!(
                    "{} cannot be read from {} {}",
                    slot.qname(),
                    data.kind_name(),
                    data.name()
                )))
            }
        }
        Ok(())
    }
}

fn unexpected(node: &CodecNode, data: &NormalizedNode) -> Error {
    Error::InvalidData(format!(
        "{} cannot be read from {} {}",
        node,
        data.kind_name(),
        data.name()
    ))
}
