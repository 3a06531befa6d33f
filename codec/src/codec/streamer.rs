//! Serialization of data objects into [NormalizedNodeStreamWriter] events.
use std::sync::Arc;
use tracing::{debug, trace};

use super::{ChildSlot, CodecNode, NodeKind};
use crate::binding::{BindingValue, DataObject};
use crate::data::{NormalizedNode, NormalizedNodeBuilder, NormalizedNodeStreamWriter};
use crate::Error;

#[derive(Debug, Clone, Copy)]
enum Step {
    Leaf { index: usize, accessor: &'static str },
    LeafList { index: usize, accessor: &'static str },
    Child { index: usize, accessor: &'static str },
}

/// The serialization plan of one codec node: its children in schema
/// declaration order, each bound to the accessor producing it.
#[derive(Debug)]
pub(crate) struct DataObjectStreamer {
    steps: Vec<Step>,
}

impl DataObjectStreamer {
    pub(crate) fn new(node: &CodecNode) -> Self {
        let steps: Vec<Step> = node
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                ChildSlot::Leaf { accessor, .. } => Some(Step::Leaf { index, accessor }),
                ChildSlot::LeafList { accessor, .. } => Some(Step::LeafList { index, accessor }),
                ChildSlot::Node {
                    accessor: Some(accessor),
                    ..
                } => Some(Step::Child { index, accessor }),
                ChildSlot::Node { accessor: None, .. } => None,
            })
            .collect();

        debug!(node = %node, steps = steps.len(), "generated streamer");
        Self { steps }
    }

    /// Emits the children of `object`, followed by its augmentations.
    pub(crate) fn write(
        &self,
        node: &Arc<CodecNode>,
        object: &dyn DataObject,
        writer: &mut dyn NormalizedNodeStreamWriter,
    ) -> Result<(), Error> {
        for step in &self.steps {
            match *step {
                Step::Leaf { index, accessor } => match object.field(accessor) {
                    None => {}
                    Some(BindingValue::Scalar(value)) => {
                        let value = node.serialize_scalar(index, &value)?;
                        writer.leaf(node.slots()[index].qname(), &value)?;
                    }
                    Some(other) => return Err(mismatch(node, accessor, "scalar", &other)),
                },
                Step::LeafList { index, accessor } => match object.field(accessor) {
                    None => {}
                    Some(BindingValue::Scalars(values)) if values.is_empty() => {}
                    Some(BindingValue::Scalars(values)) => {
                        writer.start_leaf_set(node.slots()[index].qname(), values.len())?;
                        for value in &values {
                            writer.leaf_set_entry(&node.serialize_scalar(index, value)?)?;
                        }
                        writer.end_node()?;
                    }
                    Some(other) => return Err(mismatch(node, accessor, "leaf-list", &other)),
                },
                Step::Child { index, accessor } => {
                    if let Some(value) = object.field(accessor) {
                        let child = node.child_node(index)?;
                        write_child(&child, accessor, value, writer)?;
                    }
                }
            }
        }

        for augmentation in object.augmentations() {
            let class = augmentation.implemented_interface();
            let aug_node = node.stream_child(class)?;
            if !matches!(aug_node.kind(), NodeKind::Augmentation) {
                return Err(Error::SchemaMismatch(format!(
                    "{} is not an augmentation of {}",
                    class, node
                )));
            }
            aug_node.write_object(augmentation.as_ref(), writer)?;
        }

        Ok(())
    }
}

fn write_child(
    child: &Arc<CodecNode>,
    accessor: &str,
    value: BindingValue,
    writer: &mut dyn NormalizedNodeStreamWriter,
) -> Result<(), Error> {
    match (child.kind(), value) {
        (NodeKind::Container, BindingValue::Object(object)) => child.write_object(object.as_ref(), writer),
        (NodeKind::List { key }, BindingValue::Objects(entries)) => {
            if entries.is_empty() {
                return Ok(());
            }
            if key.is_some() {
                writer.start_map(child.qname(), entries.len())?;
            } else {
                writer.start_unkeyed_list(child.qname(), entries.len())?;
            }
            for entry in &entries {
                child.write_object(entry.as_ref(), writer)?;
            }
            writer.end_node()
        }
        (NodeKind::Choice, BindingValue::Object(case)) => {
            let case_node = child.stream_child(case.implemented_interface())?;
            writer.start_choice(child.qname(), case.field_names().len())?;
            case_node.write_object(case.as_ref(), writer)?;
            writer.end_node()
        }
        (_, other) => Err(mismatch(child, accessor, child.kind_name(), &other)),
    }
}

fn mismatch(node: &CodecNode, accessor: &str, expected: &str, got: &BindingValue) -> Error {
    Error::InvalidData(format!(
        "{}: accessor {} must yield a {}, got {}",
        node,
        accessor,
        expected,
        got.kind_name()
    ))
}

impl CodecNode {
    /// Emits `object` as the generic node this codec describes. Cases and
    /// augmentations have no generic node and are written inline.
    pub fn write_object(
        self: &Arc<Self>,
        object: &dyn DataObject,
        writer: &mut dyn NormalizedNodeStreamWriter,
    ) -> Result<(), Error> {
        let class = object.implemented_interface();
        if Some(class) != self.binding_class() {
            return Err(Error::SchemaMismatch(format!(
                "{} cannot be written by the codec for {}",
                class, self
            )));
        }
        trace!(node = %self, "writing object");

        let hint = object.field_names().len();
        let streamer = self.streamer();
        match &self.kind {
            NodeKind::Container => writer.start_container(&self.qname, hint)?,
            NodeKind::List { key: Some(key) } => {
                writer.start_map_entry(&self.qname, &key.entry_predicates(object)?, hint)?
            }
            NodeKind::List { key: None } => writer.start_unkeyed_list_item(&self.qname, hint)?,
            NodeKind::Case | NodeKind::Augmentation => {
                return streamer.write(self, object, writer);
            }
            NodeKind::Choice | NodeKind::Root => {
                return Err(Error::SchemaMismatch(format!(
                    "{} does not describe a data object",
                    self
                )))
            }
        }
        streamer.write(self, object, writer)?;
        writer.end_node()
    }

    /// Converts `object` into a standalone generic tree.
    pub fn serialize(self: &Arc<Self>, object: &dyn DataObject) -> Result<NormalizedNode, Error> {
        let mut builder = NormalizedNodeBuilder::new();
        self.write_object(object, &mut builder)?;
        builder.finish()
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Root => "root",
            NodeKind::Container => "container",
            NodeKind::List { .. } => "list",
            NodeKind::Choice => "choice",
            NodeKind::Case => "case",
            NodeKind::Augmentation => "augmentation",
        }
    }
}
