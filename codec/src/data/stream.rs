use std::collections::BTreeMap;
use std::sync::Arc;

use super::{DataContainerNode, KeyPredicates, NormalizedNode, PathArgument, Value};
use crate::{Error, QName};

/// Receives the generic tree as a sequence of events.
///
/// Every `start_*` call is matched by an [NormalizedNodeStreamWriter::end_node]
/// call, except for [NormalizedNodeStreamWriter::leaf] and
/// [NormalizedNodeStreamWriter::leaf_set_entry], which are complete on their
/// own. Size hints are advisory.
pub trait NormalizedNodeStreamWriter {
    fn start_container(&mut self, name: &QName, child_hint: usize) -> Result<(), Error>;
    fn start_choice(&mut self, name: &QName, child_hint: usize) -> Result<(), Error>;
    fn start_map(&mut self, name: &QName, count: usize) -> Result<(), Error>;
    fn start_map_entry(
        &mut self,
        name: &QName,
        keys: &KeyPredicates,
        child_hint: usize,
    ) -> Result<(), Error>;
    fn start_unkeyed_list(&mut self, name: &QName, count: usize) -> Result<(), Error>;
    fn start_unkeyed_list_item(&mut self, name: &QName, child_hint: usize) -> Result<(), Error>;
    fn start_leaf_set(&mut self, name: &QName, count: usize) -> Result<(), Error>;
    fn leaf_set_entry(&mut self, value: &Value) -> Result<(), Error>;
    fn leaf(&mut self, name: &QName, value: &Value) -> Result<(), Error>;
    fn end_node(&mut self) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerKind {
    Container,
    Choice,
    MapEntry,
    UnkeyedListEntry,
}

#[derive(Debug)]
enum Frame {
    Container {
        kind: ContainerKind,
        identifier: PathArgument,
        children: BTreeMap<PathArgument, Arc<NormalizedNode>>,
    },
    List {
        keyed: bool,
        name: QName,
        entries: Vec<Arc<NormalizedNode>>,
    },
    LeafSet {
        name: QName,
        values: Vec<Value>,
    },
}

/// A [NormalizedNodeStreamWriter] assembling the events into a single
/// [NormalizedNode].
#[derive(Debug, Default)]
pub struct NormalizedNodeBuilder {
    stack: Vec<Frame>,
    result: Option<NormalizedNode>,
}

impl NormalizedNodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the assembled node, failing if nodes are still open or no
    /// node was written.
    pub fn finish(self) -> Result<NormalizedNode, Error> {
        if !self.stack.is_empty() {
            return Err(Error::Stream(format!(
                "{} nodes have not been ended",
                self.stack.len()
            )));
        }
        self.result
            .ok_or_else(|| Error::Stream("no node has been written".into()))
    }

    fn push_container(
        &mut self,
        kind: ContainerKind,
        identifier: PathArgument,
    ) -> Result<(), Error> {
        let expected_list = match kind {
            ContainerKind::MapEntry => Some(true),
            ContainerKind::UnkeyedListEntry => Some(false),
            _ => None,
        };

        match (self.stack.last(), expected_list) {
            (None, _) => {}
            (Some(Frame::Container { .. }), None) => {}
            (Some(Frame::List { keyed, name, .. }), Some(expected))
                if *keyed == expected && name == identifier.node_type() => {}
            (Some(frame), _) => {
                return Err(Error::Stream(format!(
                    "cannot start {} inside {}",
                    identifier,
                    frame_name(frame)
                )))
            }
        }

        self.stack.push(Frame::Container {
            kind,
            identifier,
            children: BTreeMap::new(),
        });
        Ok(())
    }

    fn push_frame(&mut self, frame: Frame) -> Result<(), Error> {
        if let Some(parent) = self.stack.last() {
            if !matches!(parent, Frame::Container { .. }) {
                return Err(Error::Stream(format!(
                    "cannot start {} inside {}",
                    frame_name(&frame),
                    frame_name(parent)
                )));
            }
        }
        self.stack.push(frame);
        Ok(())
    }

    fn add(&mut self, node: NormalizedNode) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => {
                if self.result.is_some() {
                    return Err(Error::Stream("a node has already been written".into()));
                }
                self.result = Some(node);
            }
            Some(Frame::Container { children, .. }) => {
                let arg = node.identifier();
                if children.contains_key(&arg) {
                    return Err(Error::Stream(format!("duplicate child {}", arg)));
                }
                children.insert(arg, Arc::new(node));
            }
            Some(Frame::List {
                keyed: true,
                name,
                entries,
            }) => {
                let arg = node.identifier();
                if entries.iter().any(|e| e.identifier() == arg) {
                    return Err(Error::Stream(format!("duplicate entry {} in {}", arg, name)));
                }
                entries.push(Arc::new(node))
            }
            Some(Frame::List { entries, .. }) => entries.push(Arc::new(node)),
            Some(Frame::LeafSet { name, .. }) => {
                return Err(Error::Stream(format!(
                    "cannot add {} to leaf-set {}",
                    node.name(),
                    name
                )))
            }
        }
        Ok(())
    }
}

fn frame_name(frame: &Frame) -> String {
    match frame {
        Frame::Container { identifier, .. } => identifier.to_string(),
        Frame::List { name, .. } => name.to_string(),
        Frame::LeafSet { name, .. } => name.to_string(),
    }
}

impl NormalizedNodeStreamWriter for NormalizedNodeBuilder {
    fn start_container(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.push_container(ContainerKind::Container, PathArgument::Node(name.clone()))
    }

    fn start_choice(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.push_container(ContainerKind::Choice, PathArgument::Node(name.clone()))
    }

    fn start_map(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.push_frame(Frame::List {
            keyed: true,
            name: name.clone(),
            entries: Vec::with_capacity(count),
        })
    }

    fn start_map_entry(
        &mut self,
        name: &QName,
        keys: &KeyPredicates,
        _child_hint: usize,
    ) -> Result<(), Error> {
        self.push_container(
            ContainerKind::MapEntry,
            PathArgument::Entry {
                name: name.clone(),
                keys: keys.clone(),
            },
        )
    }

    fn start_unkeyed_list(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.push_frame(Frame::List {
            keyed: false,
            name: name.clone(),
            entries: Vec::with_capacity(count),
        })
    }

    fn start_unkeyed_list_item(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.push_container(
            ContainerKind::UnkeyedListEntry,
            PathArgument::Node(name.clone()),
        )
    }

    fn start_leaf_set(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.push_frame(Frame::LeafSet {
            name: name.clone(),
            values: Vec::with_capacity(count),
        })
    }

    fn leaf_set_entry(&mut self, value: &Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Frame::LeafSet { values, .. }) => {
                values.push(value.clone());
                Ok(())
            }
            _ => Err(Error::Stream("leaf-set entry outside of a leaf-set".into())),
        }
    }

    fn leaf(&mut self, name: &QName, value: &Value) -> Result<(), Error> {
        if matches!(
            self.stack.last(),
            Some(Frame::List { .. } | Frame::LeafSet { .. })
        ) {
            return Err(Error::Stream(format!("leaf {} inside a list", name)));
        }
        self.add(NormalizedNode::leaf(name.clone(), value.clone()))
    }

    fn end_node(&mut self) -> Result<(), Error> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::Stream("end without a matching start".into()))?;

        let node = match frame {
            Frame::Container {
                kind,
                identifier,
                children,
            } => {
                let container = DataContainerNode::new(identifier, children);
                match kind {
                    ContainerKind::Container => NormalizedNode::Container(container),
                    ContainerKind::Choice => NormalizedNode::Choice(container),
                    ContainerKind::MapEntry => NormalizedNode::MapEntry(container),
                    ContainerKind::UnkeyedListEntry => NormalizedNode::UnkeyedListEntry(container),
                }
            }
            Frame::List {
                keyed,
                name,
                entries,
            } => NormalizedNode::from_list(keyed, name, entries),
            Frame::LeafSet { name, values } => NormalizedNode::leaf_set(name, values),
        };

        self.add(node)
    }
}

/// Replays an existing tree into a writer.
pub fn write_node(
    node: &NormalizedNode,
    writer: &mut dyn NormalizedNodeStreamWriter,
) -> Result<(), Error> {
    match node {
        NormalizedNode::Leaf(leaf) => return writer.leaf(leaf.name(), leaf.value()),
        NormalizedNode::LeafSet(set) => {
            writer.start_leaf_set(node.name(), set.values().len())?;
            for value in set.values() {
                writer.leaf_set_entry(value)?;
            }
        }
        NormalizedNode::Map(list) | NormalizedNode::UnkeyedList(list) => {
            if matches!(node, NormalizedNode::Map(_)) {
                writer.start_map(list.name(), list.entries().len())?;
            } else {
                writer.start_unkeyed_list(list.name(), list.entries().len())?;
            }
            for entry in list.entries() {
                write_node(entry, writer)?;
            }
        }
        NormalizedNode::Container(c)
        | NormalizedNode::Choice(c)
        | NormalizedNode::MapEntry(c)
        | NormalizedNode::UnkeyedListEntry(c) => {
            let hint = c.children().count();
            match node {
                NormalizedNode::Container(_) => writer.start_container(node.name(), hint)?,
                NormalizedNode::Choice(_) => writer.start_choice(node.name(), hint)?,
                NormalizedNode::UnkeyedListEntry(_) => {
                    writer.start_unkeyed_list_item(node.name(), hint)?
                }
                _ => {
                    if let PathArgument::Entry { name, keys } = c.identifier() {
                        writer.start_map_entry(name, keys, hint)?
                    }
                }
            }
            for (_, child) in c.children() {
                write_node(child, writer)?;
            }
        }
    }

    writer.end_node()
}

#[cfg(test)]
mod tests {
    use super::{write_node, NormalizedNodeBuilder, NormalizedNodeStreamWriter};
    use crate::data::{KeyPredicates, NormalizedNode, Value};
    use crate::{Error, QName};
    use pretty_assertions::assert_eq;

    fn q(name: &str) -> QName {
        QName::new("urn:test", name)
    }

    fn sample() -> NormalizedNode {
        let keys: KeyPredicates = [(q("id"), Value::String("a".into()))].into_iter().collect();
        NormalizedNode::container(
            q("top"),
            [
                NormalizedNode::map(
                    q("item"),
                    [NormalizedNode::map_entry(
                        q("item"),
                        keys.clone(),
                        [
                            NormalizedNode::leaf(q("id"), Value::String("a".into())),
                            NormalizedNode::leaf_set(q("tags"), [Value::String("x".into())]),
                        ],
                    )],
                ),
                NormalizedNode::choice(
                    q("transport"),
                    [NormalizedNode::leaf(q("datagram-size"), Value::Uint32(9))],
                ),
                NormalizedNode::unkeyed_list(
                    q("history"),
                    [NormalizedNode::unkeyed_list_entry(q("history"), [])],
                ),
            ],
        )
    }

    #[test]
    fn replay_rebuilds_tree() {
        let tree = sample();
        let mut builder = NormalizedNodeBuilder::new();
        write_node(&tree, &mut builder).expect("replay must succeed");

        assert_eq!(tree, builder.finish().expect("must finish"));
    }

    #[test]
    fn unbalanced_end() {
        let mut builder = NormalizedNodeBuilder::new();
        assert!(matches!(builder.end_node(), Err(Error::Stream(_))));
    }

    #[test]
    fn unfinished() {
        let mut builder = NormalizedNodeBuilder::new();
        builder.start_container(&q("top"), 0).unwrap();
        assert!(matches!(builder.finish(), Err(Error::Stream(_))));
    }

    #[test]
    fn entry_outside_of_map() {
        let mut builder = NormalizedNodeBuilder::new();
        builder.start_container(&q("top"), 0).unwrap();
        let res = builder.start_map_entry(&q("item"), &KeyPredicates::new(), 0);
        assert!(matches!(res, Err(Error::Stream(_))));
    }

    #[test]
    fn duplicate_leaf() {
        let mut builder = NormalizedNodeBuilder::new();
        builder.start_container(&q("top"), 0).unwrap();
        builder.leaf(&q("a"), &Value::Boolean(true)).unwrap();
        let res = builder.leaf(&q("a"), &Value::Boolean(false));
        assert!(matches!(res, Err(Error::Stream(_))));
    }

    #[test]
    fn duplicate_map_entry() {
        let keys: KeyPredicates = [(q("id"), Value::String("a".into()))].into_iter().collect();
        let mut builder = NormalizedNodeBuilder::new();
        builder.start_map(&q("item"), 2).unwrap();
        builder.start_map_entry(&q("item"), &keys, 0).unwrap();
        builder.end_node().unwrap();
        builder.start_map_entry(&q("item"), &keys, 0).unwrap();
        assert!(matches!(builder.end_node(), Err(Error::Stream(_))));
    }

    #[test]
    fn unkeyed_entries_may_repeat() {
        let mut builder = NormalizedNodeBuilder::new();
        builder.start_unkeyed_list(&q("history"), 2).unwrap();
        for _ in 0..2 {
            builder.start_unkeyed_list_item(&q("history"), 0).unwrap();
            builder.end_node().unwrap();
        }
        builder.end_node().unwrap();
        assert_eq!(
            NormalizedNode::unkeyed_list(
                q("history"),
                [
                    NormalizedNode::unkeyed_list_entry(q("history"), []),
                    NormalizedNode::unkeyed_list_entry(q("history"), []),
                ],
            ),
            builder.finish().expect("must finish")
        );
    }
}
