use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use super::Value;
use crate::{Error, QName};

/// Key leaf values identifying one entry of a keyed list.
pub type KeyPredicates = BTreeMap<QName, Value>;

/// A single step of a [YangInstanceIdentifier].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathArgument {
    /// A container, choice, leaf, leaf-list or a list as a whole.
    Node(QName),
    /// One entry of a keyed list.
    Entry { name: QName, keys: KeyPredicates },
    /// One entry of a leaf-list.
    Value { name: QName, value: Value },
}

impl PathArgument {
    pub fn entry(name: QName, keys: impl IntoIterator<Item = (QName, Value)>) -> Self {
        PathArgument::Entry {
            name,
            keys: keys.into_iter().collect(),
        }
    }

    pub fn node_type(&self) -> &QName {
        match self {
            PathArgument::Node(name) => name,
            PathArgument::Entry { name, .. } => name,
            PathArgument::Value { name, .. } => name,
        }
    }
}

impl Display for PathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathArgument::Node(name) => write!(f, "{}", name),
            PathArgument::Entry { name, keys } => {
                write!(f, "{}[", name)?;
                for (i, (k, v)) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}={}", k.local_name(), v)?;
                }
                write!(f, "]")
            }
            PathArgument::Value { name, value } => write!(f, "{}[.={}]", name, value),
        }
    }
}

impl Debug for PathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A path into the generic tree, as a sequence of [PathArgument]s starting
/// at the datastore root.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YangInstanceIdentifier(Vec<PathArgument>);

impl YangInstanceIdentifier {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns a new identifier with `arg` appended.
    pub fn node(&self, arg: PathArgument) -> Self {
        let mut args = self.0.clone();
        args.push(arg);
        Self(args)
    }

    pub fn path_arguments(&self) -> &[PathArgument] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&PathArgument> {
        self.0.last()
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Returns the arguments of `self` following `ancestor`.
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, Error> {
        match self.0.strip_prefix(ancestor.0.as_slice()) {
            Some(rest) => Ok(Self(rest.to_vec())),
            None => Err(Error::NotAncestor {
                ancestor: ancestor.to_string(),
                path: self.to_string(),
            }),
        }
    }

    /// Appends all arguments of a relative identifier.
    pub fn join(&self, relative: &Self) -> Self {
        Self(self.0.iter().chain(relative.0.iter()).cloned().collect())
    }
}

impl From<Vec<PathArgument>> for YangInstanceIdentifier {
    fn from(value: Vec<PathArgument>) -> Self {
        Self(value)
    }
}

impl FromIterator<PathArgument> for YangInstanceIdentifier {
    fn from_iter<T: IntoIterator<Item = PathArgument>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for YangInstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

impl Debug for YangInstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A node holding child nodes, keyed by their [PathArgument].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataContainerNode {
    identifier: PathArgument,
    children: BTreeMap<PathArgument, Arc<NormalizedNode>>,
}

impl DataContainerNode {
    pub fn new(identifier: PathArgument, children: BTreeMap<PathArgument, Arc<NormalizedNode>>) -> Self {
        Self {
            identifier,
            children,
        }
    }

    pub fn identifier(&self) -> &PathArgument {
        &self.identifier
    }

    pub fn children(&self) -> impl Iterator<Item = (&PathArgument, &Arc<NormalizedNode>)> {
        self.children.iter()
    }

    pub fn child(&self, arg: &PathArgument) -> Option<&Arc<NormalizedNode>> {
        self.children.get(arg)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A keyed or unkeyed list, holding its entries in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListNode {
    name: QName,
    entries: Vec<Arc<NormalizedNode>>,
}

impl ListNode {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn entries(&self) -> &[Arc<NormalizedNode>] {
        &self.entries
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNode {
    name: QName,
    value: Value,
}

impl LeafNode {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafSetNode {
    name: QName,
    values: Vec<Value>,
}

impl LeafSetNode {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// The generic, schema-annotated tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedNode {
    Container(DataContainerNode),
    Choice(DataContainerNode),
    MapEntry(DataContainerNode),
    UnkeyedListEntry(DataContainerNode),
    Map(ListNode),
    UnkeyedList(ListNode),
    Leaf(LeafNode),
    LeafSet(LeafSetNode),
}

fn keyed_children(
    children: impl IntoIterator<Item = NormalizedNode>,
) -> BTreeMap<PathArgument, Arc<NormalizedNode>> {
    children
        .into_iter()
        .map(|child| (child.identifier(), Arc::new(child)))
        .collect()
}

impl NormalizedNode {
    pub fn container(name: QName, children: impl IntoIterator<Item = NormalizedNode>) -> Self {
        NormalizedNode::Container(DataContainerNode::new(
            PathArgument::Node(name),
            keyed_children(children),
        ))
    }

    pub fn choice(name: QName, children: impl IntoIterator<Item = NormalizedNode>) -> Self {
        NormalizedNode::Choice(DataContainerNode::new(
            PathArgument::Node(name),
            keyed_children(children),
        ))
    }

    pub fn map(name: QName, entries: impl IntoIterator<Item = NormalizedNode>) -> Self {
        NormalizedNode::Map(ListNode {
            name,
            entries: entries.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn map_entry(
        name: QName,
        keys: KeyPredicates,
        children: impl IntoIterator<Item = NormalizedNode>,
    ) -> Self {
        NormalizedNode::MapEntry(DataContainerNode::new(
            PathArgument::Entry { name, keys },
            keyed_children(children),
        ))
    }

    pub fn unkeyed_list(name: QName, entries: impl IntoIterator<Item = NormalizedNode>) -> Self {
        NormalizedNode::UnkeyedList(ListNode {
            name,
            entries: entries.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn unkeyed_list_entry(name: QName, children: impl IntoIterator<Item = NormalizedNode>) -> Self {
        NormalizedNode::UnkeyedListEntry(DataContainerNode::new(
            PathArgument::Node(name),
            keyed_children(children),
        ))
    }

    pub fn leaf(name: QName, value: Value) -> Self {
        NormalizedNode::Leaf(LeafNode { name, value })
    }

    pub fn leaf_set(name: QName, values: impl IntoIterator<Item = Value>) -> Self {
        NormalizedNode::LeafSet(LeafSetNode {
            name,
            values: values.into_iter().collect(),
        })
    }

    pub(crate) fn from_list(keyed: bool, name: QName, entries: Vec<Arc<NormalizedNode>>) -> Self {
        let list = ListNode { name, entries };
        if keyed {
            NormalizedNode::Map(list)
        } else {
            NormalizedNode::UnkeyedList(list)
        }
    }

    pub fn name(&self) -> &QName {
        match self {
            NormalizedNode::Container(c)
            | NormalizedNode::Choice(c)
            | NormalizedNode::MapEntry(c)
            | NormalizedNode::UnkeyedListEntry(c) => c.identifier.node_type(),
            NormalizedNode::Map(l) | NormalizedNode::UnkeyedList(l) => &l.name,
            NormalizedNode::Leaf(l) => &l.name,
            NormalizedNode::LeafSet(l) => &l.name,
        }
    }

    /// The argument under which this node is stored in its parent.
    pub fn identifier(&self) -> PathArgument {
        match self {
            NormalizedNode::MapEntry(c) => c.identifier.clone(),
            _ => PathArgument::Node(self.name().clone()),
        }
    }

    pub fn as_data_container(&self) -> Option<&DataContainerNode> {
        match self {
            NormalizedNode::Container(c)
            | NormalizedNode::Choice(c)
            | NormalizedNode::MapEntry(c)
            | NormalizedNode::UnkeyedListEntry(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            NormalizedNode::Map(l) | NormalizedNode::UnkeyedList(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the value of a leaf node.
    pub fn value(&self) -> Option<&Value> {
        match self {
            NormalizedNode::Leaf(l) => Some(&l.value),
            _ => None,
        }
    }

    /// Looks up a direct child by its argument.
    pub fn child(&self, arg: &PathArgument) -> Option<&Arc<NormalizedNode>> {
        match self {
            NormalizedNode::Map(l) | NormalizedNode::UnkeyedList(l) => {
                l.entries.iter().find(|e| &e.identifier() == arg)
            }
            _ => self.as_data_container()?.child(arg),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NormalizedNode::Container(_) => "container",
            NormalizedNode::Choice(_) => "choice",
            NormalizedNode::MapEntry(_) => "map entry",
            NormalizedNode::UnkeyedListEntry(_) => "unkeyed list entry",
            NormalizedNode::Map(_) => "map",
            NormalizedNode::UnkeyedList(_) => "unkeyed list",
            NormalizedNode::Leaf(_) => "leaf",
            NormalizedNode::LeafSet(_) => "leaf-set",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PathArgument, YangInstanceIdentifier};
    use crate::{data::Value, Error, QName};

    fn q(name: &str) -> QName {
        QName::new("urn:test", name)
    }

    #[test]
    fn relative_to_prefix() {
        let a: YangInstanceIdentifier = vec![PathArgument::Node(q("top"))].into();
        let b = a.node(PathArgument::entry(
            q("item"),
            [(q("id"), Value::String("x".into()))],
        ));

        let rel = b.relative_to(&a).expect("must be relative");
        assert_eq!(1, rel.len());
        assert_eq!(b, a.join(&rel));
    }

    #[test]
    fn relative_to_not_ancestor() {
        let a: YangInstanceIdentifier = vec![PathArgument::Node(q("top"))].into();
        let b: YangInstanceIdentifier = vec![PathArgument::Node(q("other"))].into();

        assert!(matches!(b.relative_to(&a), Err(Error::NotAncestor { .. })));
    }

    #[test]
    fn display() {
        let ii: YangInstanceIdentifier = vec![
            PathArgument::Node(q("top")),
            PathArgument::entry(q("item"), [(q("id"), Value::String("a".into()))]),
        ]
        .into();
        assert_eq!(
            "/(urn:test)top/(urn:test)item[id=\"a\"]",
            ii.to_string()
        );
    }
}
