//! The generic, schema-annotated tree representation and its paths.
mod node;
mod stream;
mod value;

pub use node::{
    DataContainerNode, KeyPredicates, LeafNode, LeafSetNode, ListNode, NormalizedNode,
    PathArgument, YangInstanceIdentifier,
};
pub use stream::{write_node, NormalizedNodeBuilder, NormalizedNodeStreamWriter};
pub use value::{Decimal64, Value};
