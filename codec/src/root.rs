use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::binding::{BindingClass, BindingPathArgument, BindingRegistry, DataObject, InstanceIdentifier};
use crate::codec::{CachingCodec, CodecFactory, CodecNode, NodeKind};
use crate::config::CodecConfig;
use crate::data::{NormalizedNode, PathArgument, YangInstanceIdentifier};
use crate::query::{self, Query};
use crate::schema::SchemaContext;
use crate::{Error, QName};

#[derive(Clone, Debug)]
struct RpcCodecs {
    input: Arc<CodecNode>,
    output: Arc<CodecNode>,
}

/// Binds one schema snapshot to one set of generated types.
///
/// The context owns the whole codec tree. Nodes are built on first use and
/// live as long as the context; dropping it discards everything.
#[derive(Debug)]
pub struct BindingCodecContext {
    factory: Arc<CodecFactory>,
    root: Arc<CodecNode>,
    rpcs: RwLock<HashMap<QName, RpcCodecs>>,
}

impl BindingCodecContext {
    pub fn new(schema: Arc<SchemaContext>, registry: Arc<BindingRegistry>) -> Result<Self, Error> {
        Self::with_config(schema, registry, CodecConfig::default())
    }

    pub fn with_config(
        schema: Arc<SchemaContext>,
        registry: Arc<BindingRegistry>,
        config: CodecConfig,
    ) -> Result<Self, Error> {
        debug!(config = ?config, "creating binding codec context");
        let factory = Arc::new(CodecFactory::new(schema, registry, config));
        Ok(Self {
            root: CodecNode::root(factory.clone())?,
            factory,
            rpcs: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.factory.config
    }

    pub fn schema(&self) -> &Arc<SchemaContext> {
        &self.factory.schema
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.factory.registry
    }

    pub fn root(&self) -> &Arc<CodecNode> {
        &self.root
    }

    /// The codec for a top-level generated type.
    pub fn stream_child(&self, class: BindingClass) -> Result<Arc<CodecNode>, Error> {
        self.root.stream_child(class)
    }

    pub fn stream_child_of<T: 'static>(&self) -> Result<Arc<CodecNode>, Error> {
        self.stream_child(BindingClass::of::<T>())
    }

    /// Walks `path` from the root, returning the codec of its target and
    /// appending the equivalent generic arguments to `generic`.
    pub fn codec_for_path(
        &self,
        path: &InstanceIdentifier,
        mut generic: Option<&mut Vec<PathArgument>>,
    ) -> Result<Arc<CodecNode>, Error> {
        let mut node = self.root.clone();
        for arg in path.path_arguments() {
            node = node.binding_path_argument_child(arg, generic.as_deref_mut())?;
        }
        Ok(node)
    }

    /// Translates a typed path into a generic one. A path ending at an
    /// augmentation maps to the generic path of the augmented node.
    #[instrument(level = "trace", skip_all, fields(path = %path))]
    pub fn to_yang_instance_identifier(&self, path: &InstanceIdentifier) -> Result<YangInstanceIdentifier, Error> {
        let mut args = Vec::with_capacity(path.path_arguments().len());
        self.codec_for_path(path, Some(&mut args))?;
        Ok(args.into())
    }

    /// Translates a generic path into a typed one.
    ///
    /// Returns `None` if the path ends at a node without a typed step: a
    /// choice, or a keyed list without entry predicates.
    #[instrument(level = "trace", skip_all, fields(path = %path))]
    pub fn from_yang_instance_identifier(
        &self,
        path: &YangInstanceIdentifier,
    ) -> Result<Option<InstanceIdentifier>, Error> {
        let mut node = self.root.clone();
        let mut args = Vec::with_capacity(path.len());
        let mut representable = false;

        for arg in path.path_arguments() {
            let child = node.yang_path_argument_child(arg)?;
            if !Arc::ptr_eq(&child, &node) {
                args.extend(augmentation_steps(&node, &child));
            }

            match child.deserialize_path_argument(arg)? {
                Some(step) => {
                    args.push(step);
                    representable = true;
                }
                None => representable = false,
            }
            node = child;
        }

        if !representable {
            return Ok(None);
        }
        InstanceIdentifier::from_args(args).map(Some)
    }

    /// Converts a typed object located at `path` into its generic path and
    /// node.
    #[instrument(level = "trace", skip_all, fields(path = %path))]
    pub fn to_normalized_node(
        &self,
        path: &InstanceIdentifier,
        object: &dyn DataObject,
    ) -> Result<(YangInstanceIdentifier, NormalizedNode), Error> {
        let mut args = Vec::with_capacity(path.path_arguments().len());
        let node = self.codec_for_path(path, Some(&mut args))?;
        Ok((args.into(), node.serialize(object)?))
    }

    /// Converts a generic node located at `path` into a typed object.
    /// Returns `None` when the path has no typed representation.
    #[instrument(level = "trace", skip_all, fields(path = %path))]
    pub fn from_normalized_node(
        &self,
        path: &YangInstanceIdentifier,
        data: &Arc<NormalizedNode>,
    ) -> Result<Option<(InstanceIdentifier, Arc<dyn DataObject>)>, Error> {
        let typed = match self.from_yang_instance_identifier(path)? {
            Some(typed) => typed,
            None => return Ok(None),
        };
        let node = self.codec_for_path(&typed, None)?;
        let object = node.deserialize(data)?;
        Ok(Some((typed, object)))
    }

    /// Converts a top-level object.
    pub fn serialize(&self, object: &dyn DataObject) -> Result<NormalizedNode, Error> {
        self.stream_child(object.implemented_interface())?
            .serialize(object)
    }

    /// Converts a top-level generic node.
    pub fn deserialize(&self, data: &Arc<NormalizedNode>) -> Result<Arc<dyn DataObject>, Error> {
        self.root
            .yang_path_argument_child(&data.identifier())?
            .deserialize(data)
    }

    /// A caching codec over the top-level type `class`.
    pub fn create_caching_codec(
        &self,
        class: BindingClass,
        cached_types: HashSet<BindingClass>,
    ) -> Result<CachingCodec, Error> {
        Ok(self.stream_child(class)?.create_caching_codec(cached_types))
    }

    fn rpc_codecs(&self, rpc: &QName) -> Result<RpcCodecs, Error> {
        if let Some(codecs) = self.rpcs.read().get(rpc) {
            return Ok(codecs.clone());
        }

        let definition = self
            .factory
            .schema
            .rpc(rpc)
            .ok_or_else(|| Error::UnknownRpc(format!("{} is not defined", rpc)))?;
        let (input, output) = self
            .factory
            .registry
            .rpc_classes(rpc)
            .ok_or_else(|| Error::UnknownRpc(format!("{} has no binding", rpc)))?;

        let codecs = RpcCodecs {
            input: CodecNode::rpc(self.factory.clone(), rpc, definition.input.clone(), input)?,
            output: CodecNode::rpc(self.factory.clone(), rpc, definition.output.clone(), output)?,
        };
        debug!(rpc = %rpc, "built rpc codecs");
        Ok(self.rpcs.write().entry(rpc.clone()).or_insert(codecs).clone())
    }

    pub fn rpc_input_codec(&self, rpc: &QName) -> Result<Arc<CodecNode>, Error> {
        Ok(self.rpc_codecs(rpc)?.input)
    }

    pub fn rpc_output_codec(&self, rpc: &QName) -> Result<Arc<CodecNode>, Error> {
        Ok(self.rpc_codecs(rpc)?.output)
    }

    /// Runs `query` against `data`, the generic node found at the query's
    /// root, and converts every match into a typed object.
    #[instrument(level = "trace", skip_all, fields(root = %query.root()))]
    pub fn query_results(
        &self,
        query: &Query,
        data: &Arc<NormalizedNode>,
    ) -> Result<Vec<(InstanceIdentifier, Arc<dyn DataObject>)>, Error> {
        query::evaluate(query, data)
            .into_iter()
            .map(|(path, matched)| {
                self.from_normalized_node(&path, &matched)?.ok_or_else(|| {
                    Error::SchemaMismatch(format!("{} has no typed representation", path))
                })
            })
            .collect()
    }
}

/// The augmentation steps between `ancestor` and its descendant `node`,
/// outermost first. These have no generic counterpart.
fn augmentation_steps(ancestor: &Arc<CodecNode>, node: &Arc<CodecNode>) -> Vec<BindingPathArgument> {
    let mut steps = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if Arc::ptr_eq(&parent, ancestor) {
            break;
        }
        if let (NodeKind::Augmentation, Some(class)) = (parent.kind(), parent.binding_class()) {
            steps.push(BindingPathArgument::Augmentation { class });
        }
        current = parent.parent();
    }
    steps.reverse();
    steps
}
