use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::error;

use super::caching::ObjectCache;
use super::{ChildRef, CodecNode};
use crate::binding::{BindingClass, BindingValue, DataObject};
use crate::data::{NormalizedNode, PathArgument};
use crate::Error;

/// A read-only view of a generic node as a data object. Children are
/// converted the first time they are accessed and remembered afterwards.
///
/// The whole subtree is validated before a view is handed out, so reading
/// a child cannot fail later. Lazy objects are only reachable through
/// [DataObject]; they cannot be downcast to the generated type they stand
/// in for.
pub struct LazyDataObject {
    node: Arc<CodecNode>,
    class: BindingClass,
    data: Arc<NormalizedNode>,
    cache: Option<Arc<ObjectCache>>,
    fields: Vec<OnceLock<Option<BindingValue>>>,
    augmentations: OnceLock<Vec<Arc<dyn DataObject>>>,
}

impl LazyDataObject {
    pub(crate) fn new(
        node: Arc<CodecNode>,
        data: Arc<NormalizedNode>,
        cache: Option<Arc<ObjectCache>>,
    ) -> Result<Self, Error> {
        let class = node.type_info()?.class;
        Ok(Self {
            fields: (0..node.slots().len()).map(|_| OnceLock::new()).collect(),
            augmentations: OnceLock::new(),
            node,
            class,
            data,
            cache,
        })
    }

    fn child_data(&self, index: usize) -> Option<&Arc<NormalizedNode>> {
        let name = self.node.slots()[index].qname().clone();
        self.node
            .container_of(&self.data)
            .ok()?
            .child(&PathArgument::Node(name))
    }

    fn load(&self, index: usize) -> Option<BindingValue> {
        let data = self.child_data(index)?;
        match self.node.read_slot(index, data, self.cache.as_ref(), true) {
            Ok((_, value)) => Some(value),
            Err(e) => {
                error!(node = %self.node, child = %data.name(), err = %e, "failed to read validated child");
                None
            }
        }
    }

    fn load_augmentations(&self) -> Vec<Arc<dyn DataObject>> {
        let container = match self.node.container_of(&self.data) {
            Ok(container) => container,
            Err(_) => return Vec::new(),
        };

        let mut present = vec![false; self.node.augmentation_count()];
        for (arg, _) in container.children() {
            if let Some(ChildRef::Augmentation(index)) = self.node.child_ref(arg.node_type()) {
                present[index] = true;
            }
        }

        present
            .into_iter()
            .enumerate()
            .filter(|(_, present)| *present)
            .filter_map(|(index, _)| {
                let result = self
                    .node
                    .augmentation_node(index)
                    .and_then(|aug| aug.deserialize_checked(&self.data, self.cache.as_ref(), true));
                match result {
                    Ok(augmentation) => Some(augmentation),
                    Err(e) => {
                        error!(node = %self.node, err = %e, "failed to read validated augmentation");
                        None
                    }
                }
            })
            .collect()
    }

    /// Converts every child not read yet, so that the view no longer needs
    /// the cache it was created with.
    pub(crate) fn materialize(&self) {
        for (index, field) in self.fields.iter().enumerate() {
            field.get_or_init(|| self.load(index));
        }
        self.augmentations.get_or_init(|| self.load_augmentations());
    }
}

impl DataObject for LazyDataObject {
    fn implemented_interface(&self) -> BindingClass {
        self.class
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        let index = self.node.slot_for_accessor(accessor)?;
        self.fields[index].get_or_init(|| self.load(index)).clone()
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.node
            .slots()
            .iter()
            .filter_map(|slot| slot.accessor())
            .collect()
    }

    fn augmentations(&self) -> Vec<Arc<dyn DataObject>> {
        self.augmentations
            .get_or_init(|| self.load_augmentations())
            .clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for LazyDataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyDataObject({} over {})", self.class, self.data.name())
    }
}
