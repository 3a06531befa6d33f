use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

use super::{CodecNode, LazyDataObject};
use crate::binding::{BindingClass, DataObject};
use crate::data::NormalizedNode;
use crate::Error;

/// Identifies one generic node by address, together with the type it was
/// read as. Holding the `Arc` keeps the address from being reused while
/// the entry is alive.
#[derive(Clone, Debug)]
struct NodeKey(Arc<NormalizedNode>, BindingClass);

impl PartialEq for NodeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) && self.1 == other.1
    }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
        self.1.hash(state);
    }
}

/// The memo table behind one [CachingCodec].
#[derive(Debug)]
pub(crate) struct ObjectCache {
    cached_types: HashSet<BindingClass>,
    entries: RwLock<HashMap<NodeKey, Arc<dyn DataObject>>>,
    /// Lazy views read through this cache, materialized on close. `closed`
    /// only flips while this lock is held.
    views: Mutex<Vec<Weak<LazyDataObject>>>,
    closing: Mutex<()>,
    closed: AtomicBool,
}

impl ObjectCache {
    fn new(cached_types: HashSet<BindingClass>) -> Self {
        Self {
            cached_types,
            entries: RwLock::new(HashMap::new()),
            views: Mutex::new(Vec::new()),
            closing: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn check_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::InvalidatedCodec)
        } else {
            Ok(())
        }
    }

    /// Returns the object previously read from `data` by `node`, or builds
    /// and remembers it if `node`'s type is one of the cached ones.
    pub(crate) fn get_or_build(
        &self,
        node: &CodecNode,
        data: &Arc<NormalizedNode>,
        build: impl FnOnce() -> Result<Arc<dyn DataObject>, Error>,
    ) -> Result<Arc<dyn DataObject>, Error> {
        self.check_open()?;

        let class = match node.binding_class() {
            Some(class) if self.cached_types.contains(&class) => class,
            _ => return build(),
        };

        let key = NodeKey(data.clone(), class);
        if let Some(hit) = self.entries.read().get(&key) {
            trace!(class = %class, "cache hit");
            return Ok(hit.clone());
        }

        let built = build()?;
        Ok(self.entries.write().entry(key).or_insert(built).clone())
    }

    /// Remembers a lazy view still depending on this cache.
    pub(crate) fn register_view(&self, view: &Arc<LazyDataObject>) -> Result<(), Error> {
        let mut views = self.views.lock();
        self.check_open()?;
        if views.len() == views.capacity() {
            views.retain(|v| v.strong_count() > 0);
        }
        views.push(Arc::downgrade(view));
        Ok(())
    }

    /// Materializes every live view, then invalidates the cache. Views
    /// created while materializing are picked up by the next round.
    /// Returns false if the cache was already closed.
    fn close(&self) -> bool {
        let _closing = self.closing.lock();
        loop {
            let pending = {
                let mut views = self.views.lock();
                if views.is_empty() {
                    if self.closed.swap(true, Ordering::AcqRel) {
                        return false;
                    }
                    break;
                }
                std::mem::take(&mut *views)
            };
            for view in pending.iter().filter_map(Weak::upgrade) {
                view.materialize();
            }
        }
        self.entries.write().clear();
        true
    }
}

/// A decorator over a [CodecNode] memoizing deserialized objects of a set
/// of types, keyed by the identity of the generic node they were read from.
///
/// Each instance owns its cache. After [CachingCodec::close] every call
/// fails with [Error::InvalidatedCodec].
#[derive(Debug)]
pub struct CachingCodec {
    node: Arc<CodecNode>,
    cache: Arc<ObjectCache>,
}

impl CachingCodec {
    pub(crate) fn new(node: Arc<CodecNode>, cached_types: HashSet<BindingClass>) -> Self {
        debug!(node = %node, types = cached_types.len(), "created caching codec");
        Self {
            node,
            cache: Arc::new(ObjectCache::new(cached_types)),
        }
    }

    pub fn node(&self) -> &Arc<CodecNode> {
        &self.node
    }

    pub fn deserialize(&self, data: &Arc<NormalizedNode>) -> Result<Arc<dyn DataObject>, Error> {
        self.cache.check_open()?;
        self.node.deserialize_with(data, Some(&self.cache))
    }

    pub fn serialize(&self, object: &dyn DataObject) -> Result<NormalizedNode, Error> {
        self.cache.check_open()?;
        self.node.serialize(object)
    }

    /// Invalidates this codec and drops everything it cached. Lazy objects
    /// read through it are fully converted first and stay readable.
    pub fn close(&self) {
        if self.cache.close() {
            debug!(node = %self.node, "closed caching codec");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cache.closed.load(Ordering::Acquire)
    }

    /// Number of objects currently remembered.
    pub fn cached_len(&self) -> usize {
        self.cache.entries.read().len()
    }
}
