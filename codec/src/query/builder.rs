use smol_str::SmolStr;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::{Pattern, Query, QueryPredicate};
use crate::binding::{BindingClass, BindingKey, BindingPathArgument, BindingScalar, InstanceIdentifier};
use crate::codec::CodecNode;
use crate::data::{PathArgument, Value, YangInstanceIdentifier};
use crate::value::ValueCodec;
use crate::{BindingCodecContext, Error};

/// A typed reference to the accessor `accessor` of generated type `D`,
/// returning values of type `T`. Emitted by the code generator as
/// associated constants of the generated types.
pub struct LeafReference<D, T> {
    accessor: &'static str,
    _marker: PhantomData<fn() -> (D, T)>,
}

impl<D, T> LeafReference<D, T> {
    pub const fn new(accessor: &'static str) -> Self {
        Self {
            accessor,
            _marker: PhantomData,
        }
    }

    pub fn accessor(&self) -> &'static str {
        self.accessor
    }
}

impl<D, T> Clone for LeafReference<D, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, T> Copy for LeafReference<D, T> {}

impl<D, T> fmt::Debug for LeafReference<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LeafReference({}::{})",
            std::any::type_name::<D>(),
            self.accessor
        )
    }
}

/// Selects the subtree a query returns, one typed step at a time.
///
/// ```ignore
/// let query = QueryBuilder::new(&context, InstanceIdentifier::builder::<Top>().build())?
///     .extract_child::<Item>()?
///     .matching()
///     .leaf(Item::COUNT)?
///     .exists()
///     .build();
/// ```
pub struct QueryBuilder<'a> {
    context: &'a BindingCodecContext,
    root: YangInstanceIdentifier,
    select: Vec<PathArgument>,
    target: Arc<CodecNode>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(context: &'a BindingCodecContext, root: InstanceIdentifier) -> Result<Self, Error> {
        let mut generic = Vec::new();
        let target = context.codec_for_path(&root, Some(&mut generic))?;
        Ok(Self {
            context,
            root: generic.into(),
            select: Vec::new(),
            target,
        })
    }

    fn step(mut self, arg: BindingPathArgument) -> Result<Self, Error> {
        self.target = self
            .target
            .binding_path_argument_child(&arg, Some(&mut self.select))?;
        Ok(self)
    }

    /// Descends into a container or list. Lists select every entry.
    pub fn extract_child<T: 'static>(self) -> Result<Self, Error> {
        self.step(BindingPathArgument::item(BindingClass::of::<T>()))
    }

    /// Descends into one entry of a keyed list.
    pub fn extract_keyed_child<T: 'static>(self, key: impl Into<BindingKey>) -> Result<Self, Error> {
        self.step(BindingPathArgument::KeyedItem {
            class: BindingClass::of::<T>(),
            case: None,
            key: key.into(),
        })
    }

    /// Descends into a child of case `C`.
    pub fn extract_case_child<C: 'static, T: 'static>(self) -> Result<Self, Error> {
        self.step(BindingPathArgument::Item {
            class: BindingClass::of::<T>(),
            case: Some(BindingClass::of::<C>()),
        })
    }

    /// Starts adding predicates on the selected nodes.
    pub fn matching(self) -> MatchBuilder<'a> {
        MatchBuilder {
            context: self.context,
            root: self.root,
            select: self.select.into(),
            base: self.target.clone(),
            base_path: Vec::new(),
            target: self.target,
            predicates: Vec::new(),
        }
    }
}

/// Adds predicates on the nodes selected by a [QueryBuilder].
pub struct MatchBuilder<'a> {
    context: &'a BindingCodecContext,
    root: YangInstanceIdentifier,
    select: YangInstanceIdentifier,
    target: Arc<CodecNode>,
    /// Where the next leaf is looked up, and its path below `target`.
    base: Arc<CodecNode>,
    base_path: Vec<PathArgument>,
    predicates: Vec<QueryPredicate>,
}

impl<'a> MatchBuilder<'a> {
    pub fn context(&self) -> &'a BindingCodecContext {
        self.context
    }

    /// Moves the lookup of the next leaf into a child container.
    pub fn child_object<N: 'static>(mut self) -> Result<Self, Error> {
        let arg = BindingPathArgument::item(BindingClass::of::<N>());
        self.base = self
            .base
            .binding_path_argument_child(&arg, Some(&mut self.base_path))?;
        Ok(self)
    }

    /// Selects the leaf `reference` points to. The reference must resolve
    /// to exactly one leaf declared by the current type, one of its
    /// augmentations, or one of its cases.
    pub fn leaf<D: 'static, T>(self, reference: LeafReference<D, T>) -> Result<ValueMatchBuilder<'a, T>, Error> {
        let (relative, codec) = self
            .base
            .leaf_for_accessor(BindingClass::of::<D>(), reference.accessor)?;
        let mut path = self.base_path.clone();
        path.extend(relative);
        debug!(accessor = reference.accessor, path = ?path, "resolved leaf reference");

        Ok(ValueMatchBuilder {
            builder: self,
            path: path.into(),
            codec,
            scope: Scope::Leaf,
            negated: false,
            _marker: PhantomData,
        })
    }

    /// Selects the leaf-list `reference` points to, resolved like
    /// [MatchBuilder::leaf].
    pub fn leaf_list<D: 'static, T>(
        self,
        reference: LeafReference<D, Vec<T>>,
    ) -> Result<LeafListMatchBuilder<'a, T>, Error> {
        let (relative, codec) = self
            .base
            .leaf_list_for_accessor(BindingClass::of::<D>(), reference.accessor)?;
        let mut path = self.base_path.clone();
        path.extend(relative);
        debug!(accessor = reference.accessor, path = ?path, "resolved leaf-list reference");

        Ok(LeafListMatchBuilder {
            builder: self,
            path: path.into(),
            codec,
            _marker: PhantomData,
        })
    }
}

/// Chooses how the entries of a leaf-list selected by
/// [MatchBuilder::leaf_list] are matched.
pub struct LeafListMatchBuilder<'a, T> {
    builder: MatchBuilder<'a>,
    path: YangInstanceIdentifier,
    codec: Arc<dyn ValueCodec>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> LeafListMatchBuilder<'a, T> {
    fn entries(self, scope: Scope) -> ValueMatchBuilder<'a, T> {
        ValueMatchBuilder {
            builder: self.builder,
            path: self.path,
            codec: self.codec,
            scope,
            negated: false,
            _marker: PhantomData,
        }
    }

    /// The condition that follows has to hold for every entry. An absent
    /// leaf-list never matches.
    pub fn all_match(self) -> ValueMatchBuilder<'a, T> {
        self.entries(Scope::All)
    }

    /// The condition that follows has to hold for at least one entry.
    pub fn any_match(self) -> ValueMatchBuilder<'a, T> {
        self.entries(Scope::Any)
    }

    pub fn exists(mut self) -> ValueMatch<'a> {
        let path = self.path.clone();
        self.builder.predicates.push(QueryPredicate::Exists { path });
        ValueMatch {
            builder: self.builder,
        }
    }

    pub fn not_exists(mut self) -> ValueMatch<'a> {
        let path = self.path.clone();
        self.builder.predicates.push(QueryPredicate::NotExists { path });
        ValueMatch {
            builder: self.builder,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Scope {
    Leaf,
    All,
    Any,
}

/// Chooses the condition on a leaf selected by [MatchBuilder::leaf], or on
/// the entries of a leaf-list.
pub struct ValueMatchBuilder<'a, T> {
    builder: MatchBuilder<'a>,
    path: YangInstanceIdentifier,
    codec: Arc<dyn ValueCodec>,
    scope: Scope,
    negated: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ValueMatchBuilder<'a, T> {
    /// Adds the condition `make` builds for a leaf path. Leaf-list entries
    /// are tested with an empty path below the leaf-list predicate.
    fn with(self, make: impl FnOnce(YangInstanceIdentifier) -> QueryPredicate) -> ValueMatch<'a> {
        let Self {
            mut builder,
            path,
            scope,
            negated,
            ..
        } = self;

        let own = match scope {
            Scope::Leaf => path.clone(),
            Scope::All | Scope::Any => YangInstanceIdentifier::default(),
        };
        let mut predicate = make(own);
        if negated {
            predicate = QueryPredicate::Not(Box::new(predicate));
        }
        let predicate = match scope {
            Scope::Leaf => predicate,
            Scope::All => QueryPredicate::AllMatch {
                path,
                predicate: Box::new(predicate),
            },
            Scope::Any => QueryPredicate::AnyMatch {
                path,
                predicate: Box::new(predicate),
            },
        };
        debug!(predicate = %predicate, "added query predicate");

        builder.predicates.push(predicate);
        ValueMatch { builder }
    }

    fn converted(&self, value: T) -> Result<Value, Error>
    where
        T: Into<BindingScalar>,
    {
        self.codec.serialize(&value.into())
    }

    /// Inverts the condition that follows.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn exists(self) -> ValueMatch<'a> {
        self.with(|path| QueryPredicate::Exists { path })
    }

    pub fn not_exists(self) -> ValueMatch<'a> {
        self.with(|path| QueryPredicate::NotExists { path })
    }

    pub fn value_equals(self, value: T) -> Result<ValueMatch<'a>, Error>
    where
        T: Into<BindingScalar>,
    {
        let value = self.converted(value)?;
        Ok(self.with(|path| QueryPredicate::ValueEquals { path, value }))
    }

    pub fn greater_than(self, value: T) -> Result<ValueMatch<'a>, Error>
    where
        T: Into<BindingScalar> + PartialOrd,
    {
        let value = self.converted(value)?;
        Ok(self.with(|path| QueryPredicate::GreaterThan { path, value }))
    }

    pub fn greater_than_or_equal(self, value: T) -> Result<ValueMatch<'a>, Error>
    where
        T: Into<BindingScalar> + PartialOrd,
    {
        let value = self.converted(value)?;
        Ok(self.with(|path| QueryPredicate::GreaterThanOrEqual { path, value }))
    }

    pub fn less_than(self, value: T) -> Result<ValueMatch<'a>, Error>
    where
        T: Into<BindingScalar> + PartialOrd,
    {
        let value = self.converted(value)?;
        Ok(self.with(|path| QueryPredicate::LessThan { path, value }))
    }

    pub fn less_than_or_equal(self, value: T) -> Result<ValueMatch<'a>, Error>
    where
        T: Into<BindingScalar> + PartialOrd,
    {
        let value = self.converted(value)?;
        Ok(self.with(|path| QueryPredicate::LessThanOrEqual { path, value }))
    }

    pub fn starts_with(self, prefix: impl Into<SmolStr>) -> ValueMatch<'a>
    where
        T: AsRef<str>,
    {
        let value = prefix.into();
        self.with(|path| QueryPredicate::StartsWith { path, value })
    }

    pub fn ends_with(self, suffix: impl Into<SmolStr>) -> ValueMatch<'a>
    where
        T: AsRef<str>,
    {
        let value = suffix.into();
        self.with(|path| QueryPredicate::EndsWith { path, value })
    }

    pub fn contains(self, needle: impl Into<SmolStr>) -> ValueMatch<'a>
    where
        T: AsRef<str>,
    {
        let value = needle.into();
        self.with(|path| QueryPredicate::Contains { path, value })
    }

    /// Matches string values against a regular expression, anchored at
    /// both ends.
    pub fn matches_pattern(self, pattern: &str) -> Result<ValueMatch<'a>, Error>
    where
        T: AsRef<str>,
    {
        let pattern = Pattern::new(pattern)?;
        Ok(self.with(|path| QueryPredicate::MatchesPattern { path, pattern }))
    }
}

/// A query with at least one predicate, ready to be built or extended.
pub struct ValueMatch<'a> {
    builder: MatchBuilder<'a>,
}

impl<'a> ValueMatch<'a> {
    /// Adds another predicate, looked up from the selected type again.
    pub fn and(mut self) -> MatchBuilder<'a> {
        self.builder.base = self.builder.target.clone();
        self.builder.base_path.clear();
        self.builder
    }

    pub fn build(self) -> Query {
        let MatchBuilder {
            root,
            select,
            predicates,
            ..
        } = self.builder;
        Query::new(root, select, predicates)
    }
}
