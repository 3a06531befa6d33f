//! Queries over the generic tree, built from typed references.
use regex::Regex;
use smol_str::SmolStr;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::Arc;
use tracing::trace;

use crate::data::{Decimal64, NormalizedNode, PathArgument, Value, YangInstanceIdentifier};
use crate::Error;

mod builder;

pub use builder::{
    LeafListMatchBuilder, LeafReference, MatchBuilder, QueryBuilder, ValueMatch, ValueMatchBuilder,
};

/// A regular expression a whole string value has to match.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: SmolStr,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| Error::InvalidValue(format!("pattern {}: {}", source, e)))?;
        Ok(Self {
            source: source.into(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// A condition on a leaf, addressed relative to the selected node.
///
/// Ordering predicates hold when the leaf's value compares to `value` as
/// named, and only between values of the same type. String predicates
/// never hold for non-string values. Conditions nested in
/// [QueryPredicate::AllMatch] and [QueryPredicate::AnyMatch] have an empty
/// path and are tested against each entry of the leaf-list at `path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryPredicate {
    Exists { path: YangInstanceIdentifier },
    NotExists { path: YangInstanceIdentifier },
    ValueEquals { path: YangInstanceIdentifier, value: Value },
    GreaterThan { path: YangInstanceIdentifier, value: Value },
    GreaterThanOrEqual { path: YangInstanceIdentifier, value: Value },
    LessThan { path: YangInstanceIdentifier, value: Value },
    LessThanOrEqual { path: YangInstanceIdentifier, value: Value },
    StartsWith { path: YangInstanceIdentifier, value: SmolStr },
    EndsWith { path: YangInstanceIdentifier, value: SmolStr },
    Contains { path: YangInstanceIdentifier, value: SmolStr },
    MatchesPattern { path: YangInstanceIdentifier, pattern: Pattern },
    Not(Box<QueryPredicate>),
    AllMatch {
        path: YangInstanceIdentifier,
        predicate: Box<QueryPredicate>,
    },
    AnyMatch {
        path: YangInstanceIdentifier,
        predicate: Box<QueryPredicate>,
    },
}

impl QueryPredicate {
    pub fn path(&self) -> &YangInstanceIdentifier {
        match self {
            QueryPredicate::Exists { path }
            | QueryPredicate::NotExists { path }
            | QueryPredicate::ValueEquals { path, .. }
            | QueryPredicate::GreaterThan { path, .. }
            | QueryPredicate::GreaterThanOrEqual { path, .. }
            | QueryPredicate::LessThan { path, .. }
            | QueryPredicate::LessThanOrEqual { path, .. }
            | QueryPredicate::StartsWith { path, .. }
            | QueryPredicate::EndsWith { path, .. }
            | QueryPredicate::Contains { path, .. }
            | QueryPredicate::MatchesPattern { path, .. }
            | QueryPredicate::AllMatch { path, .. }
            | QueryPredicate::AnyMatch { path, .. } => path,
            QueryPredicate::Not(inner) => inner.path(),
        }
    }

    /// Evaluates the predicate against a selected node.
    pub fn test(&self, node: &NormalizedNode) -> bool {
        match self {
            QueryPredicate::Not(inner) => !inner.test(node),
            QueryPredicate::AllMatch { path, predicate } => match find(node, path) {
                Some(NormalizedNode::LeafSet(set)) => {
                    set.values().iter().all(|v| predicate.test_value(Some(v)))
                }
                _ => false,
            },
            QueryPredicate::AnyMatch { path, predicate } => match find(node, path) {
                Some(NormalizedNode::LeafSet(set)) => {
                    set.values().iter().any(|v| predicate.test_value(Some(v)))
                }
                _ => false,
            },
            _ => self.test_value(find(node, self.path()).and_then(|l| l.value())),
        }
    }

    /// Evaluates the condition against a leaf value, `None` if the leaf is
    /// absent.
    fn test_value(&self, value: Option<&Value>) -> bool {
        let text = || as_text(value);
        match self {
            QueryPredicate::Exists { .. } => value.is_some(),
            QueryPredicate::NotExists { .. } => value.is_none(),
            QueryPredicate::ValueEquals { value: expected, .. } => value == Some(expected),
            QueryPredicate::GreaterThan { value: bound, .. } => {
                compare(value, bound).is_some_and(Ordering::is_gt)
            }
            QueryPredicate::GreaterThanOrEqual { value: bound, .. } => {
                compare(value, bound).is_some_and(Ordering::is_ge)
            }
            QueryPredicate::LessThan { value: bound, .. } => {
                compare(value, bound).is_some_and(Ordering::is_lt)
            }
            QueryPredicate::LessThanOrEqual { value: bound, .. } => {
                compare(value, bound).is_some_and(Ordering::is_le)
            }
            QueryPredicate::StartsWith { value: prefix, .. } => {
                text().is_some_and(|s| s.starts_with(prefix.as_str()))
            }
            QueryPredicate::EndsWith { value: suffix, .. } => {
                text().is_some_and(|s| s.ends_with(suffix.as_str()))
            }
            QueryPredicate::Contains { value: needle, .. } => {
                text().is_some_and(|s| s.contains(needle.as_str()))
            }
            QueryPredicate::MatchesPattern { pattern, .. } => {
                text().is_some_and(|s| pattern.is_match(s))
            }
            QueryPredicate::Not(inner) => !inner.test_value(value),
            // leaf-lists do not nest
            QueryPredicate::AllMatch { .. } | QueryPredicate::AnyMatch { .. } => false,
        }
    }
}

fn as_text(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Orders a leaf value against a bound of the same type.
fn compare(value: Option<&Value>, bound: &Value) -> Option<Ordering> {
    let value = value?;
    match (value, bound) {
        (Value::Decimal64(l), Value::Decimal64(r)) => Some(compare_decimal(l, r)),
        _ if mem::discriminant(value) == mem::discriminant(bound) => Some(value.cmp(bound)),
        _ => None,
    }
}

fn compare_decimal(left: &Decimal64, right: &Decimal64) -> Ordering {
    let scale = left.scale().max(right.scale());
    let widen = |d: &Decimal64| d.unscaled() as i128 * 10i128.pow((scale - d.scale()) as u32);
    widen(left).cmp(&widen(right))
}

impl fmt::Display for QueryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPredicate::Exists { path } => write!(f, "exists({})", path),
            QueryPredicate::NotExists { path } => write!(f, "not-exists({})", path),
            QueryPredicate::ValueEquals { path, value } => write!(f, "{} = {}", path, value),
            QueryPredicate::GreaterThan { path, value } => write!(f, "{} > {}", path, value),
            QueryPredicate::GreaterThanOrEqual { path, value } => write!(f, "{} >= {}", path, value),
            QueryPredicate::LessThan { path, value } => write!(f, "{} < {}", path, value),
            QueryPredicate::LessThanOrEqual { path, value } => write!(f, "{} <= {}", path, value),
            QueryPredicate::StartsWith { path, value } => {
                write!(f, "starts-with({}, {:?})", path, value)
            }
            QueryPredicate::EndsWith { path, value } => {
                write!(f, "ends-with({}, {:?})", path, value)
            }
            QueryPredicate::Contains { path, value } => {
                write!(f, "contains({}, {:?})", path, value)
            }
            QueryPredicate::MatchesPattern { path, pattern } => {
                write!(f, "matches({}, {:?})", path, pattern.as_str())
            }
            QueryPredicate::Not(inner) => write!(f, "not({})", inner),
            QueryPredicate::AllMatch { path, predicate } => {
                write!(f, "all({}: {})", path, predicate)
            }
            QueryPredicate::AnyMatch { path, predicate } => {
                write!(f, "any({}: {})", path, predicate)
            }
        }
    }
}

fn find<'a>(node: &'a NormalizedNode, path: &YangInstanceIdentifier) -> Option<&'a NormalizedNode> {
    path.path_arguments()
        .iter()
        .try_fold(node, |current, arg| current.child(arg).map(Arc::as_ref))
}

/// Selects the nodes at `select` below `root` satisfying every predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    root: YangInstanceIdentifier,
    select: YangInstanceIdentifier,
    predicates: Vec<QueryPredicate>,
}

impl Query {
    pub fn new(
        root: YangInstanceIdentifier,
        select: YangInstanceIdentifier,
        predicates: Vec<QueryPredicate>,
    ) -> Self {
        Self {
            root,
            select,
            predicates,
        }
    }

    pub fn root(&self) -> &YangInstanceIdentifier {
        &self.root
    }

    /// The selected nodes, relative to [Query::root].
    pub fn select(&self) -> &YangInstanceIdentifier {
        &self.select
    }

    /// The absolute path of the selected nodes.
    pub fn select_path(&self) -> YangInstanceIdentifier {
        self.root.join(&self.select)
    }

    pub fn predicates(&self) -> &[QueryPredicate] {
        &self.predicates
    }
}

/// Replaces every list in `frontier` by its entries. Map entries extend
/// the path by their key; unkeyed entries have no path of their own.
fn expand_lists(
    frontier: Vec<(YangInstanceIdentifier, Arc<NormalizedNode>)>,
) -> Vec<(YangInstanceIdentifier, Arc<NormalizedNode>)> {
    frontier
        .into_iter()
        .flat_map(|(path, node)| match node.as_ref() {
            NormalizedNode::Map(list) => list
                .entries()
                .iter()
                .map(|entry| (path.node(entry.identifier()), entry.clone()))
                .collect(),
            NormalizedNode::UnkeyedList(list) => list
                .entries()
                .iter()
                .map(|entry| (path.clone(), entry.clone()))
                .collect(),
            _ => vec![(path, node)],
        })
        .collect()
}

/// Runs `query` against `data`, the generic node at the query's root.
/// Lists along the select path, and at its end, match every entry unless
/// an entry is selected explicitly.
pub fn evaluate(query: &Query, data: &Arc<NormalizedNode>) -> Vec<(YangInstanceIdentifier, Arc<NormalizedNode>)> {
    let mut frontier = vec![(query.root.clone(), data.clone())];

    for arg in query.select.path_arguments() {
        if matches!(arg, PathArgument::Node(_)) {
            frontier = expand_lists(frontier);
        }
        frontier = frontier
            .into_iter()
            .filter_map(|(path, node)| {
                let child = node.child(arg)?.clone();
                Some((path.node(arg.clone()), child))
            })
            .collect();
    }

    let matches: Vec<_> = expand_lists(frontier)
        .into_iter()
        .filter(|(_, node)| query.predicates.iter().all(|p| p.test(node)))
        .collect();
    trace!(select = %query.select_path(), matches = matches.len(), "evaluated query");
    matches
}
