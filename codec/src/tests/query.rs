use pretty_assertions::assert_eq;
use rstest::rstest;
use smol_str::SmolStr;
use std::sync::Arc;

use super::{context, object};
use crate::binding::{downcast, InstanceIdentifier};
use crate::data::{PathArgument, Value, YangInstanceIdentifier};
use crate::fixtures::{self, q, History, Item, ItemKey, Mode, Tcp, TcpOptions, Top, TopAug, Udp};
use crate::query::{LeafReference, Pattern, Query, QueryBuilder, QueryPredicate, ValueMatchBuilder};
use crate::{BindingCodecContext, Error};

fn path(names: &[&str]) -> YangInstanceIdentifier {
    names.iter().map(|n| PathArgument::Node(q(n))).collect()
}

fn top() -> InstanceIdentifier {
    InstanceIdentifier::builder::<Top>().build()
}

#[rstest]
fn items_with_count(context: BindingCodecContext) {
    let query = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching()
        .leaf(Item::COUNT)
        .expect("leaf")
        .exists()
        .build();

    assert_eq!(&path(&["top"]), query.root());
    assert_eq!(&path(&["item"]), query.select());
    assert_eq!(path(&["top", "item"]), query.select_path());
    assert_eq!(
        &[QueryPredicate::Exists {
            path: path(&["count"])
        }],
        query.predicates()
    );
}

#[rstest]
fn predicates_accumulate(context: BindingCodecContext) {
    let query = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching()
        .leaf(Item::COUNT)
        .expect("leaf")
        .value_equals(3)
        .expect("value")
        .and()
        .leaf(Item::ID)
        .expect("leaf")
        .not_exists()
        .build();

    assert_eq!(
        &[
            QueryPredicate::ValueEquals {
                path: path(&["count"]),
                value: Value::Int32(3),
            },
            QueryPredicate::NotExists { path: path(&["id"]) },
        ],
        query.predicates()
    );
}

#[rstest]
fn select_paths(context: BindingCodecContext) {
    let keyed = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_keyed_child::<Item>(ItemKey::new("a")))
        .expect("select")
        .matching()
        .leaf(Item::COUNT)
        .expect("leaf")
        .exists()
        .build();
    assert_eq!(
        &YangInstanceIdentifier::from(vec![
            PathArgument::Node(q("item")),
            PathArgument::entry(q("item"), [(q("id"), Value::String("a".into()))]),
        ]),
        keyed.select()
    );

    let in_case = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_case_child::<Tcp, TcpOptions>())
        .expect("select")
        .matching()
        .leaf(TcpOptions::PORT)
        .expect("leaf")
        .value_equals(8080)
        .expect("value")
        .build();
    assert_eq!(&path(&["transport", "tcp-options"]), in_case.select());
    assert_eq!(
        &[QueryPredicate::ValueEquals {
            path: path(&["port"]),
            value: Value::Uint16(8080),
        }],
        in_case.predicates()
    );
}

#[rstest]
fn leaves_outside_the_selected_type(context: BindingCodecContext) {
    let query = QueryBuilder::new(&context, top())
        .expect("root")
        .matching()
        .leaf(Udp::DATAGRAM_SIZE)
        .expect("leaf of case")
        .exists()
        .and()
        .leaf(TopAug::NOTE)
        .expect("leaf of augmentation")
        .value_equals(SmolStr::new("extra"))
        .expect("value")
        .and()
        .leaf(Top::MODE)
        .expect("enumeration leaf")
        .value_equals(Mode::Passive)
        .expect("value")
        .and()
        .child_object::<TcpOptions>()
        .expect("container in case")
        .leaf(TcpOptions::PORT)
        .expect("leaf of child")
        .exists()
        .build();

    assert_eq!(
        &[
            QueryPredicate::Exists {
                path: path(&["transport", "datagram-size"])
            },
            QueryPredicate::ValueEquals {
                path: path(&["note"]),
                value: Value::String("extra".into()),
            },
            QueryPredicate::ValueEquals {
                path: path(&["mode"]),
                value: Value::String("passive".into()),
            },
            QueryPredicate::Exists {
                path: path(&["transport", "tcp-options", "port"])
            },
        ],
        query.predicates()
    );
}

#[rstest]
fn foreign_leaf_reference(context: BindingCodecContext) {
    let matching = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching();
    assert!(matches!(
        matching.leaf(Top::MODE),
        Err(Error::SchemaMismatch(_))
    ));
}

#[rstest]
fn invalid_selection(context: BindingCodecContext) {
    assert!(matches!(
        QueryBuilder::new(&context, top()).and_then(|b| b.extract_child::<Udp>()),
        Err(Error::SchemaMismatch(_))
    ));
    assert!(matches!(
        QueryBuilder::new(
            &context,
            InstanceIdentifier::builder::<Item>().build()
        ),
        Err(Error::SchemaMismatch(_))
    ));
}

#[rstest]
fn results_are_typed(context: BindingCodecContext) {
    let data = Arc::new(
        context
            .serialize(fixtures::full_top().as_ref())
            .expect("serialize"),
    );

    let query = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching()
        .leaf(Item::COUNT)
        .expect("leaf")
        .value_equals(2)
        .expect("value")
        .build();
    let results = context.query_results(&query, &data).expect("results");

    assert_eq!(1, results.len());
    let (path, item) = &results[0];
    assert_eq!(
        &InstanceIdentifier::builder::<Top>()
            .keyed_child::<Item>(ItemKey::new("b"))
            .build(),
        path
    );
    assert_eq!(&*object(Item::new("b", 2)), &**item);
}

#[rstest]
fn results_from_unkeyed_list(context: BindingCodecContext) {
    let data = Arc::new(
        context
            .serialize(fixtures::full_top().as_ref())
            .expect("serialize"),
    );

    let query = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<History>())
        .expect("select")
        .matching()
        .leaf(History::EVENT)
        .expect("leaf")
        .exists()
        .build();
    let results = context.query_results(&query, &data).expect("results");

    let history = InstanceIdentifier::builder::<Top>().child::<History>().build();
    assert_eq!(
        vec![history.clone(), history],
        results.iter().map(|(p, _)| p.clone()).collect::<Vec<_>>()
    );
    assert_eq!(&*object(History::new("link-up")), &*results[1].1);
}

fn full_data(context: &BindingCodecContext) -> Arc<crate::data::NormalizedNode> {
    Arc::new(
        context
            .serialize(fixtures::full_top().as_ref())
            .expect("serialize"),
    )
}

fn item_ids(context: &BindingCodecContext, query: &Query) -> Vec<SmolStr> {
    context
        .query_results(query, &full_data(context))
        .expect("results")
        .into_iter()
        .map(|(_, item)| downcast::<Item>(item).expect("item").id.clone())
        .collect()
}

fn events(context: &BindingCodecContext, query: &Query) -> Vec<SmolStr> {
    context
        .query_results(query, &full_data(context))
        .expect("results")
        .into_iter()
        .filter_map(|(_, entry)| downcast::<History>(entry).expect("history").event.clone())
        .collect()
}

fn item_count(context: &BindingCodecContext) -> ValueMatchBuilder<'_, i32> {
    QueryBuilder::new(context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching()
        .leaf(Item::COUNT)
        .expect("leaf")
}

fn history_event(context: &BindingCodecContext) -> ValueMatchBuilder<'_, SmolStr> {
    QueryBuilder::new(context, top())
        .and_then(|b| b.extract_child::<History>())
        .expect("select")
        .matching()
        .leaf(History::EVENT)
        .expect("leaf")
}

fn ids(ids: &[&str]) -> Vec<SmolStr> {
    ids.iter().map(SmolStr::new).collect()
}

#[rstest]
#[case::greater_than("gt", 1, &["b"])]
#[case::greater_than_or_equal("ge", 1, &["a", "b"])]
#[case::less_than("lt", 2, &["a"])]
#[case::less_than_or_equal("le", 0, &[])]
fn ordering_predicates(
    context: BindingCodecContext,
    #[case] op: &str,
    #[case] bound: i32,
    #[case] expected: &[&str],
) {
    let count = item_count(&context);
    let query = match op {
        "gt" => count.greater_than(bound),
        "ge" => count.greater_than_or_equal(bound),
        "lt" => count.less_than(bound),
        "le" => count.less_than_or_equal(bound),
        _ => unreachable!("unknown comparison {}", op),
    }
    .expect("value")
    .build();

    assert_eq!(ids(expected), item_ids(&context, &query));
}

#[rstest]
fn ordering_predicate_shape(context: BindingCodecContext) {
    let query = item_count(&context)
        .greater_than(1)
        .expect("value")
        .and()
        .leaf(Item::COUNT)
        .expect("leaf")
        .less_than_or_equal(5)
        .expect("value")
        .build();

    assert_eq!(
        &[
            QueryPredicate::GreaterThan {
                path: path(&["count"]),
                value: Value::Int32(1),
            },
            QueryPredicate::LessThanOrEqual {
                path: path(&["count"]),
                value: Value::Int32(5),
            },
        ],
        query.predicates()
    );
}

#[rstest]
#[case::starts_with("starts", "link", &["link-up"])]
#[case::ends_with("ends", "t", &["boot"])]
#[case::contains("contains", "o", &["boot", "link-up"])]
#[case::pattern("pattern", "b.*", &["boot"])]
#[case::pattern_is_anchored("pattern", "o", &[])]
fn string_predicates(
    context: BindingCodecContext,
    #[case] op: &str,
    #[case] operand: &str,
    #[case] expected: &[&str],
) {
    let event = history_event(&context);
    let query = match op {
        "starts" => event.starts_with(operand),
        "ends" => event.ends_with(operand),
        "contains" => event.contains(operand),
        "pattern" => event.matches_pattern(operand).expect("pattern"),
        _ => unreachable!("unknown string match {}", op),
    }
    .build();

    assert_eq!(ids(expected), events(&context, &query));
}

#[rstest]
fn invalid_pattern(context: BindingCodecContext) {
    assert!(matches!(
        history_event(&context).matches_pattern("(unclosed"),
        Err(Error::InvalidValue(_))
    ));
}

#[rstest]
fn negated_predicates(context: BindingCodecContext) {
    let query = history_event(&context).not().starts_with("boot").build();
    assert_eq!(
        &[QueryPredicate::Not(Box::new(QueryPredicate::StartsWith {
            path: path(&["event"]),
            value: "boot".into(),
        }))],
        query.predicates()
    );
    assert_eq!(ids(&["link-up"]), events(&context, &query));

    let query = item_count(&context).not().greater_than(1).expect("value").build();
    assert_eq!(ids(&["a"]), item_ids(&context, &query));

    let twice = item_count(&context).not().not().exists().build();
    assert_eq!(ids(&["a", "b"]), item_ids(&context, &twice));
}

#[rstest]
fn leaf_list_entries(context: BindingCodecContext) {
    let tags = || {
        QueryBuilder::new(&context, top())
            .and_then(|b| b.extract_child::<Item>())
            .expect("select")
            .matching()
            .leaf_list(Item::TAGS)
            .expect("leaf-list")
    };

    let any = tags().any_match().value_equals("y".into()).expect("value").build();
    assert_eq!(
        &[QueryPredicate::AnyMatch {
            path: path(&["tags"]),
            predicate: Box::new(QueryPredicate::ValueEquals {
                path: YangInstanceIdentifier::default(),
                value: Value::String("y".into()),
            }),
        }],
        any.predicates()
    );
    assert_eq!(ids(&["a"]), item_ids(&context, &any));

    let all_x = tags().all_match().starts_with("x").build();
    assert_eq!(ids(&[]), item_ids(&context, &all_x));

    let all_short = tags().all_match().matches_pattern("[a-z]").expect("pattern").build();
    assert_eq!(ids(&["a"]), item_ids(&context, &all_short));
    assert_eq!(
        &[QueryPredicate::AllMatch {
            path: path(&["tags"]),
            predicate: Box::new(QueryPredicate::MatchesPattern {
                path: YangInstanceIdentifier::default(),
                pattern: Pattern::new("[a-z]").expect("pattern"),
            }),
        }],
        all_short.predicates()
    );

    let none_z = tags().all_match().not().contains("z").build();
    assert_eq!(ids(&["a"]), item_ids(&context, &none_z));

    let untagged = tags().not_exists().build();
    assert_eq!(ids(&["b"]), item_ids(&context, &untagged));
}

#[rstest]
fn leaf_is_not_a_leaf_list(context: BindingCodecContext) {
    let matching = QueryBuilder::new(&context, top())
        .and_then(|b| b.extract_child::<Item>())
        .expect("select")
        .matching();
    assert!(matches!(
        matching.leaf(LeafReference::<Item, SmolStr>::new("tags")),
        Err(Error::SchemaMismatch(_))
    ));
}
