use pretty_assertions::assert_eq;
use rstest::rstest;
use smol_str::SmolStr;
use std::sync::Arc;

use super::{class, context, context_with, lazy_config, lazy_context, object, Event, RecordingWriter};
use crate::binding::downcast;
use crate::data::{KeyPredicates, NormalizedNode, Value};
use crate::fixtures::{
    self, q, Address, DisplayName, HostName, Item, Mode, Reliable, Top, Transport, Udp, Unrelated,
};
use crate::{BindingCodecContext, CodecConfig, Error};

fn keys(id: &str) -> KeyPredicates {
    [(q("id"), Value::String(id.into()))].into_iter().collect()
}

fn string(name: &str, value: &str) -> NormalizedNode {
    NormalizedNode::leaf(q(name), Value::String(value.into()))
}

/// The generic form of [fixtures::full_top].
fn full_top_generic() -> NormalizedNode {
    NormalizedNode::container(
        q("top"),
        [
            NormalizedNode::map(
                q("item"),
                [
                    NormalizedNode::map_entry(
                        q("item"),
                        keys("a"),
                        [
                            string("id", "a"),
                            NormalizedNode::leaf(q("count"), Value::Int32(1)),
                            NormalizedNode::leaf_set(
                                q("tags"),
                                [Value::String("x".into()), Value::String("y".into())],
                            ),
                        ],
                    ),
                    NormalizedNode::map_entry(
                        q("item"),
                        keys("b"),
                        [
                            string("id", "b"),
                            NormalizedNode::leaf(q("count"), Value::Int32(2)),
                        ],
                    ),
                ],
            ),
            string("address", "alpha"),
            string("mode", "passive"),
            NormalizedNode::leaf(
                q("flags"),
                Value::Bits(["up", "loopback"].into_iter().map(SmolStr::new).collect()),
            ),
            string("display-name", "Primary"),
            NormalizedNode::leaf(q("kind"), Value::Identity(q("reliable"))),
            string("primary-item", "a"),
            NormalizedNode::choice(
                q("transport"),
                [NormalizedNode::container(
                    q("tcp-options"),
                    [NormalizedNode::leaf(q("port"), Value::Uint16(8080))],
                )],
            ),
            NormalizedNode::unkeyed_list(
                q("history"),
                [
                    NormalizedNode::unkeyed_list_entry(q("history"), [string("event", "boot")]),
                    NormalizedNode::unkeyed_list_entry(q("history"), [string("event", "link-up")]),
                ],
            ),
            string("note", "extra"),
            NormalizedNode::container(
                q("aug-cont"),
                [NormalizedNode::leaf(q("level"), Value::Uint8(3))],
            ),
        ],
    )
}

fn record(context: &BindingCodecContext, top: &Top) -> Vec<Event> {
    let mut writer = RecordingWriter::default();
    context
        .stream_child_of::<Top>()
        .expect("top")
        .write_object(top, &mut writer)
        .expect("must write");
    writer.events
}

#[rstest]
fn list_events(context: BindingCodecContext) {
    let entry = |id: &str, count: i32| {
        vec![
            Event::StartMapEntry(q("item"), keys(id)),
            Event::Leaf(q("id"), Value::String(id.into())),
            Event::Leaf(q("count"), Value::Int32(count)),
            Event::End,
        ]
    };

    let mut expected = vec![
        Event::StartContainer(q("top")),
        Event::StartMap(q("item"), 2),
    ];
    expected.extend(entry("a", 1));
    expected.extend(entry("b", 2));
    expected.extend([Event::End, Event::End]);

    assert_eq!(expected, record(&context, &fixtures::top_with_items()));
}

#[rstest]
fn absent_children_are_omitted(context: BindingCodecContext) {
    assert_eq!(
        vec![Event::StartContainer(q("top")), Event::End],
        record(&context, &Top::default())
    );
    assert_eq!(
        NormalizedNode::container(q("top"), []),
        context.serialize(&Top::default()).expect("must serialize")
    );
}

#[rstest]
fn choice_and_leaf_list_events(context: BindingCodecContext) {
    let top = Top {
        item: vec![Arc::new(Item {
            id: "a".into(),
            count: None,
            tags: vec!["x".into()],
        })],
        transport: Some(Transport::Udp(Arc::new(Udp {
            datagram_size: Some(1500),
        }))),
        ..Default::default()
    };

    assert_eq!(
        vec![
            Event::StartContainer(q("top")),
            Event::StartMap(q("item"), 1),
            Event::StartMapEntry(q("item"), keys("a")),
            Event::Leaf(q("id"), Value::String("a".into())),
            Event::StartLeafSet(q("tags"), 1),
            Event::LeafSetEntry(Value::String("x".into())),
            Event::End,
            Event::End,
            Event::End,
            Event::StartChoice(q("transport")),
            Event::Leaf(q("datagram-size"), Value::Uint32(1500)),
            Event::End,
            Event::End,
        ],
        record(&context, &top)
    );
}

#[rstest]
fn serialize_full(context: BindingCodecContext) {
    assert_eq!(
        full_top_generic(),
        context.serialize(fixtures::full_top().as_ref()).expect("must serialize")
    );
}

#[rstest]
#[case::eager(context_with(CodecConfig::default()))]
#[case::lazy(context_with(lazy_config()))]
fn deserialize_full(#[case] context: BindingCodecContext) {
    let actual = context
        .deserialize(&Arc::new(full_top_generic()))
        .expect("must deserialize");
    let expected = object(fixtures::full_top());
    assert_eq!(&*expected, &*actual);
}

#[rstest]
fn eager_objects_are_generated_types(context: BindingCodecContext) {
    let top = downcast::<Top>(
        context
            .deserialize(&Arc::new(full_top_generic()))
            .expect("must deserialize"),
    )
    .expect("eager objects downcast");

    assert_eq!(Some(Mode::Passive), top.mode);
    assert_eq!(Some(class::<Reliable>()), top.kind);
    assert_eq!(vec![SmolStr::new("x"), SmolStr::new("y")], top.item[0].tags);
    match &top.transport {
        Some(Transport::Tcp(tcp)) => {
            assert_eq!(Some(8080), tcp.tcp_options.as_ref().and_then(|o| o.port))
        }
        other => panic!("unexpected transport {:?}", other),
    }
    assert_eq!(1, top.augmentations.len());
}

#[rstest]
fn lazy_objects_stay_opaque(lazy_context: BindingCodecContext) {
    let lazy = lazy_context
        .deserialize(&Arc::new(full_top_generic()))
        .expect("must deserialize");

    assert_eq!(class::<Top>(), lazy.implemented_interface());
    assert_eq!(lazy.field("item"), lazy.field("item"));
    assert_eq!(None, lazy.field("no_such_accessor"));
    assert!(matches!(
        downcast::<Top>(lazy),
        Err(Error::InvalidData(_))
    ));
}

fn item_entry(children: Vec<NormalizedNode>) -> NormalizedNode {
    NormalizedNode::container(
        q("top"),
        [NormalizedNode::map(
            q("item"),
            [NormalizedNode::map_entry(q("item"), keys("a"), children)],
        )],
    )
}

#[rstest]
#[case::top_level_enum(
    NormalizedNode::container(q("top"), [string("mode", "sleeping"), string("primary-item", "a")]),
    "InvalidValue",
)]
#[case::leaf_of_list_entry(
    item_entry(vec![string("id", "a"), string("count", "many")]),
    "InvalidValue",
)]
#[case::leaf_list_entry(
    item_entry(vec![
        string("id", "a"),
        NormalizedNode::leaf_set(q("tags"), [Value::String("x".into()), Value::Int32(1)]),
    ]),
    "InvalidValue",
)]
#[case::leaf_inside_case(
    NormalizedNode::container(
        q("top"),
        [NormalizedNode::choice(
            q("transport"),
            [NormalizedNode::container(q("tcp-options"), [string("port", "http")])],
        )],
    ),
    "InvalidValue",
)]
#[case::unknown_child_of_list_entry(
    item_entry(vec![string("id", "a"), string("surprise", "!")]),
    "InvalidData",
)]
fn lazy_fails_where_eager_fails(#[case] data: NormalizedNode, #[case] kind: &str) {
    let data = Arc::new(data);
    let eager = context_with(CodecConfig::default())
        .deserialize(&data)
        .expect_err("eager must fail");
    let lazy = context_with(lazy_config())
        .deserialize(&data)
        .expect_err("lazy must fail");

    assert_eq!(eager, lazy);
    match (kind, &lazy) {
        ("InvalidValue", Error::InvalidValue(_)) | ("InvalidData", Error::InvalidData(_)) => {}
        (kind, other) => panic!("expected {}, got {:?}", kind, other),
    }
}

#[rstest]
#[case::short_string(Address::String("short".into()), Address::HostName(HostName("short".into())))]
#[case::long_string(
    Address::String("much-too-long".into()),
    Address::String("much-too-long".into()),
)]
#[case::host_name(
    Address::HostName(HostName("alpha".into())),
    Address::HostName(HostName("alpha".into())),
)]
fn union_resolves_first_matching_member(
    context: BindingCodecContext,
    #[case] written: Address,
    #[case] read: Address,
) {
    let top = Top {
        address: Some(written),
        ..Default::default()
    };
    let data = Arc::new(context.serialize(&top).expect("must serialize"));
    let back = downcast::<Top>(context.deserialize(&data).expect("must deserialize"))
        .expect("downcast");
    assert_eq!(Some(read), back.address);
}

#[rstest]
#[case::foreign_identity(Top { kind: Some(class::<Unrelated>()), ..Default::default() })]
#[case::display_name_too_long(Top {
    display_name: Some(DisplayName("a name far too long for it".into())),
    ..Default::default()
})]
#[case::host_name_too_long(Top {
    address: Some(Address::HostName(HostName("much-too-long".into()))),
    ..Default::default()
})]
fn invalid_values_are_rejected(context: BindingCodecContext, #[case] top: Top) {
    assert!(matches!(
        context.serialize(&top),
        Err(Error::InvalidValue(_))
    ));
}

#[rstest]
fn write_rejects_foreign_object(context: BindingCodecContext) {
    let top = context.stream_child_of::<Top>().expect("top");
    let mut writer = RecordingWriter::default();
    assert!(matches!(
        top.write_object(Item::new("a", 1).as_ref(), &mut writer),
        Err(Error::SchemaMismatch(_))
    ));
    assert!(writer.events.is_empty());
}

fn with_unknown_child() -> Arc<NormalizedNode> {
    Arc::new(NormalizedNode::container(
        q("top"),
        [string("mode", "active"), string("surprise", "!")],
    ))
}

#[rstest]
#[case::eager(context_with(CodecConfig::default()))]
#[case::lazy(context_with(lazy_config()))]
fn strict_rejects_unknown_children(#[case] context: BindingCodecContext) {
    assert!(matches!(
        context.deserialize(&with_unknown_child()),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn lenient_skips_unknown_children() {
    let context = context_with(CodecConfig {
        strict: false,
        ..Default::default()
    });
    let actual = context
        .deserialize(&with_unknown_child())
        .expect("must deserialize");
    let expected = object(Arc::new(Top {
        mode: Some(Mode::Active),
        ..Default::default()
    }));
    assert_eq!(&*expected, &*actual);
}

#[rstest]
fn unknown_top_level_node(context: BindingCodecContext) {
    let data = Arc::new(NormalizedNode::container(q("elsewhere"), []));
    assert!(matches!(
        context.deserialize(&data),
        Err(Error::SchemaMismatch(_))
    ));
}

#[rstest]
fn empty_leaf_sets_are_read_as_empty(context: BindingCodecContext) {
    let data = Arc::new(NormalizedNode::container(
        q("top"),
        [NormalizedNode::map(
            q("item"),
            [NormalizedNode::map_entry(
                q("item"),
                keys("a"),
                [string("id", "a")],
            )],
        )],
    ));
    let top = downcast::<Top>(context.deserialize(&data).expect("must deserialize"))
        .expect("downcast");
    assert_eq!(
        vec![Arc::new(Item {
            id: "a".into(),
            count: None,
            tags: vec![],
        })],
        top.item
    );
}
