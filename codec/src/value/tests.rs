use rstest::rstest;
use smol_str::SmolStr;
use std::sync::Arc;

use super::ValueCodecFactory;
use crate::binding::{BindingClass, BindingRegistry, BindingScalar};
use crate::data::{Decimal64, Value};
use crate::schema::{
    EnumPair, LeafrefPath, Restrictions, SchemaContext, SchemaNode, TypeDefinition,
};
use crate::{Error, QName};

struct HostName;
struct Address;
struct Mode;

const NS: &str = "urn:test:value";

fn q(name: &str) -> QName {
    QName::new(NS, name)
}

fn host_name() -> TypeDefinition {
    TypeDefinition::derived(
        q("host-name"),
        TypeDefinition::String,
        Restrictions {
            length: Some(1..=8),
            ..Default::default()
        },
    )
}

fn factory(children: Vec<Arc<SchemaNode>>) -> ValueCodecFactory {
    let mut registry = BindingRegistry::new();
    registry.register_typedef(q("host-name"), BindingClass::of::<HostName>());
    ValueCodecFactory::new(
        Arc::new(SchemaContext::new(children, vec![], vec![])),
        Arc::new(registry),
    )
}

#[rstest]
#[case::int(TypeDefinition::Int32, BindingScalar::Int32(-4), Value::Int32(-4))]
#[case::string(TypeDefinition::String, BindingScalar::from("x"), Value::String("x".into()))]
#[case::empty(TypeDefinition::Empty, BindingScalar::Empty, Value::Empty)]
#[case::decimal(
    TypeDefinition::Decimal64 { fraction_digits: 2 },
    BindingScalar::Decimal64(Decimal64::new(15, 1).unwrap()),
    Value::Decimal64(Decimal64::new(150, 2).unwrap()),
)]
fn builtin(#[case] type_def: TypeDefinition, #[case] typed: BindingScalar, #[case] generic: Value) {
    let codec = factory(vec![]).codec(None, &type_def).expect("must build");
    assert_eq!(generic, codec.serialize(&typed).expect("must serialize"));
}

#[test]
fn builtin_rejects_other_types() {
    let codec = factory(vec![])
        .codec(None, &TypeDefinition::Uint8)
        .expect("must build");
    assert!(matches!(
        codec.deserialize(&Value::Int8(1)),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        codec.serialize(&BindingScalar::Int8(1)),
        Err(Error::InvalidValue(_))
    ));
}

#[test]
fn typedef_wraps_and_restricts() {
    let class = BindingClass::of::<HostName>();
    let codec = factory(vec![])
        .codec(Some(class), &host_name())
        .expect("must build");

    assert_eq!(
        BindingScalar::typedef(class, "alpha"),
        codec
            .deserialize(&Value::String("alpha".into()))
            .expect("must deserialize")
    );
    assert!(matches!(
        codec.deserialize(&Value::String("far-too-long".into())),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        codec.serialize(&BindingScalar::from("alpha")),
        Err(Error::InvalidValue(_))
    ));
}

#[rstest]
#[case::first_member_wins("alpha", "host-name")]
#[case::falls_through("a-long-host-name", "string")]
fn union_members_in_declaration_order(#[case] input: &str, #[case] member: &str) {
    let class = BindingClass::of::<Address>();
    let codec = factory(vec![])
        .codec(
            Some(class),
            &TypeDefinition::Union(vec![host_name(), TypeDefinition::String]),
        )
        .expect("must build");

    let typed = codec
        .deserialize(&Value::String(input.into()))
        .expect("must deserialize");
    match &typed {
        BindingScalar::Union { member: m, .. } => assert_eq!(member, m.as_str()),
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(
        Value::String(input.into()),
        codec.serialize(&typed).expect("must serialize")
    );
}

#[test]
fn union_order_is_significant() {
    let class = BindingClass::of::<Address>();
    let codec = factory(vec![])
        .codec(
            Some(class),
            &TypeDefinition::Union(vec![TypeDefinition::String, host_name()]),
        )
        .expect("must build");

    let typed = codec
        .deserialize(&Value::String("alpha".into()))
        .expect("must deserialize");
    assert_eq!(
        BindingScalar::union(class, "string", "alpha"),
        typed
    );
}

#[test]
fn union_requires_class() {
    let res = factory(vec![]).codec(None, &TypeDefinition::Union(vec![TypeDefinition::String]));
    assert!(matches!(res, Err(Error::SchemaConstruction(_))));
}

#[test]
fn enumeration() {
    let class = BindingClass::of::<Mode>();
    let codec = factory(vec![])
        .codec(
            Some(class),
            &TypeDefinition::Enumeration(vec![EnumPair::new("active", 0), EnumPair::new("passive", 1)]),
        )
        .expect("must build");

    assert_eq!(
        Value::String(SmolStr::new("passive")),
        codec
            .serialize(&BindingScalar::Enumeration { class, value: 1 })
            .expect("must serialize")
    );
    assert!(codec.deserialize(&Value::String("other".into())).is_err());
}

#[test]
fn codecs_are_interned() {
    let factory = factory(vec![]);
    let a = factory.codec(None, &TypeDefinition::String).unwrap();
    let b = factory.codec(None, &TypeDefinition::String).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

fn leafref_schema(reference: &str) -> Vec<Arc<SchemaNode>> {
    vec![SchemaNode::container(
        q("top"),
        vec![
            SchemaNode::list(
                q("item"),
                vec![q("id")],
                vec![SchemaNode::leaf(q("id"), TypeDefinition::Uint16)],
            ),
            SchemaNode::leaf(
                q("ref"),
                TypeDefinition::Leafref(LeafrefPath::parse(NS, reference)),
            ),
            SchemaNode::leaf(
                q("other"),
                TypeDefinition::Leafref(LeafrefPath::parse(NS, "../ref")),
            ),
        ],
    )]
}

#[rstest]
#[case::relative("../item/id")]
#[case::absolute("/top/item/id")]
fn leafref_follows_target(#[case] reference: &str) {
    let codec = factory(leafref_schema(reference))
        .leaf_codec(
            None,
            &TypeDefinition::Leafref(LeafrefPath::parse(NS, reference)),
            &[q("top"), q("ref")],
        )
        .expect("must resolve");

    assert_eq!(
        BindingScalar::Uint16(3),
        codec.deserialize(&Value::Uint16(3)).expect("must deserialize")
    );
}

#[test]
fn leafref_chain() {
    let codec = factory(leafref_schema("../item/id"))
        .leaf_codec(
            None,
            &TypeDefinition::Leafref(LeafrefPath::parse(NS, "../ref")),
            &[q("top"), q("other")],
        )
        .expect("must resolve through both leafrefs");

    assert!(codec.deserialize(&Value::Uint16(3)).is_ok());
}

#[rstest]
#[case::self_reference("../ref")]
#[case::cycle("../other")]
#[case::missing("../item/missing")]
#[case::escapes("../../../id")]
fn leafref_unresolvable(#[case] reference: &str) {
    let res = factory(leafref_schema(reference)).leaf_codec(
        None,
        &TypeDefinition::Leafref(LeafrefPath::parse(NS, reference)),
        &[q("top"), q("ref")],
    );
    assert!(matches!(res, Err(Error::SchemaConstruction(_))));
}
