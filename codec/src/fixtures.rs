//! A small schema and the binding types a code generator would emit for it.
//!
//! ```text
//! container top {
//!   list item { key id; leaf id string; leaf count int32; leaf-list tags string; }
//!   leaf address { type union { type host-name; type string; } }
//!   leaf mode { type enumeration { enum active; enum passive; } }
//!   leaf flags { type bits { bit up; bit down; bit loopback; } }
//!   leaf display-name { type display-name; }
//!   leaf kind { type identityref { base transport-kind; } }
//!   leaf primary-item { type leafref { path "../item/id"; } }
//!   choice transport {
//!     case tcp { container tcp-options { leaf port uint16; } }
//!     case udp { leaf datagram-size uint32; }
//!   }
//!   list history { leaf event string; }
//! }
//! augment /top { leaf note string; container aug-cont { leaf level uint8; } }
//! rpc reset { input { leaf target string; } output { leaf cleared uint32; } }
//! ```
use lazy_static::lazy_static;
use smol_str::SmolStr;
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::binding::{
    downcast, AccessorInfo, BindingClass, BindingKey, BindingKind, BindingRegistry,
    BindingScalar, BindingTypeInfo, BindingValue, DataObject, FieldValues,
};
use crate::query::LeafReference;
use crate::schema::{
    AugmentationSchema, EnumPair, IdentitySchema, LeafrefPath, Restrictions, RpcDefinition,
    SchemaContext, SchemaNode, SchemaNodeKind, TypeDefinition,
};
use crate::{Error, QName};

pub const NAMESPACE: &str = "urn:test:binding";

pub fn q(local_name: &str) -> QName {
    QName::new(NAMESPACE, local_name)
}

lazy_static! {
    pub static ref RESET: QName = q("reset");
}

macro_rules! any_impls {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    };
}

fn class<T: 'static>() -> BindingClass {
    BindingClass::of::<T>()
}

fn host_name_type() -> TypeDefinition {
    TypeDefinition::derived(
        q("host-name"),
        TypeDefinition::String,
        Restrictions {
            length: Some(1..=8),
            ..Default::default()
        },
    )
}

pub fn schema_context() -> Arc<SchemaContext> {
    let item = SchemaNode::list(
        q("item"),
        vec![q("id")],
        vec![
            SchemaNode::leaf(q("id"), TypeDefinition::String),
            SchemaNode::leaf(q("count"), TypeDefinition::Int32),
            SchemaNode::leaf_list(q("tags"), TypeDefinition::String),
        ],
    );
    let transport = SchemaNode::choice(
        q("transport"),
        vec![
            SchemaNode::case(
                q("tcp"),
                vec![SchemaNode::container(
                    q("tcp-options"),
                    vec![SchemaNode::leaf(q("port"), TypeDefinition::Uint16)],
                )],
            ),
            SchemaNode::case(
                q("udp"),
                vec![SchemaNode::leaf(q("datagram-size"), TypeDefinition::Uint32)],
            ),
        ],
    );
    let top_aug = AugmentationSchema::new(
        q("top-aug"),
        vec![
            SchemaNode::leaf(q("note"), TypeDefinition::String),
            SchemaNode::container(
                q("aug-cont"),
                vec![SchemaNode::leaf(q("level"), TypeDefinition::Uint8)],
            ),
        ],
    );

    let top = SchemaNode::new(
        q("top"),
        SchemaNodeKind::Container {
            children: vec![
                item,
                SchemaNode::leaf(
                    q("address"),
                    TypeDefinition::Union(vec![host_name_type(), TypeDefinition::String]),
                ),
                SchemaNode::leaf(
                    q("mode"),
                    TypeDefinition::Enumeration(vec![
                        EnumPair::new("active", 0),
                        EnumPair::new("passive", 1),
                    ]),
                ),
                SchemaNode::leaf(
                    q("flags"),
                    TypeDefinition::Bits(vec!["up".into(), "down".into(), "loopback".into()]),
                ),
                SchemaNode::leaf(
                    q("display-name"),
                    TypeDefinition::derived(
                        q("display-name"),
                        TypeDefinition::String,
                        Restrictions {
                            length: Some(1..=16),
                            ..Default::default()
                        },
                    ),
                ),
                SchemaNode::leaf(
                    q("kind"),
                    TypeDefinition::IdentityRef {
                        base: q("transport-kind"),
                    },
                ),
                SchemaNode::leaf(
                    q("primary-item"),
                    TypeDefinition::Leafref(LeafrefPath::parse(NAMESPACE, "../item/id")),
                ),
                transport,
                SchemaNode::list(
                    q("history"),
                    vec![],
                    vec![SchemaNode::leaf(q("event"), TypeDefinition::String)],
                ),
            ],
            augmentations: vec![top_aug],
        },
    );

    let reset = RpcDefinition {
        qname: RESET.clone(),
        input: SchemaNode::container(
            q("input"),
            vec![SchemaNode::leaf(q("target"), TypeDefinition::String)],
        ),
        output: SchemaNode::container(
            q("output"),
            vec![SchemaNode::leaf(q("cleared"), TypeDefinition::Uint32)],
        ),
    };

    let identity = |name: &str, bases: &[&str]| IdentitySchema {
        qname: q(name),
        bases: bases.iter().map(|b| q(b)).collect(),
    };

    Arc::new(SchemaContext::new(
        vec![top],
        vec![Arc::new(reset)],
        vec![
            identity("transport-kind", &[]),
            identity("reliable", &["transport-kind"]),
            identity("unreliable", &["transport-kind"]),
            identity("unrelated", &[]),
        ],
    ))
}

fn info(
    class: BindingClass,
    name: &str,
    kind: BindingKind,
    accessors: Vec<AccessorInfo>,
    constructor: Option<crate::binding::Constructor>,
) -> BindingTypeInfo {
    BindingTypeInfo {
        class,
        qname: q(name),
        kind,
        accessors,
        constructor,
    }
}

pub fn binding_registry() -> Arc<BindingRegistry> {
    let mut registry = BindingRegistry::new();
    registry
        .register_top_level(info(
            class::<Top>(),
            "top",
            BindingKind::Container,
            vec![
                AccessorInfo::typed("item", class::<Item>()),
                AccessorInfo::typed("address", class::<Address>()),
                AccessorInfo::typed("mode", class::<Mode>()),
                AccessorInfo::typed("flags", class::<Flags>()),
                AccessorInfo::typed("display_name", class::<DisplayName>()),
                AccessorInfo::leaf("kind"),
                AccessorInfo::leaf("primary_item"),
                AccessorInfo::typed("transport", class::<Transport>()),
                AccessorInfo::typed("history", class::<History>()),
            ],
            Some(Top::construct),
        ))
        .register(info(
            class::<Item>(),
            "item",
            BindingKind::ListEntry {
                key: Some(class::<ItemKey>()),
            },
            vec![
                AccessorInfo::leaf("id"),
                AccessorInfo::leaf("count"),
                AccessorInfo::leaf("tags"),
            ],
            Some(Item::construct),
        ))
        .register(info(
            class::<Transport>(),
            "transport",
            BindingKind::Choice,
            vec![],
            None,
        ))
        .register(info(
            class::<Tcp>(),
            "tcp",
            BindingKind::Case {
                choice: class::<Transport>(),
            },
            vec![AccessorInfo::typed("tcp_options", class::<TcpOptions>())],
            Some(Tcp::construct),
        ))
        .register(info(
            class::<TcpOptions>(),
            "tcp-options",
            BindingKind::Container,
            vec![AccessorInfo::leaf("port")],
            Some(TcpOptions::construct),
        ))
        .register(info(
            class::<Udp>(),
            "udp",
            BindingKind::Case {
                choice: class::<Transport>(),
            },
            vec![AccessorInfo::leaf("datagram_size")],
            Some(Udp::construct),
        ))
        .register(info(
            class::<History>(),
            "history",
            BindingKind::ListEntry { key: None },
            vec![AccessorInfo::leaf("event")],
            Some(History::construct),
        ))
        .register(info(
            class::<TopAug>(),
            "top-aug",
            BindingKind::Augmentation {
                target: class::<Top>(),
            },
            vec![
                AccessorInfo::leaf("note"),
                AccessorInfo::typed("aug_cont", class::<AugCont>()),
            ],
            Some(TopAug::construct),
        ))
        .register(info(
            class::<AugCont>(),
            "aug-cont",
            BindingKind::Container,
            vec![AccessorInfo::leaf("level")],
            Some(AugCont::construct),
        ))
        .register_rpc(
            RESET.clone(),
            info(
                class::<ResetInput>(),
                "input",
                BindingKind::RpcInput,
                vec![AccessorInfo::leaf("target")],
                Some(ResetInput::construct),
            ),
            info(
                class::<ResetOutput>(),
                "output",
                BindingKind::RpcOutput,
                vec![AccessorInfo::leaf("cleared")],
                Some(ResetOutput::construct),
            ),
        )
        .register_typedef(q("host-name"), class::<HostName>())
        .register_identity(q("transport-kind"), class::<TransportKind>())
        .register_identity(q("reliable"), class::<Reliable>())
        .register_identity(q("unreliable"), class::<Unreliable>())
        .register_identity(q("unrelated"), class::<Unrelated>());

    Arc::new(registry)
}

// identities
#[derive(Debug)]
pub struct TransportKind;
#[derive(Debug)]
pub struct Reliable;
#[derive(Debug)]
pub struct Unreliable;
#[derive(Debug)]
pub struct Unrelated;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostName(pub SmolStr);

impl From<HostName> for BindingScalar {
    fn from(value: HostName) -> Self {
        BindingScalar::typedef(class::<HostName>(), value.0)
    }
}

impl TryFrom<BindingScalar> for HostName {
    type Error = Error;

    fn try_from(value: BindingScalar) -> Result<Self, Error> {
        match value {
            BindingScalar::Typedef { class: c, value } if c == class::<HostName>() => {
                Ok(HostName(SmolStr::try_from(*value)?))
            }
            other => Err(Error::InvalidValue(format!("not a host-name: {:?}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayName(pub SmolStr);

impl From<DisplayName> for BindingScalar {
    fn from(value: DisplayName) -> Self {
        BindingScalar::typedef(class::<DisplayName>(), value.0)
    }
}

impl TryFrom<BindingScalar> for DisplayName {
    type Error = Error;

    fn try_from(value: BindingScalar) -> Result<Self, Error> {
        match value {
            BindingScalar::Typedef { class: c, value } if c == class::<DisplayName>() => {
                Ok(DisplayName(SmolStr::try_from(*value)?))
            }
            other => Err(Error::InvalidValue(format!("not a display-name: {:?}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    HostName(HostName),
    String(SmolStr),
}

impl From<Address> for BindingScalar {
    fn from(value: Address) -> Self {
        match value {
            Address::HostName(h) => BindingScalar::union(class::<Address>(), "host-name", h),
            Address::String(s) => BindingScalar::union(class::<Address>(), "string", s),
        }
    }
}

impl TryFrom<BindingScalar> for Address {
    type Error = Error;

    fn try_from(value: BindingScalar) -> Result<Self, Error> {
        match value {
            BindingScalar::Union {
                class: c,
                member,
                value,
            } if c == class::<Address>() => match member.as_str() {
                "host-name" => Ok(Address::HostName(HostName::try_from(*value)?)),
                "string" => Ok(Address::String(SmolStr::try_from(*value)?)),
                other => Err(Error::InvalidValue(format!("unknown address member {}", other))),
            },
            other => Err(Error::InvalidValue(format!("not an address: {:?}", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Active = 0,
    Passive = 1,
}

impl From<Mode> for BindingScalar {
    fn from(value: Mode) -> Self {
        BindingScalar::Enumeration {
            class: class::<Mode>(),
            value: value as i32,
        }
    }
}

impl TryFrom<BindingScalar> for Mode {
    type Error = Error;

    fn try_from(value: BindingScalar) -> Result<Self, Error> {
        match value {
            BindingScalar::Enumeration { class: c, value: 0 } if c == class::<Mode>() => Ok(Mode::Active),
            BindingScalar::Enumeration { class: c, value: 1 } if c == class::<Mode>() => Ok(Mode::Passive),
            other => Err(Error::InvalidValue(format!("not a mode: {:?}", other))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags(pub BTreeSet<SmolStr>);

impl Flags {
    pub fn of(bits: &[&str]) -> Self {
        Flags(bits.iter().map(|b| SmolStr::new(b)).collect())
    }
}

impl From<Flags> for BindingScalar {
    fn from(value: Flags) -> Self {
        BindingScalar::Bits {
            class: class::<Flags>(),
            bits: value.0,
        }
    }
}

impl TryFrom<BindingScalar> for Flags {
    type Error = Error;

    fn try_from(value: BindingScalar) -> Result<Self, Error> {
        match value {
            BindingScalar::Bits { class: c, bits } if c == class::<Flags>() => Ok(Flags(bits)),
            other => Err(Error::InvalidValue(format!("not flags: {:?}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemKey {
    pub id: SmolStr,
}

impl ItemKey {
    pub fn new(id: &str) -> Self {
        Self { id: id.into() }
    }
}

impl From<ItemKey> for BindingKey {
    fn from(value: ItemKey) -> Self {
        BindingKey::new(class::<ItemKey>(), vec![BindingScalar::String(value.id)])
    }
}

#[derive(Clone, Debug, Default)]
pub struct Top {
    pub item: Vec<Arc<Item>>,
    pub address: Option<Address>,
    pub mode: Option<Mode>,
    pub flags: Option<Flags>,
    pub display_name: Option<DisplayName>,
    /// An identity derived from `transport-kind`.
    pub kind: Option<BindingClass>,
    pub primary_item: Option<SmolStr>,
    pub transport: Option<Transport>,
    pub history: Vec<Arc<History>>,
    pub augmentations: Vec<Arc<dyn DataObject>>,
}

impl Top {
    pub const MODE: LeafReference<Top, Mode> = LeafReference::new("mode");
    pub const PRIMARY_ITEM: LeafReference<Top, SmolStr> = LeafReference::new("primary_item");

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        let kind = match fields.take("kind") {
            None => None,
            Some(BindingValue::Scalar(BindingScalar::Identity(class))) => Some(class),
            Some(other) => {
                return Err(Error::InvalidData(format!(
                    "kind: expected identity, got {}",
                    other.kind_name()
                )))
            }
        };

        Ok(Arc::new(Top {
            item: fields.take_objects("item")?,
            address: fields.take_scalar("address")?,
            mode: fields.take_scalar("mode")?,
            flags: fields.take_scalar("flags")?,
            display_name: fields.take_scalar("display_name")?,
            kind,
            primary_item: fields.take_scalar("primary_item")?,
            transport: fields.take_choice("transport")?,
            history: fields.take_objects("history")?,
            augmentations: fields.take_augmentations(),
        }))
    }
}

impl DataObject for Top {
    fn implemented_interface(&self) -> BindingClass {
        class::<Top>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "item" => BindingValue::objects(&self.item),
            "address" => BindingValue::scalar(&self.address),
            "mode" => BindingValue::scalar(&self.mode),
            "flags" => BindingValue::scalar(&self.flags),
            "display_name" => BindingValue::scalar(&self.display_name),
            "kind" => self
                .kind
                .map(|class| BindingValue::Scalar(BindingScalar::Identity(class))),
            "primary_item" => BindingValue::scalar(&self.primary_item),
            "transport" => self
                .transport
                .as_ref()
                .map(|t| BindingValue::Object(t.as_object())),
            "history" => BindingValue::objects(&self.history),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec![
            "item",
            "address",
            "mode",
            "flags",
            "display_name",
            "kind",
            "primary_item",
            "transport",
            "history",
        ]
    }

    fn augmentations(&self) -> Vec<Arc<dyn DataObject>> {
        self.augmentations.clone()
    }

    any_impls!();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: SmolStr,
    pub count: Option<i32>,
    pub tags: Vec<SmolStr>,
}

impl Item {
    pub const ID: LeafReference<Item, SmolStr> = LeafReference::new("id");
    pub const COUNT: LeafReference<Item, i32> = LeafReference::new("count");
    pub const TAGS: LeafReference<Item, Vec<SmolStr>> = LeafReference::new("tags");

    pub fn new(id: &str, count: i32) -> Arc<Self> {
        Arc::new(Item {
            id: id.into(),
            count: Some(count),
            tags: vec![],
        })
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            id: self.id.clone(),
        }
    }

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(Item {
            id: fields.require_scalar("id")?,
            count: fields.take_scalar("count")?,
            tags: fields.take_scalars("tags")?,
        }))
    }
}

impl DataObject for Item {
    fn implemented_interface(&self) -> BindingClass {
        class::<Item>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "id" => Some(BindingValue::Scalar(self.id.clone().into())),
            "count" => BindingValue::scalar(&self.count),
            "tags" => BindingValue::scalars(&self.tags),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["id", "count", "tags"]
    }

    any_impls!();
}

/// The `transport` choice.
#[derive(Clone, Debug)]
pub enum Transport {
    Tcp(Arc<Tcp>),
    Udp(Arc<Udp>),
}

impl Transport {
    fn as_object(&self) -> Arc<dyn DataObject> {
        match self {
            Transport::Tcp(tcp) => tcp.clone(),
            Transport::Udp(udp) => udp.clone(),
        }
    }
}

impl TryFrom<Arc<dyn DataObject>> for Transport {
    type Error = Error;

    fn try_from(case: Arc<dyn DataObject>) -> Result<Self, Error> {
        let case_class = case.implemented_interface();
        if case_class == class::<Tcp>() {
            Ok(Transport::Tcp(downcast(case)?))
        } else if case_class == class::<Udp>() {
            Ok(Transport::Udp(downcast(case)?))
        } else {
            Err(Error::InvalidData(format!(
                "{} is not a case of transport",
                case_class
            )))
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tcp {
    pub tcp_options: Option<Arc<TcpOptions>>,
}

impl Tcp {
    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(Tcp {
            tcp_options: fields.take_object("tcp_options")?,
        }))
    }
}

impl DataObject for Tcp {
    fn implemented_interface(&self) -> BindingClass {
        class::<Tcp>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "tcp_options" => BindingValue::object(&self.tcp_options),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["tcp_options"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct TcpOptions {
    pub port: Option<u16>,
}

impl TcpOptions {
    pub const PORT: LeafReference<TcpOptions, u16> = LeafReference::new("port");

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(TcpOptions {
            port: fields.take_scalar("port")?,
        }))
    }
}

impl DataObject for TcpOptions {
    fn implemented_interface(&self) -> BindingClass {
        class::<TcpOptions>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "port" => BindingValue::scalar(&self.port),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["port"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct Udp {
    pub datagram_size: Option<u32>,
}

impl Udp {
    pub const DATAGRAM_SIZE: LeafReference<Udp, u32> = LeafReference::new("datagram_size");

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(Udp {
            datagram_size: fields.take_scalar("datagram_size")?,
        }))
    }
}

impl DataObject for Udp {
    fn implemented_interface(&self) -> BindingClass {
        class::<Udp>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "datagram_size" => BindingValue::scalar(&self.datagram_size),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["datagram_size"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct History {
    pub event: Option<SmolStr>,
}

impl History {
    pub const EVENT: LeafReference<History, SmolStr> = LeafReference::new("event");

    pub fn new(event: &str) -> Arc<Self> {
        Arc::new(History {
            event: Some(event.into()),
        })
    }

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(History {
            event: fields.take_scalar("event")?,
        }))
    }
}

impl DataObject for History {
    fn implemented_interface(&self) -> BindingClass {
        class::<History>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "event" => BindingValue::scalar(&self.event),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["event"]
    }

    any_impls!();
}

/// The augmentation of `top`.
#[derive(Clone, Debug, Default)]
pub struct TopAug {
    pub note: Option<SmolStr>,
    pub aug_cont: Option<Arc<AugCont>>,
}

impl TopAug {
    pub const NOTE: LeafReference<TopAug, SmolStr> = LeafReference::new("note");

    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(TopAug {
            note: fields.take_scalar("note")?,
            aug_cont: fields.take_object("aug_cont")?,
        }))
    }
}

impl DataObject for TopAug {
    fn implemented_interface(&self) -> BindingClass {
        class::<TopAug>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "note" => BindingValue::scalar(&self.note),
            "aug_cont" => BindingValue::object(&self.aug_cont),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["note", "aug_cont"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct AugCont {
    pub level: Option<u8>,
}

impl AugCont {
    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(AugCont {
            level: fields.take_scalar("level")?,
        }))
    }
}

impl DataObject for AugCont {
    fn implemented_interface(&self) -> BindingClass {
        class::<AugCont>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "level" => BindingValue::scalar(&self.level),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["level"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct ResetInput {
    pub target: Option<SmolStr>,
}

impl ResetInput {
    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(ResetInput {
            target: fields.take_scalar("target")?,
        }))
    }
}

impl DataObject for ResetInput {
    fn implemented_interface(&self) -> BindingClass {
        class::<ResetInput>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "target" => BindingValue::scalar(&self.target),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["target"]
    }

    any_impls!();
}

#[derive(Clone, Debug, Default)]
pub struct ResetOutput {
    pub cleared: Option<u32>,
}

impl ResetOutput {
    fn construct(mut fields: FieldValues) -> Result<Arc<dyn DataObject>, Error> {
        Ok(Arc::new(ResetOutput {
            cleared: fields.take_scalar("cleared")?,
        }))
    }
}

impl DataObject for ResetOutput {
    fn implemented_interface(&self) -> BindingClass {
        class::<ResetOutput>()
    }

    fn field(&self, accessor: &str) -> Option<BindingValue> {
        match accessor {
            "cleared" => BindingValue::scalar(&self.cleared),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<&'static str> {
        vec!["cleared"]
    }

    any_impls!();
}

/// `Top{item=[a:1, b:2]}`
pub fn top_with_items() -> Arc<Top> {
    Arc::new(Top {
        item: vec![Item::new("a", 1), Item::new("b", 2)],
        ..Default::default()
    })
}

/// A `Top` with every child populated.
pub fn full_top() -> Arc<Top> {
    Arc::new(Top {
        item: vec![
            Arc::new(Item {
                id: "a".into(),
                count: Some(1),
                tags: vec!["x".into(), "y".into()],
            }),
            Item::new("b", 2),
        ],
        address: Some(Address::HostName(HostName("alpha".into()))),
        mode: Some(Mode::Passive),
        flags: Some(Flags::of(&["up", "loopback"])),
        display_name: Some(DisplayName("Primary".into())),
        kind: Some(class::<Reliable>()),
        primary_item: Some("a".into()),
        transport: Some(Transport::Tcp(Arc::new(Tcp {
            tcp_options: Some(Arc::new(TcpOptions { port: Some(8080) })),
        }))),
        history: vec![History::new("boot"), History::new("link-up")],
        augmentations: vec![Arc::new(TopAug {
            note: Some("extra".into()),
            aug_cont: Some(Arc::new(AugCont { level: Some(3) })),
        })],
    })
}
