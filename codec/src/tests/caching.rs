use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;
use std::sync::Arc;

use super::{class, context, context_with, lazy_config, object};
use crate::binding::{downcast, BindingValue};
use crate::data::NormalizedNode;
use crate::fixtures::{self, Item, Top};
use crate::{BindingCodecContext, CachingCodec, Error};

fn data(context: &BindingCodecContext) -> Arc<NormalizedNode> {
    Arc::new(
        context
            .serialize(fixtures::top_with_items().as_ref())
            .expect("serialize"),
    )
}

fn item_codec(context: &BindingCodecContext) -> CachingCodec {
    context
        .create_caching_codec(class::<Top>(), HashSet::from([class::<Item>()]))
        .expect("caching codec")
}

fn items(codec: &CachingCodec, data: &Arc<NormalizedNode>) -> Vec<Arc<Item>> {
    downcast::<Top>(codec.deserialize(data).expect("deserialize"))
        .expect("eager top")
        .item
        .clone()
}

#[rstest]
fn cached_types_are_shared(context: BindingCodecContext) {
    let data = data(&context);
    let codec = item_codec(&context);

    let first = codec.deserialize(&data).expect("deserialize");
    let second = codec.deserialize(&data).expect("deserialize");
    // only items are cached, the container is built every time
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(&*first, &*second);

    let (a, b) = (items(&codec, &data), items(&codec, &data));
    assert!(a.iter().zip(&b).all(|(x, y)| Arc::ptr_eq(x, y)));
    assert_eq!(2, codec.cached_len());
}

#[rstest]
fn uncached_codec_builds_fresh_objects(context: BindingCodecContext) {
    let data = data(&context);
    let codec = context
        .create_caching_codec(class::<Top>(), HashSet::new())
        .expect("caching codec");

    let (a, b) = (items(&codec, &data), items(&codec, &data));
    assert!(!Arc::ptr_eq(&a[0], &b[0]));
    assert_eq!(0, codec.cached_len());
}

#[rstest]
fn codecs_are_independent(context: BindingCodecContext) {
    let data = data(&context);
    let (one, two) = (item_codec(&context), item_codec(&context));

    let (a, b) = (items(&one, &data), items(&two, &data));
    assert!(!Arc::ptr_eq(&a[0], &b[0]));
    assert_eq!(a, b);

    one.close();
    assert!(one.is_closed());
    assert!(!two.is_closed());
    assert_eq!(2, items(&two, &data).len());
}

#[rstest]
fn closed_codec_is_invalidated(context: BindingCodecContext) {
    let data = data(&context);
    let codec = item_codec(&context);
    items(&codec, &data);

    codec.close();
    codec.close();
    assert_eq!(0, codec.cached_len());
    assert!(matches!(
        codec.deserialize(&data),
        Err(Error::InvalidatedCodec)
    ));
    assert!(matches!(
        codec.serialize(fixtures::top_with_items().as_ref()),
        Err(Error::InvalidatedCodec)
    ));
}

#[rstest]
fn serialize_matches_plain_codec(context: BindingCodecContext) {
    let codec = item_codec(&context);
    assert_eq!(
        context
            .serialize(fixtures::full_top().as_ref())
            .expect("plain"),
        codec
            .serialize(fixtures::full_top().as_ref())
            .expect("cached")
    );
    assert!(Arc::ptr_eq(
        codec.node(),
        &context.stream_child_of::<Top>().expect("top")
    ));
}

#[test]
fn lazy_objects_read_through_cache() {
    let context = context_with(lazy_config());
    let data = data(&context);
    let codec = item_codec(&context);

    let top = codec.deserialize(&data).expect("deserialize");
    let expected = object(fixtures::top_with_items());
    assert_eq!(&*expected, &*top);
    assert_eq!(top.field("item"), top.field("item"));
    assert_eq!(2, codec.cached_len());

    codec.close();
    // already loaded children stay readable
    assert_eq!(&*expected, &*top);
}

#[test]
fn lazy_objects_are_materialized_on_close() {
    let context = context_with(lazy_config());
    let data = data(&context);
    let codec = item_codec(&context);

    // nothing read before closing
    let top = codec.deserialize(&data).expect("deserialize");
    codec.close();

    assert_eq!(&*object(fixtures::top_with_items()), &*top);
    match top.field("item") {
        Some(BindingValue::Objects(items)) => assert_eq!(2, items.len()),
        other => panic!("items must survive close, got {:?}", other),
    }
    assert_eq!(0, codec.cached_len());
    assert!(matches!(
        codec.deserialize(&data),
        Err(Error::InvalidatedCodec)
    ));
}

#[rstest]
fn concurrent_readers_share_cached_objects(context: BindingCodecContext) {
    let data = data(&context);
    let codec = item_codec(&context);

    let results: Vec<Vec<Arc<Item>>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| items(&codec, &data))).collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("reader thread"))
            .collect()
    });

    let first = &results[0];
    assert_eq!(2, first.len());
    for other in &results[1..] {
        assert!(first.iter().zip(other).all(|(a, b)| Arc::ptr_eq(a, b)));
    }
    assert_eq!(2, codec.cached_len());
}
