use rstest::fixture;
use std::sync::Arc;

use crate::binding::{BindingClass, DataObject};
use crate::data::{KeyPredicates, NormalizedNodeStreamWriter, Value};
use crate::fixtures;
use crate::{BindingCodecContext, CodecConfig, DeserializationStrategy, Error, QName};

mod caching;
mod query;
mod serialize;

pub(crate) fn class<T: 'static>() -> BindingClass {
    BindingClass::of::<T>()
}

pub(crate) fn object<T: DataObject>(value: Arc<T>) -> Arc<dyn DataObject> {
    value
}

pub(crate) fn context_with(config: CodecConfig) -> BindingCodecContext {
    BindingCodecContext::with_config(fixtures::schema_context(), fixtures::binding_registry(), config)
        .expect("context must build")
}

#[fixture]
pub(crate) fn context() -> BindingCodecContext {
    context_with(CodecConfig::default())
}

pub(crate) fn lazy_config() -> CodecConfig {
    CodecConfig {
        deserialization: DeserializationStrategy::Lazy,
        ..Default::default()
    }
}

#[fixture]
pub(crate) fn lazy_context() -> BindingCodecContext {
    context_with(lazy_config())
}

/// One call on a [NormalizedNodeStreamWriter], size hints of containers
/// left out.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    StartContainer(QName),
    StartChoice(QName),
    StartMap(QName, usize),
    StartMapEntry(QName, KeyPredicates),
    StartUnkeyedList(QName, usize),
    StartUnkeyedListItem(QName),
    StartLeafSet(QName, usize),
    LeafSetEntry(Value),
    Leaf(QName, Value),
    End,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingWriter {
    pub(crate) events: Vec<Event>,
}

impl NormalizedNodeStreamWriter for RecordingWriter {
    fn start_container(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.events.push(Event::StartContainer(name.clone()));
        Ok(())
    }

    fn start_choice(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.events.push(Event::StartChoice(name.clone()));
        Ok(())
    }

    fn start_map(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.events.push(Event::StartMap(name.clone(), count));
        Ok(())
    }

    fn start_map_entry(&mut self, name: &QName, keys: &KeyPredicates, _child_hint: usize) -> Result<(), Error> {
        self.events
            .push(Event::StartMapEntry(name.clone(), keys.clone()));
        Ok(())
    }

    fn start_unkeyed_list(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.events.push(Event::StartUnkeyedList(name.clone(), count));
        Ok(())
    }

    fn start_unkeyed_list_item(&mut self, name: &QName, _child_hint: usize) -> Result<(), Error> {
        self.events.push(Event::StartUnkeyedListItem(name.clone()));
        Ok(())
    }

    fn start_leaf_set(&mut self, name: &QName, count: usize) -> Result<(), Error> {
        self.events.push(Event::StartLeafSet(name.clone(), count));
        Ok(())
    }

    fn leaf_set_entry(&mut self, value: &Value) -> Result<(), Error> {
        self.events.push(Event::LeafSetEntry(value.clone()));
        Ok(())
    }

    fn leaf(&mut self, name: &QName, value: &Value) -> Result<(), Error> {
        self.events.push(Event::Leaf(name.clone(), value.clone()));
        Ok(())
    }

    fn end_node(&mut self) -> Result<(), Error> {
        self.events.push(Event::End);
        Ok(())
    }
}
