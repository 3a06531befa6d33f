mod errors;
mod qname;
mod root;

pub mod binding;
pub mod codec;
pub mod config;
pub mod data;
pub mod query;
pub mod rpc;
pub mod schema;
pub mod value;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use codec::{CachingCodec, CodecNode};
pub use config::{CodecConfig, DeserializationStrategy};
pub use errors::Error;
pub use qname::QName;
pub use root::BindingCodecContext;

#[cfg(test)]
mod tests;
