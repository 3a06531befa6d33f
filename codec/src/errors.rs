use thiserror::Error;

/// Errors produced while building codecs or converting between the typed
/// binding world and the generic tree.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The requested type or path argument is not reachable from this codec.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A codec could not be built for a schema node.
    #[error("unable to construct codec: {0}")]
    SchemaConstruction(String),

    /// The codec was closed and may no longer be used.
    #[error("codec has been invalidated")]
    InvalidatedCodec,

    #[error("{ancestor} is not an ancestor of {path}")]
    NotAncestor { ancestor: String, path: String },

    /// A scalar does not fit the type it is converted to.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Data handed to a codec is malformed for the node it describes.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Events were fed to a stream writer in an order it cannot accept.
    #[error("stream error: {0}")]
    Stream(String),

    #[error("unknown rpc: {0}")]
    UnknownRpc(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Config(value.to_string())
    }
}
