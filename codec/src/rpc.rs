//! Invoking typed RPC implementations with generic input.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::binding::DataObject;
use crate::data::NormalizedNode;
use crate::{BindingCodecContext, Error, QName};

/// A typed RPC implementation: takes the generated input type and returns
/// the generated output type, if the RPC has output.
pub type RpcMethod =
    Arc<dyn Fn(Arc<dyn DataObject>) -> Result<Option<Arc<dyn DataObject>>, Error> + Send + Sync>;

/// Maps RPC names to their implementations.
#[derive(Clone, Default)]
pub struct RpcMethodTable {
    methods: HashMap<QName, RpcMethod>,
}

impl RpcMethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, rpc: QName, method: F) -> &mut Self
    where
        F: Fn(Arc<dyn DataObject>) -> Result<Option<Arc<dyn DataObject>>, Error> + Send + Sync + 'static,
    {
        self.methods.insert(rpc, Arc::new(method));
        self
    }

    pub fn get(&self, rpc: &QName) -> Option<&RpcMethod> {
        self.methods.get(rpc)
    }
}

impl fmt::Debug for RpcMethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

/// Dispatches RPC calls to a [RpcMethodTable], converting input and output
/// through the RPC codecs of a [BindingCodecContext].
#[derive(Debug)]
pub struct RpcInvoker {
    context: Arc<BindingCodecContext>,
    methods: RpcMethodTable,
}

impl RpcInvoker {
    pub fn new(context: Arc<BindingCodecContext>, methods: RpcMethodTable) -> Self {
        Self { context, methods }
    }

    fn method(&self, rpc: &QName) -> Result<&RpcMethod, Error> {
        self.methods
            .get(rpc)
            .ok_or_else(|| Error::UnknownRpc(format!("no implementation for {}", rpc)))
    }

    /// Calls `rpc` with generic input, returning generic output.
    #[instrument(skip_all, fields(rpc = %rpc))]
    pub fn invoke(&self, rpc: &QName, input: &Arc<NormalizedNode>) -> Result<Option<NormalizedNode>, Error> {
        let method = self.method(rpc)?;
        let typed_input = self.context.rpc_input_codec(rpc)?.deserialize(input)?;

        match method(typed_input)? {
            Some(output) => {
                let output = self
                    .context
                    .rpc_output_codec(rpc)?
                    .serialize(output.as_ref())?;
                Ok(Some(output))
            }
            None => {
                debug!("rpc returned no output");
                Ok(None)
            }
        }
    }

    /// Calls `rpc` with typed input, passing input and output through
    /// unchanged.
    #[instrument(skip_all, fields(rpc = %rpc))]
    pub fn invoke_binding(
        &self,
        rpc: &QName,
        input: Arc<dyn DataObject>,
    ) -> Result<Option<Arc<dyn DataObject>>, Error> {
        let method = self.method(rpc)?;
        let (expected, _) = self
            .context
            .registry()
            .rpc_classes(rpc)
            .ok_or_else(|| Error::UnknownRpc(format!("{} has no binding", rpc)))?;
        if input.implemented_interface() != expected {
            return Err(Error::SchemaMismatch(format!(
                "{} expects {}, got {}",
                rpc,
                expected,
                input.implemented_interface()
            )));
        }
        method(input)
    }
}
