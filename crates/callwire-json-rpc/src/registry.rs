use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::JsonRpcErrorObject;
use crate::request::RequestParams;

/// Failure of a registered method.
///
/// The two variants carry the code split the dispatcher maps onto the wire:
/// `InvalidParams` for argument-shape mismatches caught at the decode
/// boundary (-32602), `Failed` for anything that went wrong inside the
/// method's own logic (-32603).
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Failed(String),
}

impl MethodError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        MethodError::InvalidParams(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MethodError::Failed(message.into())
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            MethodError::InvalidParams(msg) => JsonRpcErrorObject::invalid_params(msg),
            MethodError::Failed(msg) => JsonRpcErrorObject::internal_error(Some(msg.clone())),
        }
    }
}

/// A JSON-RPC method handler. One handler may serve several method names;
/// the invoked name is passed back so the handler can branch on it.
#[async_trait]
pub trait RpcMethod: Send + Sync {
    async fn call(&self, method: &str, params: Option<RequestParams>)
    -> Result<Value, MethodError>;

    /// Method names this handler serves, used for registration convenience
    /// and introspection.
    fn method_names(&self) -> Vec<String> {
        vec![]
    }
}

/// Mapping from method name to handler, supplied by the embedding service.
///
/// Lookup returns `Option` so "unknown method" is a distinguished condition
/// the dispatcher can map to METHOD_NOT_FOUND without inspecting error
/// message text.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn RpcMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a single method name.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: RpcMethod + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
    }

    /// Register a handler under every name it declares via `method_names`.
    pub fn register_service<H>(&mut self, handler: H)
    where
        H: RpcMethod + 'static,
    {
        let handler = Arc::new(handler);
        for method in handler.method_names() {
            self.handlers.insert(method, handler.clone());
        }
    }

    /// Register one handler under an explicit list of names.
    pub fn register_methods<H>(&mut self, methods: Vec<String>, handler: H)
    where
        H: RpcMethod + 'static,
    {
        let handler = Arc::new(handler);
        for method in methods {
            self.handlers.insert(method, handler.clone());
        }
    }

    pub fn lookup(&self, method: &str) -> Option<Arc<dyn RpcMethod>> {
        self.handlers.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Decode request params into a typed parameter struct.
///
/// Named params deserialize directly. Positional params are zipped against
/// `names`, the method's declared parameter order, so `[10, 5]` and
/// `{"a": 10, "b": 5}` decode identically for `names = ["a", "b"]`. Absent
/// params decode from an empty object, which succeeds only when every field
/// of `T` is optional or defaulted.
pub fn decode_params<T>(params: Option<RequestParams>, names: &[&str]) -> Result<T, MethodError>
where
    T: DeserializeOwned,
{
    let map = match params {
        None => serde_json::Map::new(),
        Some(RequestParams::Object(map)) => map.into_iter().collect(),
        Some(RequestParams::Array(values)) => {
            if values.len() > names.len() {
                return Err(MethodError::invalid_params(format!(
                    "expected at most {} positional parameters, got {}",
                    names.len(),
                    values.len()
                )));
            }
            names
                .iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), value))
                .collect()
        }
    };

    serde_json::from_value(Value::Object(map))
        .map_err(|err| MethodError::invalid_params(err.to_string()))
}
