//! Request dispatch: the validation pipeline that turns raw JSON into
//! response envelopes.
//!
//! Each incoming value is processed independently. Batches preserve the
//! input order of their non-notification entries, every call yields exactly
//! one envelope, every notification yields none, and no handler failure
//! escapes to the transport.

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use crate::JSONRPC_VERSION;
use crate::error::JsonRpcError;
use crate::registry::MethodRegistry;
use crate::request::RequestParams;
use crate::response::JsonRpcMessage;
use crate::types::RequestId;

/// Outcome of dispatching one transport payload.
#[derive(Debug, Clone)]
pub enum DispatchOutput {
    /// A single response envelope
    Single(JsonRpcMessage),
    /// Responses for the non-notification entries of a batch, in input order
    Batch(Vec<JsonRpcMessage>),
    /// Nothing to send: the input was a notification, or a batch of them
    Empty,
}

impl DispatchOutput {
    pub fn is_empty(&self) -> bool {
        matches!(self, DispatchOutput::Empty)
    }

    /// Serialize for the wire. `None` means the transport should answer with
    /// no content.
    pub fn to_body(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            DispatchOutput::Single(message) => serde_json::to_string(message).map(Some),
            DispatchOutput::Batch(messages) => serde_json::to_string(messages).map(Some),
            DispatchOutput::Empty => Ok(None),
        }
    }
}

/// JSON-RPC 2.0 dispatcher over a method registry.
///
/// Stateless between calls: concurrent dispatches are safe as long as the
/// registered handlers are.
pub struct Dispatcher {
    registry: MethodRegistry,
}

impl Dispatcher {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Dispatch a raw request body. Undecodable input becomes a PARSE_ERROR
    /// envelope with a null id.
    pub async fn dispatch_text(&self, body: &str) -> DispatchOutput {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.dispatch(value).await,
            Err(err) => {
                debug!("Rejecting undecodable request body: {}", err);
                DispatchOutput::Single(JsonRpcMessage::Error(JsonRpcError::parse_error()))
            }
        }
    }

    /// Dispatch an already-parsed JSON value: a single request envelope or a
    /// batch array of them.
    pub async fn dispatch(&self, raw: Value) -> DispatchOutput {
        match raw {
            Value::Array(entries) => {
                // An empty batch is itself an invalid request, not a silent
                // no-content.
                if entries.is_empty() {
                    return DispatchOutput::Single(JsonRpcMessage::Error(
                        JsonRpcError::invalid_request(RequestId::Null),
                    ));
                }

                let mut responses = Vec::new();
                for entry in entries {
                    if let Some(message) = self.process(entry).await {
                        responses.push(message);
                    }
                }

                if responses.is_empty() {
                    DispatchOutput::Empty
                } else {
                    DispatchOutput::Batch(responses)
                }
            }
            single => match self.process(single).await {
                Some(message) => DispatchOutput::Single(message),
                None => DispatchOutput::Empty,
            },
        }
    }

    /// Validate and execute one request envelope. Returns `None` when the
    /// entry was a notification (valid or not) and must not be answered.
    async fn process(&self, raw: Value) -> Option<JsonRpcMessage> {
        // Structural validation: a non-object entry is never a notification,
        // so it always earns an error envelope.
        let Value::Object(mut fields) = raw else {
            return Some(JsonRpcMessage::Error(JsonRpcError::invalid_request(
                RequestId::Null,
            )));
        };

        // Presence of the id key, not its value, separates calls from
        // notifications.
        let (is_notification, id) = match fields.remove("id") {
            None => (true, RequestId::Null),
            Some(value) => match RequestId::from_value(&value) {
                Some(id) => (false, id),
                // The id key exists but holds an unusable value; nothing to
                // echo, but it is still not a notification.
                None => {
                    return Some(JsonRpcMessage::Error(JsonRpcError::invalid_request(
                        RequestId::Null,
                    )));
                }
            },
        };

        let version_ok = fields
            .get("jsonrpc")
            .and_then(Value::as_str)
            .is_some_and(|v| v == JSONRPC_VERSION);
        if !version_ok {
            return self.reject_invalid(is_notification, id);
        }

        let Some(method) = fields.get("method").and_then(Value::as_str).map(String::from) else {
            return self.reject_invalid(is_notification, id);
        };

        let params = match fields.remove("params") {
            None => None,
            Some(value) => match RequestParams::from_value(value) {
                Ok(params) => params,
                Err(()) => return self.reject_invalid(is_notification, id),
            },
        };

        let Some(handler) = self.registry.lookup(&method) else {
            debug!("Method '{}' not registered", method);
            if is_notification {
                return None;
            }
            return Some(JsonRpcMessage::Error(JsonRpcError::method_not_found(
                id, &method,
            )));
        };

        debug!(method = %method, notification = is_notification, "Dispatching");

        match AssertUnwindSafe(handler.call(&method, params))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => {
                if is_notification {
                    None
                } else {
                    Some(JsonRpcMessage::success(id, result))
                }
            }
            Ok(Err(method_error)) => {
                debug!(method = %method, "Method failed: {}", method_error);
                if is_notification {
                    None
                } else {
                    Some(JsonRpcMessage::Error(JsonRpcError::new(
                        id,
                        method_error.to_error_object(),
                    )))
                }
            }
            Err(_panic) => {
                warn!(method = %method, "Method panicked during invocation");
                if is_notification {
                    None
                } else {
                    Some(JsonRpcMessage::Error(JsonRpcError::internal_error(
                        id,
                        Some(format!("Method '{}' aborted unexpectedly", method)),
                    )))
                }
            }
        }
    }

    fn reject_invalid(&self, is_notification: bool, id: RequestId) -> Option<JsonRpcMessage> {
        if is_notification {
            None
        } else {
            Some(JsonRpcMessage::Error(JsonRpcError::invalid_request(id)))
        }
    }
}
