//! System utility methods: liveness ping and server introspection.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use callwire_json_rpc::{MethodError, RequestParams, RpcMethod};

pub struct SystemService {
    supported_methods: Vec<String>,
}

impl SystemService {
    /// `supported_methods` is the full method list the server should report,
    /// normally taken from the registry after the other services are in.
    pub fn new(supported_methods: Vec<String>) -> Self {
        Self { supported_methods }
    }

    /// The names this service itself contributes.
    pub fn method_set() -> &'static [&'static str] {
        &["get_server_info", "ping"]
    }

    fn ping(&self) -> Value {
        json!({
            "message": "pong",
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    fn get_server_info(&self) -> Value {
        json!({
            "server_type": "JSON-RPC",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
            "status": "running",
            "supported_methods": self.supported_methods,
        })
    }
}

#[async_trait]
impl RpcMethod for SystemService {
    async fn call(
        &self,
        method: &str,
        _params: Option<RequestParams>,
    ) -> Result<Value, MethodError> {
        match method {
            "ping" => Ok(self.ping()),
            "get_server_info" => Ok(self.get_server_info()),
            other => Err(MethodError::failed(format!(
                "SystemService does not handle '{other}'"
            ))),
        }
    }

    fn method_names(&self) -> Vec<String> {
        Self::method_set().iter().map(|s| s.to_string()).collect()
    }
}
