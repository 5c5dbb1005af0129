use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::{request::RequestParams, types::JsonRpcVersion};

/// A JSON-RPC notification: a request whose `id` key is entirely absent.
/// Notifications are never answered, even when handling fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
        }
    }

    /// Create a notification with no parameters.
    pub fn new_no_params(method: impl Into<String>) -> Self {
        Self::new(method, None)
    }

    /// Create a notification with named parameters.
    pub fn new_with_object_params(
        method: impl Into<String>,
        params: HashMap<String, Value>,
    ) -> Self {
        Self::new(method, Some(RequestParams::Object(params)))
    }

    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_string};

    #[test]
    fn test_notification_has_no_id_key() {
        let notification = JsonRpcNotification::new_no_params("ping");
        let json_str = to_string(&notification).unwrap();

        assert!(!json_str.contains("\"id\""));
        assert!(json_str.contains("\"jsonrpc\":\"2.0\""));
        assert!(json_str.contains("\"method\":\"ping\""));
    }

    #[test]
    fn test_notification_with_params() {
        let mut params = HashMap::new();
        params.insert("message".to_string(), json!("Hello"));
        params.insert("level".to_string(), json!("info"));

        let notification = JsonRpcNotification::new_with_object_params("log", params);

        assert_eq!(notification.get_param("message"), Some(&json!("Hello")));
        assert_eq!(notification.get_param("level"), Some(&json!("info")));
    }
}
