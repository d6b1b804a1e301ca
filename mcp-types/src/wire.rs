use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::id::RequestId;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// One classified JSON-RPC frame. The four variants have disjoint required
/// fields (`Request` needs `method`, `Response`/`Error` need `id` plus
/// `result`/`error`, `Notification` needs `method` and no `id`), so
/// `#[serde(untagged)]` classifies unambiguously; it rejects anything that
/// matches none of the four shapes rather than guessing. Best-effort
/// id-recovery for genuinely malformed frames (classification rule 4) is
/// handled one level up, in `mcp_core::codec::classify_frame`, which works
/// from the raw `Value` before a `JsonRpcMessage` exists at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
    Notification(JsonRpcNotification),
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(value: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(value)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(value: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(value)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(value: JsonRpcError) -> Self {
        JsonRpcMessage::Error(value)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(value: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_serializes_with_sorted_keys() {
        let request = JsonRpcRequest::new(
            RequestId::Integer(1),
            "initialize",
            Some(serde_json::json!({"protocolVersion": "2025-06-18"})),
        );
        let value = serde_json::to_value(&JsonRpcMessage::from(request)).unwrap();
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(
            text,
            r#"{"id":1,"jsonrpc":"2.0","method":"initialize","params":{"protocolVersion":"2025-06-18"}}"#
        );
    }

    #[test]
    fn notification_without_params_omits_the_field() {
        let notification = JsonRpcNotification::new("notifications/initialized", None);
        let value = serde_json::to_value(&JsonRpcMessage::from(notification)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        );
    }

    #[test]
    fn forward_slashes_are_not_escaped() {
        let notification =
            JsonRpcNotification::new("notifications/initialized", Some(serde_json::json!("a/b")));
        let text = serde_json::to_string(&JsonRpcMessage::from(notification)).unwrap();
        assert!(text.contains("a/b"));
        assert!(!text.contains("a\\/b"));
    }
}
