use mcp_types::JsonRpcError;
use mcp_types::JsonRpcErrorObject;
use mcp_types::JsonRpcMessage;
use mcp_types::JsonRpcNotification;
use mcp_types::JsonRpcRequest;
use mcp_types::JsonRpcResponse;
use mcp_types::RequestId;
use serde_json::Value;

use crate::error::ProtocolError;

/// Serializes a message to a single JSON-RPC frame, sorted-key and
/// slash-unescaped. Struct field order (`jsonrpc, id, method, ...`) is not
/// lexicographic, so serializing the envelope struct directly would emit
/// keys in declaration order; routing through `serde_json::to_value` first
/// rebuilds the envelope as a `Map` (`serde_json`'s default, non-
/// `preserve_order` backing is a `BTreeMap`), which *is* sorted, and only
/// that `Value` gets serialized to bytes.
pub fn encode(message: &JsonRpcMessage) -> Result<Vec<u8>, ProtocolError> {
    let value = serde_json::to_value(message).map_err(|e| ProtocolError::Internal(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| ProtocolError::Internal(e.to_string()))
}

/// A raw inbound frame, classified per the protocol's four-way rule before
/// any attempt is made to deserialize it into a concrete
/// [`JsonRpcMessage`] variant. Operating on the raw [`Value`] here (rather
/// than attempting `#[serde(untagged)]` deserialization straight from bytes)
/// is what lets rule 4 recover a best-effort id from genuinely malformed
/// input for the diagnostic error response.
pub enum Classified {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
    Notification(JsonRpcNotification),
    /// Bytes were not valid JSON, or parsed to a shape matching none of the
    /// four envelopes. Carries any `id` recoverable from the input so the
    /// server can still reply with a correlated `ParseError`.
    Malformed { recovered_id: Option<RequestId> },
}

/// Parses and classifies one inbound frame per the rules in
/// `mcp_core::codec`: `id` + `result`/`error` is a Response, `id` + `method`
/// is a Request, `method` with no `id` is a Notification, anything else is
/// Malformed. A frame that would match both Response and Notification
/// shapes (impossible under well-formed JSON-RPC) is classified as a
/// Response, matching rule precedence.
pub fn classify_frame(bytes: &[u8]) -> Classified {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => return Classified::Malformed { recovered_id: None },
    };
    classify_value(value)
}

fn classify_value(value: Value) -> Classified {
    let Value::Object(ref map) = value else {
        return Classified::Malformed { recovered_id: None };
    };

    let has_id = map.contains_key("id");
    let has_result_or_error = map.contains_key("result") || map.contains_key("error");
    let has_method = map.contains_key("method");

    if has_id && has_result_or_error {
        if let Ok(response) = serde_json::from_value::<JsonRpcResponse>(value.clone()) {
            return Classified::Response(response);
        }
        if let Ok(error) = serde_json::from_value::<JsonRpcError>(value.clone()) {
            return Classified::Error(error);
        }
    }
    if has_id && has_method {
        if let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            return Classified::Request(request);
        }
    }
    if has_method && !has_id {
        if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(value.clone()) {
            return Classified::Notification(notification);
        }
    }

    let recovered_id = map.get("id").and_then(|id| {
        serde_json::from_value::<RequestId>(id.clone()).ok()
    });
    Classified::Malformed { recovered_id }
}

/// Builds the diagnostic `ParseError` response for a malformed frame, using
/// `recovered_id` if one was present or a freshly generated one otherwise.
/// Server-side only: clients have no one to report a malformed inbound
/// frame to.
pub fn parse_error_response(recovered_id: Option<RequestId>) -> JsonRpcError {
    let id = recovered_id.unwrap_or_else(generate_diagnostic_id);
    JsonRpcError::new(
        id,
        JsonRpcErrorObject::new(
            mcp_types::ErrorCode::PARSE_ERROR.as_i32(),
            "failed to parse JSON-RPC frame",
        ),
    )
}

fn generate_diagnostic_id() -> RequestId {
    RequestId::String(uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_emits_lexicographically_sorted_keys() {
        // `JsonRpcResponse`'s fields are declared `jsonrpc, id, result`, which
        // is not lexicographic ("id" sorts before "jsonrpc"). `encode` must
        // not simply serialize the struct -- it has to rebuild the envelope
        // as a `Value` first so the `Map`'s `BTreeMap` backing sorts it.
        let response = JsonRpcResponse::new(RequestId::Integer(1), serde_json::json!({"ok": true}));
        let bytes = encode(&JsonRpcMessage::Response(response)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"id":1,"jsonrpc":"2.0","result":{"ok":true}}"#);
    }

    #[test]
    fn request_is_classified_as_request() {
        let bytes = br#"{"jsonrpc":"2.0","id":7,"method":"initialize","params":{}}"#;
        match classify_frame(bytes) {
            Classified::Request(request) => {
                assert_eq!(request.method, "initialize");
                assert_eq!(request.id, RequestId::Integer(7));
            }
            _ => panic!("expected Request"),
        }
    }

    #[test]
    fn response_with_result_is_classified_as_response() {
        let bytes = br#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
        assert!(matches!(classify_frame(bytes), Classified::Response(_)));
    }

    #[test]
    fn notification_has_no_id() {
        let bytes = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(matches!(
            classify_frame(bytes),
            Classified::Notification(_)
        ));
    }

    #[test]
    fn request_with_absent_params_still_classifies_as_request() {
        // `params` is optional on JsonRpcRequest, so an id+method frame
        // with no `params` field decodes fine rather than falling through
        // to Malformed.
        let bytes = br#"{"id":7,"method":"initialize"}"#;
        match classify_frame(bytes) {
            Classified::Request(request) => assert_eq!(request.id, RequestId::Integer(7)),
            _ => panic!("expected Request"),
        }
    }

    #[test]
    fn invalid_json_is_malformed_with_no_recoverable_id() {
        let bytes = b"not json";
        match classify_frame(bytes) {
            Classified::Malformed { recovered_id } => assert_eq!(recovered_id, None),
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn object_missing_every_required_field_recovers_its_id_if_present() {
        let bytes = br#"{"id":9,"unrelated":true}"#;
        match classify_frame(bytes) {
            Classified::Malformed { recovered_id } => {
                assert_eq!(recovered_id, Some(RequestId::Integer(9)))
            }
            _ => panic!("expected Malformed"),
        }
    }
}
