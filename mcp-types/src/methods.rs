use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::capabilities::ClientCapabilities;
use crate::capabilities::Implementation;
use crate::capabilities::ServerCapabilities;

/// The only protocol version this crate speaks. A server rejects any
/// `initialize` request whose `protocolVersion` does not match exactly.
pub const CURRENT_PROTOCOL_VERSION: &str = "2025-06-18";

/// A compile-time method descriptor: binds a wire method name to its
/// parameter and result types. Implementations are typically zero-sized
/// marker types (`InitializeRequest`, `PingRequest`, or an embedder's own
/// `ListToolsRequest`); the registry and the client's `send_request::<R>()`
/// are generic over `R: McpRequest`.
pub trait McpRequest {
    const METHOD: &'static str;
    type Params: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Result: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// The notification analogue of [`McpRequest`]: a method name bound to a
/// parameter type, with no result.
pub trait McpNotification {
    const METHOD: &'static str;
    type Params: Serialize + DeserializeOwned + Send + Sync + 'static;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequestParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: Implementation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// The `initialize` request that begins every session.
pub struct InitializeRequest;

impl McpRequest for InitializeRequest {
    const METHOD: &'static str = "initialize";
    type Params = InitializeRequestParams;
    type Result = InitializeResult;
}

/// The `ping` request, answerable before and after the handshake.
pub struct PingRequest;

impl McpRequest for PingRequest {
    const METHOD: &'static str = "ping";
    type Params = Option<()>;
    type Result = serde_json::Value;
}

/// The `notifications/initialized` notification the server emits shortly
/// after responding to `initialize`.
pub struct InitializedNotification;

impl McpNotification for InitializedNotification {
    const METHOD: &'static str = "notifications/initialized";
    type Params = Option<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initialize_params_serialize_as_camel_case_on_the_wire() {
        let params = InitializeRequestParams {
            protocol_version: CURRENT_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation::new("acme-client", "1.2.3"),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["protocolVersion"], CURRENT_PROTOCOL_VERSION);
        assert_eq!(value["clientInfo"]["name"], "acme-client");
    }
}
