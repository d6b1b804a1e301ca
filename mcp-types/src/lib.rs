//! Wire-level types for the Model Context Protocol.
//!
//! This crate has no knowledge of transports, dispatch, or lifecycle; it only
//! defines the JSON-RPC envelopes exchanged on the wire, the request id type,
//! capability/peer-info structs, and the well-known handshake methods
//! (`initialize`, `ping`, `notifications/initialized`). Everything else is
//! method-specific and is registered by embedding code via the
//! [`McpRequest`]/[`McpNotification`] traits.

mod capabilities;
mod error_code;
mod id;
mod methods;
mod wire;

pub use capabilities::ClientCapabilities;
pub use capabilities::Implementation;
pub use capabilities::LoggingCapability;
pub use capabilities::PromptsCapability;
pub use capabilities::ResourcesCapability;
pub use capabilities::RootsCapability;
pub use capabilities::SamplingCapability;
pub use capabilities::ServerCapabilities;
pub use capabilities::ToolsCapability;
pub use error_code::ErrorCode;
pub use id::RequestId;
pub use methods::InitializeRequest;
pub use methods::InitializeRequestParams;
pub use methods::InitializeResult;
pub use methods::InitializedNotification;
pub use methods::McpNotification;
pub use methods::McpRequest;
pub use methods::PingRequest;
pub use methods::CURRENT_PROTOCOL_VERSION;
pub use wire::JSONRPC_VERSION;
pub use wire::JsonRpcError;
pub use wire::JsonRpcErrorObject;
pub use wire::JsonRpcMessage;
pub use wire::JsonRpcNotification;
pub use wire::JsonRpcRequest;
pub use wire::JsonRpcResponse;

pub use serde_json::Value;
