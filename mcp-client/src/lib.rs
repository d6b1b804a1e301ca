//! The client side of an MCP session: a typed facade over
//! `mcp-core`'s dispatch engine, plus a reference stdio-subprocess
//! transport.

mod child_process_transport;
mod client;
mod methods;

pub use child_process_transport::ChildProcessTransport;
pub use client::Client;
pub use methods::CallToolParams;
pub use methods::CallToolRequest;
pub use methods::CallToolResult;
pub use methods::CursorParams;
pub use methods::GetPromptParams;
pub use methods::GetPromptRequest;
pub use methods::GetPromptResult;
pub use methods::ListPromptsRequest;
pub use methods::ListPromptsResult;
pub use methods::ListResourcesRequest;
pub use methods::ListResourcesResult;
pub use methods::ListToolsRequest;
pub use methods::ListToolsResult;
pub use methods::Prompt;
pub use methods::ReadResourceParams;
pub use methods::ReadResourceRequest;
pub use methods::ReadResourceResult;
pub use methods::Resource;
pub use methods::SubscribeParams;
pub use methods::SubscribeRequest;
pub use methods::Tool;

pub use mcp_core::Config;
pub use mcp_core::ProtocolError;
