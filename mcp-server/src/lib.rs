//! The server side of an MCP session: a typed facade over `mcp-core`'s
//! dispatch engine that installs the default `initialize`/`ping` handlers,
//! plus a reference stdio transport for talking to a client over the
//! process's own stdin/stdout.

mod server;
mod stdio_transport;
mod subscriptions;

pub use server::InitializeHook;
pub use server::Server;
pub use stdio_transport::StdioTransport;
pub use subscriptions::SubscriptionTable;

pub use mcp_core::Config;
pub use mcp_core::ProtocolError;
