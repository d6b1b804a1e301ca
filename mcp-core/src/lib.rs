//! Shared engine for both ends of an MCP session: the wire codec, the
//! type-erased method/notification registries, the pending-request table,
//! the lifecycle state machines, and the transport abstraction.
//!
//! `mcp-client` and `mcp-server` each wrap these pieces in a small facade;
//! neither talks to the wire directly.

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod notifications;
pub mod pending;
pub mod registry;
pub mod transport;

pub use config::Config;
pub use error::ProtocolError;
pub use error::Result;
