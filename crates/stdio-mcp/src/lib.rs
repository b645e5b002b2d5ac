//! JSON-RPC over stdio engine for MCP servers and clients.
//!
//! The server half reads frames, drives the `initialize` handshake, and
//! routes requests to registered handlers on their own tasks. The client
//! half correlates responses to requests by id. Both write through a single
//! queue so frames never interleave.

pub mod client;
pub mod config;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::{McpClient, PendingCall, ServerProcess};
pub use config::{ClientConfig, ServerConfig};
pub use protocol::{HandlerRegistry, ProtocolHandler, RequestHandler};
pub use server::default_registry;
pub use transport::{Framing, StdioTransport};
pub use types::{McpError, McpResult, RequestId};
