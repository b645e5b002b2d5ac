//! MCP tool implementations.

pub mod ping;
pub mod random_string;
pub mod registry;

pub use registry::ToolRegistry;
