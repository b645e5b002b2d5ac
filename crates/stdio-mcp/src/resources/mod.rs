//! MCP resource implementations.

pub mod file;
pub mod random_data;
pub mod registry;
pub mod templates;

pub use registry::ResourceRegistry;
