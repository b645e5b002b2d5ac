//! MCP prompt templates.

pub mod query;
pub mod registry;

pub use registry::PromptRegistry;
