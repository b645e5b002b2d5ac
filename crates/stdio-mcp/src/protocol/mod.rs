//! MCP protocol handling: classification, handshake, and dispatch.

pub mod classifier;
pub mod handler;
pub mod marshal;
pub mod negotiation;
pub mod registry;
pub mod session;

pub use classifier::{classify, Classified, MessageKind};
pub use handler::ProtocolHandler;
pub use registry::{decode_optional_params, decode_params, HandlerRegistry, RequestHandler};
pub use session::SessionState;
