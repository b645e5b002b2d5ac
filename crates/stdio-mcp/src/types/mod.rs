//! All MCP data types used by the engine, the server, and the client.

pub mod capabilities;
pub mod error;
pub mod message;
pub mod methods;
pub mod request;
pub mod response;

pub use capabilities::*;
pub use error::*;
pub use message::*;
pub use request::*;
pub use response::*;
