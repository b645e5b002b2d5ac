//! Transport layer: framing, the single writer, and the server read loop.

pub mod framing;
pub mod stdio;
pub mod writer;

pub use framing::{encode_frame, FrameError, FrameReader, Framing};
pub use stdio::StdioTransport;
pub use writer::{spawn_writer, FrameSender, WriterTask};
