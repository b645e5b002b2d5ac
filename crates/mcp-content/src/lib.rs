//! mcp-content: random data, file resources, and prompt templates served by stdio-mcp.

pub mod file;
pub mod prompt;
pub mod random;
pub mod types;

pub use file::{guess_mime_type, FileResourceReader, MAX_FILE_BYTES};
pub use prompt::{query_prompt, QUERY_PROMPT_NAME};
pub use random::{
    random_data, random_string, DEFAULT_RANDOM_STRING_LENGTH, MAX_RANDOM_LENGTH,
};
pub use types::*;
