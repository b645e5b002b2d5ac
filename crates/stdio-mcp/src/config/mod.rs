//! Configuration loading and resolution.
//!
//! Every setting resolves the same way: explicit value, then environment
//! variable, then built-in default.

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::framing::{Framing, DEFAULT_MAX_FRAME_BYTES};
use crate::transport::writer::DEFAULT_WRITE_QUEUE_CAPACITY;
use crate::types::{
    Implementation, InitializeResult, McpError, McpResult, CLIENT_NAME, MCP_VERSION, SERVER_NAME,
    SERVER_VERSION,
};

pub const ENV_FRAMING: &str = "MCP_FRAMING";
pub const ENV_FILE_ROOT: &str = "MCP_FILE_ROOT";
pub const ENV_REQUEST_TIMEOUT: &str = "MCP_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SERVER_INSTRUCTIONS: &str = "Example MCP server. Tools generate random strings and \
     ping hosts; resources serve random data and local files; the `query` prompt frames \
     a question for the model.";

/// Resolve the wire framing.
pub fn resolve_framing(explicit: Option<&str>) -> McpResult<Framing> {
    if let Some(value) = explicit {
        return value.parse();
    }

    match std::env::var(ENV_FRAMING) {
        Ok(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(Framing::default()),
    }
}

/// Resolve the directory that `file://` resources are confined to.
pub fn resolve_file_root(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    std::env::var(ENV_FILE_ROOT)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Resolve the client's per-request timeout. Zero disables it.
pub fn resolve_request_timeout(explicit: Option<u64>) -> McpResult<Option<Duration>> {
    let secs = match explicit {
        Some(secs) => secs,
        None => match std::env::var(ENV_REQUEST_TIMEOUT) {
            Ok(value) if !value.trim().is_empty() => value.trim().parse().map_err(|_| {
                McpError::Config(format!("{ENV_REQUEST_TIMEOUT} must be whole seconds, got '{value}'"))
            })?,
            _ => return Ok(Some(DEFAULT_REQUEST_TIMEOUT)),
        },
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

/// Settings for one server connection.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub framing: Framing,
    pub write_queue_capacity: usize,
    pub max_frame_bytes: usize,
    pub protocol_version: String,
    pub server_info: Implementation,
    pub instructions: Option<String>,
    pub file_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            write_queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            protocol_version: MCP_VERSION.to_string(),
            server_info: Implementation::new(SERVER_NAME, SERVER_VERSION),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            file_root: None,
        }
    }
}

impl ServerConfig {
    /// Build from CLI values, falling back to the environment.
    pub fn resolve(framing: Option<&str>, file_root: Option<&str>) -> McpResult<Self> {
        Ok(Self {
            framing: resolve_framing(framing)?,
            file_root: resolve_file_root(file_root),
            ..Self::default()
        })
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// The `initialize` result this server answers with.
    pub fn initialize_result(&self) -> InitializeResult {
        let result = InitializeResult::new(self.protocol_version.clone(), self.server_info.clone());
        match &self.instructions {
            Some(text) => result.with_instructions(text.clone()),
            None => result,
        }
    }
}

/// Settings for one client connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub framing: Framing,
    pub write_queue_capacity: usize,
    pub max_frame_bytes: usize,
    pub request_timeout: Option<Duration>,
    pub protocol_version: String,
    pub client_info: Implementation,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            write_queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            protocol_version: MCP_VERSION.to_string(),
            client_info: Implementation::new(CLIENT_NAME, SERVER_VERSION),
        }
    }
}

impl ClientConfig {
    pub fn resolve(framing: Option<&str>, timeout_secs: Option<u64>) -> McpResult<Self> {
        Ok(Self {
            framing: resolve_framing(framing)?,
            request_timeout: resolve_request_timeout(timeout_secs)?,
            ..Self::default()
        })
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}
