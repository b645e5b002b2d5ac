//! `initialize` parameter validation and result construction.

use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, McpError, McpResult,
};

/// What the client told us during the handshake.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub client_info: Option<Implementation>,
    pub requested_version: Option<String>,
}

impl NegotiatedCapabilities {
    /// Validate the client's parameters and produce the server's answer.
    ///
    /// A version mismatch is not an error; the server answers with its own
    /// version and leaves the decision to the client.
    pub fn negotiate(
        &mut self,
        params: InitializeParams,
        server: &InitializeResult,
    ) -> McpResult<InitializeResult> {
        if params.protocol_version.trim().is_empty() {
            return Err(McpError::InvalidParams(
                "initialize requires a non-empty protocolVersion".to_string(),
            ));
        }

        if params.protocol_version != server.protocol_version {
            tracing::warn!(
                "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                params.protocol_version,
                server.protocol_version
            );
        }

        match &params.client_info {
            Some(info) => tracing::info!("Initializing session with client: {info}"),
            None => tracing::info!("Initializing session with unnamed client"),
        }

        self.requested_version = Some(params.protocol_version);
        self.client = params.capabilities;
        self.client_info = params.client_info;

        Ok(server.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MCP_VERSION;

    fn server() -> InitializeResult {
        InitializeResult::new(MCP_VERSION, Implementation::new("srv", "1"))
    }

    #[test]
    fn test_empty_version_rejected() {
        let mut caps = NegotiatedCapabilities::default();
        let err = caps
            .negotiate(InitializeParams::default(), &server())
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
        assert!(caps.requested_version.is_none());
    }

    #[test]
    fn test_mismatched_version_answers_with_server_version() {
        let mut caps = NegotiatedCapabilities::default();
        let params = InitializeParams::new("1999-01-01", Implementation::new("t", "1"));
        let result = caps.negotiate(params, &server()).unwrap();
        assert_eq!(result.protocol_version, MCP_VERSION);
        assert_eq!(caps.requested_version.as_deref(), Some("1999-01-01"));
        assert_eq!(caps.client_info.unwrap().name, "t");
    }
}
