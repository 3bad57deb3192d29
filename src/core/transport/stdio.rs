//! STDIO transport implementation.
//!
//! Serves the tool catalogue over MCP on stdin/stdout. The HTTP gate does not
//! apply here: the caller is the local parent process.

use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::GatewayServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve one MCP session until the client disconnects.
    pub async fn run(server: GatewayServer) -> TransportResult<()> {
        let tool_count = server.list_tools().len();

        let session = server
            .serve(stdio())
            .await
            .map_err(|e| TransportError::init(format!("MCP handshake failed: {e}")))?;
        info!("Ready - {} tools available over stdin/stdout", tool_count);

        let reason = session
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO session ended: {:?}", reason);
        Ok(())
    }
}
