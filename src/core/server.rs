//! Gateway server and MCP handler.
//!
//! [`GatewayServer`] owns the configuration, the backend client and the tool
//! registry. The HTTP transport calls into it directly; over STDIO it acts as
//! the rmcp `ServerHandler`, with the ToolRouter built from the same
//! catalogue in `domains/tools/router.rs`.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use serde_json::Value;
use std::sync::Arc;

use super::config::Config;
use crate::domains::openproject::BackendClient;
use crate::domains::tools::{
    ToolArgs, ToolCall, ToolName, ToolRegistry, ToolResult, build_tool_router, dispatch,
};

/// The gateway: every transport ends up calling into this.
#[derive(Clone)]
pub struct GatewayServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool catalogue bound to the backend client.
    registry: ToolRegistry,

    /// Tool router for MCP tool calls.
    tool_router: ToolRouter<Self>,
}

impl GatewayServer {
    /// Create a new gateway over the given backend client.
    pub fn new(config: Config, client: Arc<dyn BackendClient>) -> Self {
        Self {
            tool_router: build_tool_router::<Self>(client.clone()),
            registry: ToolRegistry::new(client),
            config: Arc::new(config),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn BackendClient> {
        self.registry.client()
    }

    /// List all available tools as JSON (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        ToolRegistry::get_all_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a known tool.
    pub async fn call(&self, tool: ToolName, args: &ToolArgs) -> ToolResult<Value> {
        self.registry.call(tool, args).await
    }

    /// Call a tool by name; unknown names fail with `UnknownOperation`.
    pub async fn call_tool(&self, name: &str, args: &ToolArgs) -> ToolResult<Value> {
        self.registry.call_by_name(name, args).await
    }

    /// Run a `/query` call through the allow-list.
    pub async fn query(&self, call: ToolCall) -> ToolResult<Value> {
        dispatch(&self.registry, call).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "OpenProject gateway. Tools manage projects, work packages, relations, \
                 memberships, time entries and versions. List tools always return the \
                 complete collection."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
