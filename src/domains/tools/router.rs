//! Tool Router - builds the rmcp ToolRouter from the catalogue.
//!
//! Used by the STDIO transport. Client errors become MCP `invalid_params`
//! errors; upstream failures are reported as tool errors so the model can
//! read them.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content},
};
use serde_json::Value;

use super::args::ToolArgs;
use super::handlers::{ToolHandler, invoke};
use super::registry::ToolName;
use crate::domains::openproject::BackendClient;

/// Build the tool router with every catalogued tool.
pub fn build_tool_router<S>(client: Arc<dyn BackendClient>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolName::ALL
        .iter()
        .fold(ToolRouter::new(), |router, tool| {
            router.with_route(tool.route(client.clone()))
        })
}

/// Create a ToolRoute for a single tool.
pub fn route<T, S>(client: Arc<dyn BackendClient>) -> ToolRoute<S>
where
    T: ToolHandler,
    S: Send + Sync + 'static,
{
    ToolRoute::new_dyn(T::to_tool(), move |ctx: ToolCallContext<'_, S>| {
        let args = ToolArgs::from(ctx.arguments.clone().unwrap_or_default());
        let client = client.clone();
        async move {
            match invoke::<T>(client.as_ref(), &args).await {
                Ok(value) => Ok(CallToolResult::success(vec![Content::text(render(&value))])),
                Err(e) if e.is_client_error() => Err(McpError::invalid_params(e.to_string(), None)),
                Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
            }
        }
        .boxed()
    })
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
