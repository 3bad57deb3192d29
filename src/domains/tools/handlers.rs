//! The contract every tool definition implements.
//!
//! A tool parses loosely typed [`ToolArgs`] into its own parameter struct
//! and then executes against the backend client. Parsing happens before
//! any backend call, so malformed input never reaches OpenProject.

use async_trait::async_trait;
use rmcp::{handler::server::tool::schema_for_type, model::Tool};
use schemars::JsonSchema;
use serde_json::Value;
use tracing::{error, warn};

use super::args::ToolArgs;
use super::error::{ToolError, ToolResult};
use crate::domains::openproject::{BackendClient, BackendResult};

#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    /// Tool name as registered in the catalogue.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Parameters, also used to publish the input schema.
    type Params: JsonSchema + Send + 'static;

    /// Validate and convert raw arguments.
    fn parse(args: &ToolArgs) -> ToolResult<Self::Params>;

    /// Run the operation against the backend.
    async fn execute(client: &dyn BackendClient, params: Self::Params) -> BackendResult<Value>;

    /// Create a Tool model for this tool (metadata).
    fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<Self::Params>().into(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Parse then execute a tool, mapping failures to [`ToolError`].
pub async fn invoke<T: ToolHandler>(client: &dyn BackendClient, args: &ToolArgs) -> ToolResult<Value> {
    let params = T::parse(args).inspect_err(|e| warn!("Rejected {} call: {}", T::NAME, e))?;

    T::execute(client, params).await.map_err(|e| {
        error!("Error in {}: {}", T::NAME, e);
        ToolError::upstream(&e)
    })
}
