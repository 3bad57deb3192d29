//! Connectivity probe.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::domains::openproject::{BackendClient, BackendResult};
use crate::domains::tools::{ToolArgs, ToolHandler, ToolResult};

/// Parameters for tools that take none.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Checks that OpenProject is reachable with the configured credentials.
pub struct TestConnectionTool;

#[async_trait]
impl ToolHandler for TestConnectionTool {
    const NAME: &'static str = "test_connection";
    const DESCRIPTION: &'static str =
        "Test the connection to the OpenProject instance and report whether the API accepted the request.";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        client.test_connection().await
    }
}
