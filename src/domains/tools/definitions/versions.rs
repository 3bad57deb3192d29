//! Version (milestone) tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all};
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

const VERSION_STATUSES: &[&str] = &["open", "locked", "closed"];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListVersionsParams {
    pub project_id: Option<u64>,
}

pub struct ListVersionsTool;

#[async_trait]
impl ToolHandler for ListVersionsTool {
    const NAME: &'static str = "list_versions";
    const DESCRIPTION: &'static str = "List versions, optionally for a single project.";

    type Params = ListVersionsParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListVersionsParams> {
        Ok(ListVersionsParams {
            project_id: args.optional_id("project_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListVersionsParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new().id("project", params.project_id).build();
        fetch_all(client, Resource::Versions, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateVersionParams {
    /// Project the version is defined in.
    pub project_id: u64,
    pub name: String,
    pub description: Option<String>,
    /// YYYY-MM-DD.
    pub start_date: Option<String>,
    /// YYYY-MM-DD, not before start_date.
    pub end_date: Option<String>,
    /// open, locked or closed.
    pub status: Option<String>,
}

pub struct CreateVersionTool;

#[async_trait]
impl ToolHandler for CreateVersionTool {
    const NAME: &'static str = "create_version";
    const DESCRIPTION: &'static str = "Create a version in a project.";

    type Params = CreateVersionParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateVersionParams> {
        let params = CreateVersionParams {
            project_id: args.required_id("project_id")?,
            name: args.required_str("name")?,
            description: args.optional_str("description")?,
            start_date: args.optional_date("start_date")?,
            end_date: args.optional_date("end_date")?,
            status: args.optional_str("status")?,
        };

        if params
            .status
            .as_deref()
            .is_some_and(|status| !VERSION_STATUSES.contains(&status))
        {
            return Err(ToolError::invalid("status must be one of open, locked, closed"));
        }
        // Normalized ISO dates compare correctly as strings.
        if let (Some(start), Some(end)) = (&params.start_date, &params.end_date) {
            if end < start {
                return Err(ToolError::invalid("end_date must not be before start_date"));
            }
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: CreateVersionParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .field("name", params.name)
            .formattable("description", params.description)
            .optional_field("startDate", params.start_date)
            .optional_field("endDate", params.end_date)
            .optional_field("status", params.status)
            .link("definingProject", Resource::Projects, params.project_id)
            .build();
        client.create(Resource::Versions, payload).await
    }
}
