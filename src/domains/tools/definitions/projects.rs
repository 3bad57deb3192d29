//! Project tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all};
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

/// Project status codes accepted by OpenProject.
const PROJECT_STATUSES: &[&str] = &[
    "on_track",
    "at_risk",
    "off_track",
    "not_started",
    "finished",
    "discontinued",
];

fn default_true() -> bool {
    true
}

fn parse_status(args: &ToolArgs) -> ToolResult<Option<String>> {
    match args.optional_str("status")? {
        Some(status) if !PROJECT_STATUSES.contains(&status.as_str()) => Err(ToolError::invalid(
            format!("status must be one of {}", PROJECT_STATUSES.join(", ")),
        )),
        status => Ok(status),
    }
}

fn status_href(status: &str) -> String {
    format!("/api/v3/project_statuses/{status}")
}

// ============================================================================
// list_projects
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    /// Only return active projects.
    #[serde(default = "default_true")]
    pub active_only: bool,
}

pub struct ListProjectsTool;

#[async_trait]
impl ToolHandler for ListProjectsTool {
    const NAME: &'static str = "list_projects";
    const DESCRIPTION: &'static str = "List all OpenProject projects. Returns the complete collection.";

    type Params = ListProjectsParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListProjectsParams> {
        Ok(ListProjectsParams {
            active_only: args.bool_or("active_only", true)?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListProjectsParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .flag("active", params.active_only, "t")
            .build();
        fetch_all(client, Resource::Projects, filters).await
    }
}

// ============================================================================
// get_project
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProjectIdParams {
    /// Project ID.
    pub project_id: u64,
}

pub struct GetProjectTool;

#[async_trait]
impl ToolHandler for GetProjectTool {
    const NAME: &'static str = "get_project";
    const DESCRIPTION: &'static str = "Get a single project by ID.";

    type Params = ProjectIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<ProjectIdParams> {
        Ok(ProjectIdParams {
            project_id: args.required_id("project_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ProjectIdParams) -> BackendResult<Value> {
        client.get(Resource::Projects, params.project_id).await
    }
}

// ============================================================================
// create_project
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    /// Project name.
    pub name: String,
    /// Unique identifier used in URLs.
    pub identifier: String,
    pub description: Option<String>,
    pub public: Option<bool>,
    /// One of on_track, at_risk, off_track, not_started, finished, discontinued.
    pub status: Option<String>,
    /// Parent project ID.
    pub parent_id: Option<u64>,
}

pub struct CreateProjectTool;

#[async_trait]
impl ToolHandler for CreateProjectTool {
    const NAME: &'static str = "create_project";
    const DESCRIPTION: &'static str = "Create a new project, optionally below a parent project.";

    type Params = CreateProjectParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateProjectParams> {
        Ok(CreateProjectParams {
            name: args.required_str("name")?,
            identifier: args.required_str("identifier")?,
            description: args.optional_str("description")?,
            public: args.optional_bool("public")?,
            status: parse_status(args)?,
            parent_id: args.optional_id("parent_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: CreateProjectParams) -> BackendResult<Value> {
        let mut payload = HalPayload::new()
            .field("name", params.name)
            .field("identifier", params.identifier)
            .formattable("description", params.description)
            .optional_field("public", params.public)
            .optional_link("parent", Resource::Projects, params.parent_id);
        if let Some(status) = params.status {
            payload = payload.link_href("status", status_href(&status));
        }
        client.create(Resource::Projects, payload.build()).await
    }
}

// ============================================================================
// update_project
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateProjectParams {
    pub project_id: u64,
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub public: Option<bool>,
    pub status: Option<String>,
    pub parent_id: Option<u64>,
}

pub struct UpdateProjectTool;

#[async_trait]
impl ToolHandler for UpdateProjectTool {
    const NAME: &'static str = "update_project";
    const DESCRIPTION: &'static str = "Update an existing project. Only the given fields change.";

    type Params = UpdateProjectParams;

    fn parse(args: &ToolArgs) -> ToolResult<UpdateProjectParams> {
        let params = UpdateProjectParams {
            project_id: args.required_id("project_id")?,
            name: args.optional_str("name")?,
            identifier: args.optional_str("identifier")?,
            description: args.optional_str("description")?,
            public: args.optional_bool("public")?,
            status: parse_status(args)?,
            parent_id: args.optional_id("parent_id")?,
        };
        if params.name.is_none()
            && params.identifier.is_none()
            && params.description.is_none()
            && params.public.is_none()
            && params.status.is_none()
            && params.parent_id.is_none()
        {
            return Err(ToolError::invalid("no fields to update"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: UpdateProjectParams) -> BackendResult<Value> {
        let mut payload = HalPayload::new()
            .optional_field("name", params.name)
            .optional_field("identifier", params.identifier)
            .formattable("description", params.description)
            .optional_field("public", params.public)
            .optional_link("parent", Resource::Projects, params.parent_id);
        if let Some(status) = params.status {
            payload = payload.link_href("status", status_href(&status));
        }
        client
            .update(Resource::Projects, params.project_id, payload.build())
            .await
    }
}

// ============================================================================
// delete_project
// ============================================================================

pub struct DeleteProjectTool;

#[async_trait]
impl ToolHandler for DeleteProjectTool {
    const NAME: &'static str = "delete_project";
    const DESCRIPTION: &'static str = "Delete a project. This cannot be undone.";

    type Params = ProjectIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<ProjectIdParams> {
        GetProjectTool::parse(args)
    }

    async fn execute(client: &dyn BackendClient, params: ProjectIdParams) -> BackendResult<Value> {
        client.delete(Resource::Projects, params.project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openproject::FilterClause;
    use crate::domains::tools::handlers::invoke;
    use crate::testing::{BackendCall, FakeBackend};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_active_projects_by_default() {
        let backend = FakeBackend::new().with_elements(Resource::Projects, 4);
        let result = invoke::<ListProjectsTool>(&backend, &ToolArgs::new()).await.unwrap();

        assert_eq!(result["count"], 4);
        assert_eq!(
            backend.last_filters(),
            Some(vec![FilterClause::equals("active", "t")])
        );
    }

    #[tokio::test]
    async fn test_list_all_projects_sends_no_filter() {
        let backend = FakeBackend::new();
        let args = ToolArgs::from_pairs([("active_only", "false")]);
        invoke::<ListProjectsTool>(&backend, &args).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::List {
                resource: Resource::Projects,
                filters: None
            }]
        );
    }

    #[tokio::test]
    async fn test_create_project_payload() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new()
            .with("name", "Apollo")
            .with("identifier", "apollo")
            .with("status", "on_track")
            .with("parent_id", 2);
        invoke::<CreateProjectTool>(&backend, &args).await.unwrap();

        assert_eq!(
            backend.last_payload().unwrap(),
            json!({
                "name": "Apollo",
                "identifier": "apollo",
                "_links": {
                    "parent": {"href": "/api/v3/projects/2"},
                    "status": {"href": "/api/v3/project_statuses/on_track"}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_create_project_rejects_unknown_status() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new()
            .with("name", "Apollo")
            .with("identifier", "apollo")
            .with("status", "great");
        let err = invoke::<CreateProjectTool>(&backend, &args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("project_id", 3);
        let err = invoke::<UpdateProjectTool>(&backend, &args).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_project() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("project_id", "9");
        let result = invoke::<DeleteProjectTool>(&backend, &args).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Delete {
                resource: Resource::Projects,
                id: 9
            }]
        );
    }
}
