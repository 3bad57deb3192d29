//! Work package tools, plus the lookup lists needed to fill them in
//! (types, statuses, priorities).

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all};
use super::connection::NoParams;
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

fn default_status() -> String {
    "open".to_string()
}

// ============================================================================
// list_work_packages
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListWorkPackagesParams {
    /// Project whose work packages are listed.
    pub project_id: u64,
    /// "open", "closed" or "all".
    #[serde(default = "default_status")]
    pub status: String,
}

pub struct ListWorkPackagesTool;

#[async_trait]
impl ToolHandler for ListWorkPackagesTool {
    const NAME: &'static str = "list_work_packages";
    const DESCRIPTION: &'static str = "List every work package of a project, filtered by status (open, closed or all).";

    type Params = ListWorkPackagesParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListWorkPackagesParams> {
        Ok(ListWorkPackagesParams {
            project_id: args.required_id("project_id")?,
            status: args.optional_str("status")?.unwrap_or_else(default_status),
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListWorkPackagesParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("project", Some(params.project_id))
            .status(Some(&params.status))
            .build();
        fetch_all(client, Resource::WorkPackages, filters).await
    }
}

// ============================================================================
// get_work_package
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WorkPackageIdParams {
    pub work_package_id: u64,
}

pub struct GetWorkPackageTool;

#[async_trait]
impl ToolHandler for GetWorkPackageTool {
    const NAME: &'static str = "get_work_package";
    const DESCRIPTION: &'static str = "Get a single work package by ID.";

    type Params = WorkPackageIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<WorkPackageIdParams> {
        Ok(WorkPackageIdParams {
            work_package_id: args.required_id("work_package_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: WorkPackageIdParams) -> BackendResult<Value> {
        client.get(Resource::WorkPackages, params.work_package_id).await
    }
}

// ============================================================================
// create_work_package
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateWorkPackageParams {
    pub project_id: u64,
    pub subject: String,
    /// Work package type (see list_types).
    pub type_id: u64,
    pub description: Option<String>,
    pub priority_id: Option<u64>,
    pub assignee_id: Option<u64>,
}

pub struct CreateWorkPackageTool;

#[async_trait]
impl ToolHandler for CreateWorkPackageTool {
    const NAME: &'static str = "create_work_package";
    const DESCRIPTION: &'static str = "Create a work package in a project.";

    type Params = CreateWorkPackageParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateWorkPackageParams> {
        Ok(CreateWorkPackageParams {
            project_id: args.required_id("project_id")?,
            subject: args.required_str("subject")?,
            type_id: args.required_id("type_id")?,
            description: args.optional_str("description")?,
            priority_id: args.optional_id("priority_id")?,
            assignee_id: args.optional_id("assignee_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: CreateWorkPackageParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .field("subject", params.subject)
            .formattable("description", params.description)
            .link("project", Resource::Projects, params.project_id)
            .link("type", Resource::Types, params.type_id)
            .optional_link("priority", Resource::Priorities, params.priority_id)
            .optional_link("assignee", Resource::Users, params.assignee_id)
            .build();
        client.create(Resource::WorkPackages, payload).await
    }
}

// ============================================================================
// update_work_package
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateWorkPackageParams {
    pub work_package_id: u64,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub type_id: Option<u64>,
    pub status_id: Option<u64>,
    pub priority_id: Option<u64>,
    pub assignee_id: Option<u64>,
    /// 0 to 100.
    pub percentage_done: Option<u64>,
}

pub struct UpdateWorkPackageTool;

#[async_trait]
impl ToolHandler for UpdateWorkPackageTool {
    const NAME: &'static str = "update_work_package";
    const DESCRIPTION: &'static str = "Update a work package. Only the given fields change; the lock version is handled automatically.";

    type Params = UpdateWorkPackageParams;

    fn parse(args: &ToolArgs) -> ToolResult<UpdateWorkPackageParams> {
        let percentage_done = args.optional_u64("percentage_done")?;
        if percentage_done.is_some_and(|p| p > 100) {
            return Err(ToolError::invalid("percentage_done must be between 0 and 100"));
        }

        let params = UpdateWorkPackageParams {
            work_package_id: args.required_id("work_package_id")?,
            subject: args.optional_str("subject")?,
            description: args.optional_str("description")?,
            type_id: args.optional_id("type_id")?,
            status_id: args.optional_id("status_id")?,
            priority_id: args.optional_id("priority_id")?,
            assignee_id: args.optional_id("assignee_id")?,
            percentage_done,
        };
        if params.subject.is_none()
            && params.description.is_none()
            && params.type_id.is_none()
            && params.status_id.is_none()
            && params.priority_id.is_none()
            && params.assignee_id.is_none()
            && params.percentage_done.is_none()
        {
            return Err(ToolError::invalid("no fields to update"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: UpdateWorkPackageParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .optional_field("subject", params.subject)
            .formattable("description", params.description)
            .optional_field("percentageDone", params.percentage_done)
            .optional_link("type", Resource::Types, params.type_id)
            .optional_link("status", Resource::Statuses, params.status_id)
            .optional_link("priority", Resource::Priorities, params.priority_id)
            .optional_link("assignee", Resource::Users, params.assignee_id);
        client
            .update(Resource::WorkPackages, params.work_package_id, payload.build())
            .await
    }
}

// ============================================================================
// delete_work_package
// ============================================================================

pub struct DeleteWorkPackageTool;

#[async_trait]
impl ToolHandler for DeleteWorkPackageTool {
    const NAME: &'static str = "delete_work_package";
    const DESCRIPTION: &'static str = "Delete a work package.";

    type Params = WorkPackageIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<WorkPackageIdParams> {
        GetWorkPackageTool::parse(args)
    }

    async fn execute(client: &dyn BackendClient, params: WorkPackageIdParams) -> BackendResult<Value> {
        client.delete(Resource::WorkPackages, params.work_package_id).await
    }
}

// ============================================================================
// Lookup lists
// ============================================================================

pub struct ListTypesTool;

#[async_trait]
impl ToolHandler for ListTypesTool {
    const NAME: &'static str = "list_types";
    const DESCRIPTION: &'static str = "List all work package types.";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        fetch_all(client, Resource::Types, None).await
    }
}

pub struct ListStatusesTool;

#[async_trait]
impl ToolHandler for ListStatusesTool {
    const NAME: &'static str = "list_statuses";
    const DESCRIPTION: &'static str = "List all work package statuses.";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        fetch_all(client, Resource::Statuses, None).await
    }
}

pub struct ListPrioritiesTool;

#[async_trait]
impl ToolHandler for ListPrioritiesTool {
    const NAME: &'static str = "list_priorities";
    const DESCRIPTION: &'static str = "List all work package priorities.";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        fetch_all(client, Resource::Priorities, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openproject::{FilterClause, FilterOperator};
    use crate::domains::tools::handlers::invoke;
    use crate::testing::FakeBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_full_retrieval_across_pages() {
        let backend = FakeBackend::new().with_elements(Resource::WorkPackages, 250);
        let args = ToolArgs::new().with("project_id", 5).with("status", "all");
        let result = invoke::<ListWorkPackagesTool>(&backend, &args).await.unwrap();

        assert_eq!(result["total"], 250);
        assert_eq!(result["count"], 250);
        assert_eq!(result["pageSize"], 250);
        assert_eq!(result["offset"], 1);
        assert_eq!(result["_embedded"]["elements"][249]["id"], 250);
        assert_eq!(result["_retrieval_info"]["mode"], "full_retrieval");
        assert_eq!(result["_retrieval_info"]["total_retrieved"], 250);
        assert_eq!(backend.pages_served(), 3);
    }

    #[tokio::test]
    async fn test_filters_project_and_open_status_by_default() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("project_id", 5);
        invoke::<ListWorkPackagesTool>(&backend, &args).await.unwrap();

        let filters = backend.last_filters().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], FilterClause::equals("project", 5));
        assert_eq!(filters[1].operator(), FilterOperator::Open);
    }

    #[tokio::test]
    async fn test_status_all_only_filters_project() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("project_id", 5).with("status", "all");
        invoke::<ListWorkPackagesTool>(&backend, &args).await.unwrap();
        assert_eq!(backend.last_filters(), Some(vec![FilterClause::equals("project", 5)]));
    }

    #[tokio::test]
    async fn test_missing_project_never_reaches_backend() {
        let backend = FakeBackend::new();
        let err = invoke::<ListWorkPackagesTool>(&backend, &ToolArgs::new())
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::missing("project_id"));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_mid_retrieval_returns_no_partial_list() {
        let backend = FakeBackend::new()
            .with_elements(Resource::WorkPackages, 250)
            .failing_after_pages(2);
        let args = ToolArgs::new().with("project_id", 5);
        let err = invoke::<ListWorkPackagesTool>(&backend, &args).await.unwrap_err();

        assert!(matches!(err, ToolError::Upstream(_)));
        assert!(err.to_string().contains("200"));
    }

    #[tokio::test]
    async fn test_create_work_package_links() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new()
            .with("project_id", 5)
            .with("subject", "Write docs")
            .with("type_id", 1)
            .with("assignee_id", 8);
        let result = invoke::<CreateWorkPackageTool>(&backend, &args).await.unwrap();

        assert_eq!(result["id"], 1000);
        assert_eq!(
            backend.last_payload().unwrap()["_links"],
            json!({
                "project": {"href": "/api/v3/projects/5"},
                "type": {"href": "/api/v3/types/1"},
                "assignee": {"href": "/api/v3/users/8"}
            })
        );
    }

    #[tokio::test]
    async fn test_update_percentage_bounds() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new()
            .with("work_package_id", 3)
            .with("percentage_done", 150);
        assert!(invoke::<UpdateWorkPackageTool>(&backend, &args).await.is_err());

        let args = ToolArgs::new()
            .with("work_package_id", 3)
            .with("percentage_done", 40)
            .with("status_id", 7);
        invoke::<UpdateWorkPackageTool>(&backend, &args).await.unwrap();
        let payload = backend.last_payload().unwrap();
        assert_eq!(payload["percentageDone"], 40);
        assert_eq!(payload["_links"]["status"]["href"], "/api/v3/statuses/7");
    }

    #[tokio::test]
    async fn test_lookup_lists_are_enveloped() {
        let backend = FakeBackend::new().with_elements(Resource::Priorities, 4);
        let result = invoke::<ListPrioritiesTool>(&backend, &ToolArgs::new()).await.unwrap();
        assert_eq!(result["count"], 4);
        assert_eq!(
            result["_retrieval_info"]["note"],
            "All priorities retrieved successfully"
        );
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("work_package_id", 3);
        assert_eq!(
            invoke::<UpdateWorkPackageTool>(&backend, &args).await,
            Err(ToolError::invalid("no fields to update"))
        );
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_total_is_reported_not_corrected() {
        let backend = FakeBackend::new()
            .with_elements(Resource::WorkPackages, 120)
            .with_reported_total(Resource::WorkPackages, 125);
        let args = ToolArgs::new().with("project_id", 5).with("status", "all");
        let result = invoke::<ListWorkPackagesTool>(&backend, &args).await.unwrap();

        assert_eq!(result["total"], 125);
        assert_eq!(result["count"], 120);
        assert_eq!(result["pageSize"], 120);
        assert_eq!(result["_embedded"]["elements"].as_array().unwrap().len(), 120);
    }

    #[tokio::test]
    async fn test_get_is_repeatable() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("work_package_id", 42);
        let first = invoke::<GetWorkPackageTool>(&backend, &args).await.unwrap();
        let second = invoke::<GetWorkPackageTool>(&backend, &args).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["id"], 42);
        assert_eq!(backend.call_count(), 2);
    }
}
