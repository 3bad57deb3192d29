//! User and role lookups.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::fetch_all;
use super::connection::NoParams;
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolHandler, ToolResult};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListUsersParams {
    /// Only return active users.
    #[serde(default = "default_true")]
    pub active_only: bool,
}

pub struct ListUsersTool;

#[async_trait]
impl ToolHandler for ListUsersTool {
    const NAME: &'static str = "list_users";
    const DESCRIPTION: &'static str = "List all users. Requires administrator rights in OpenProject.";

    type Params = ListUsersParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListUsersParams> {
        Ok(ListUsersParams {
            active_only: args.bool_or("active_only", true)?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListUsersParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .flag("status", params.active_only, "active")
            .build();
        fetch_all(client, Resource::Users, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UserIdParams {
    pub user_id: u64,
}

pub struct GetUserTool;

#[async_trait]
impl ToolHandler for GetUserTool {
    const NAME: &'static str = "get_user";
    const DESCRIPTION: &'static str = "Get a single user by ID.";

    type Params = UserIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<UserIdParams> {
        Ok(UserIdParams {
            user_id: args.required_id("user_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: UserIdParams) -> BackendResult<Value> {
        client.get(Resource::Users, params.user_id).await
    }
}

pub struct ListRolesTool;

#[async_trait]
impl ToolHandler for ListRolesTool {
    const NAME: &'static str = "list_roles";
    const DESCRIPTION: &'static str = "List all roles that can be granted through memberships.";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        fetch_all(client, Resource::Roles, None).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RoleIdParams {
    pub role_id: u64,
}

pub struct GetRoleTool;

#[async_trait]
impl ToolHandler for GetRoleTool {
    const NAME: &'static str = "get_role";
    const DESCRIPTION: &'static str = "Get a single role by ID.";

    type Params = RoleIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<RoleIdParams> {
        Ok(RoleIdParams {
            role_id: args.required_id("role_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: RoleIdParams) -> BackendResult<Value> {
        client.get(Resource::Roles, params.role_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openproject::FilterClause;
    use crate::domains::tools::ToolError;
    use crate::domains::tools::handlers::invoke;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_active_users_filter() {
        let backend = FakeBackend::new().with_elements(Resource::Users, 2);
        let result = invoke::<ListUsersTool>(&backend, &ToolArgs::new()).await.unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(
            backend.last_filters(),
            Some(vec![FilterClause::equals("status", "active")])
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_message() {
        let backend = FakeBackend::new().failing(403, "You are not authorized");
        let err = invoke::<ListUsersTool>(&backend, &ToolArgs::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Upstream("OpenProject returned HTTP 403: You are not authorized".into())
        );
    }

    #[tokio::test]
    async fn test_get_role() {
        let backend = FakeBackend::new();
        let args = ToolArgs::new().with("role_id", 3);
        let role = invoke::<GetRoleTool>(&backend, &args).await.unwrap();
        assert_eq!(role["id"], 3);
    }
}
