//! Project membership tools.
//!
//! A membership ties a principal (user or group) to a project with one or
//! more roles.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all};
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

/// Who a membership is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Principal {
    User(u64),
    Group(u64),
}

impl Principal {
    /// Exactly one of the two ids must be given.
    fn from_ids(user_id: Option<u64>, group_id: Option<u64>) -> ToolResult<Self> {
        match (user_id, group_id) {
            (Some(user), None) => Ok(Self::User(user)),
            (None, Some(group)) => Ok(Self::Group(group)),
            (Some(_), Some(_)) => Err(ToolError::invalid("give either user_id or group_id, not both")),
            (None, None) => Err(ToolError::missing("user_id or group_id")),
        }
    }

    fn href(self) -> String {
        match self {
            Self::User(id) => Resource::Users.href(id),
            Self::Group(id) => format!("/api/v3/groups/{id}"),
        }
    }
}

/// `role_ids` wins over `role_id`; at least one role is needed.
fn resolve_roles(role_id: Option<u64>, role_ids: Option<Vec<u64>>) -> ToolResult<Vec<u64>> {
    let roles = role_ids.unwrap_or_else(|| role_id.into_iter().collect());
    if roles.is_empty() {
        return Err(ToolError::missing("role_id or role_ids"));
    }
    Ok(roles)
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListMembershipsParams {
    pub project_id: Option<u64>,
    pub user_id: Option<u64>,
}

pub struct ListMembershipsTool;

#[async_trait]
impl ToolHandler for ListMembershipsTool {
    const NAME: &'static str = "list_memberships";
    const DESCRIPTION: &'static str = "List memberships, optionally restricted to a project and/or a user.";

    type Params = ListMembershipsParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListMembershipsParams> {
        Ok(ListMembershipsParams {
            project_id: args.optional_id("project_id")?,
            user_id: args.optional_id("user_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListMembershipsParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("project", params.project_id)
            .id("principal", params.user_id)
            .build();
        fetch_all(client, Resource::Memberships, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MembershipIdParams {
    pub membership_id: u64,
}

pub struct GetMembershipTool;

#[async_trait]
impl ToolHandler for GetMembershipTool {
    const NAME: &'static str = "get_membership";
    const DESCRIPTION: &'static str = "Get a single membership by ID.";

    type Params = MembershipIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<MembershipIdParams> {
        Ok(MembershipIdParams {
            membership_id: args.required_id("membership_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: MembershipIdParams) -> BackendResult<Value> {
        client.get(Resource::Memberships, params.membership_id).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateMembershipParams {
    pub project_id: u64,
    /// Grant the membership to this user (or give group_id).
    pub user_id: Option<u64>,
    /// Grant the membership to this group (or give user_id).
    pub group_id: Option<u64>,
    /// A single role; ignored when role_ids is given.
    pub role_id: Option<u64>,
    /// One or more roles.
    pub role_ids: Option<Vec<u64>>,
    /// Sent to the new member by email.
    pub notification_message: Option<String>,
}

pub struct CreateMembershipTool;

#[async_trait]
impl ToolHandler for CreateMembershipTool {
    const NAME: &'static str = "create_membership";
    const DESCRIPTION: &'static str = "Add a user or group to a project with one or more roles (role_id or role_ids).";

    type Params = CreateMembershipParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateMembershipParams> {
        let project_id = args.required_id("project_id")?;
        let user_id = args.optional_id("user_id")?;
        let group_id = args.optional_id("group_id")?;
        Principal::from_ids(user_id, group_id)?;
        let role_id = args.optional_id("role_id")?;
        let roles = resolve_roles(role_id, args.optional_id_list("role_ids")?)?;

        Ok(CreateMembershipParams {
            project_id,
            user_id,
            group_id,
            role_id,
            role_ids: Some(roles),
            notification_message: args.optional_str("notification_message")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: CreateMembershipParams) -> BackendResult<Value> {
        let mut payload = HalPayload::new().link("project", Resource::Projects, params.project_id);
        if let Ok(principal) = Principal::from_ids(params.user_id, params.group_id) {
            payload = payload.link_href("principal", principal.href());
        }
        let payload = payload
            .links("roles", Resource::Roles, &params.role_ids.unwrap_or_default())
            .meta_text("notificationMessage", params.notification_message)
            .build();
        client.create(Resource::Memberships, payload).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateMembershipParams {
    pub membership_id: u64,
    /// A single role replacing the current ones; ignored when role_ids is given.
    pub role_id: Option<u64>,
    /// Replaces the current roles.
    pub role_ids: Option<Vec<u64>>,
    pub notification_message: Option<String>,
}

pub struct UpdateMembershipTool;

#[async_trait]
impl ToolHandler for UpdateMembershipTool {
    const NAME: &'static str = "update_membership";
    const DESCRIPTION: &'static str = "Replace the roles of a membership (role_id or role_ids).";

    type Params = UpdateMembershipParams;

    fn parse(args: &ToolArgs) -> ToolResult<UpdateMembershipParams> {
        let membership_id = args.required_id("membership_id")?;
        let role_id = args.optional_id("role_id")?;
        let roles = resolve_roles(role_id, args.optional_id_list("role_ids")?)?;

        Ok(UpdateMembershipParams {
            membership_id,
            role_id,
            role_ids: Some(roles),
            notification_message: args.optional_str("notification_message")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: UpdateMembershipParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .links("roles", Resource::Roles, &params.role_ids.unwrap_or_default())
            .meta_text("notificationMessage", params.notification_message)
            .build();
        client
            .update(Resource::Memberships, params.membership_id, payload)
            .await
    }
}

pub struct DeleteMembershipTool;

#[async_trait]
impl ToolHandler for DeleteMembershipTool {
    const NAME: &'static str = "delete_membership";
    const DESCRIPTION: &'static str = "Remove a membership, revoking the principal's access to the project.";

    type Params = MembershipIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<MembershipIdParams> {
        GetMembershipTool::parse(args)
    }

    async fn execute(client: &dyn BackendClient, params: MembershipIdParams) -> BackendResult<Value> {
        client.delete(Resource::Memberships, params.membership_id).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProjectMembersParams {
    pub project_id: u64,
}

pub struct ListProjectMembersTool;

#[async_trait]
impl ToolHandler for ListProjectMembersTool {
    const NAME: &'static str = "list_project_members";
    const DESCRIPTION: &'static str = "List every membership of one project.";

    type Params = ProjectMembersParams;

    fn parse(args: &ToolArgs) -> ToolResult<ProjectMembersParams> {
        Ok(ProjectMembersParams {
            project_id: args.required_id("project_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ProjectMembersParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("project", Some(params.project_id))
            .build();
        fetch_all(client, Resource::Memberships, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UserProjectsParams {
    pub user_id: u64,
}

pub struct ListUserProjectsTool;

#[async_trait]
impl ToolHandler for ListUserProjectsTool {
    const NAME: &'static str = "list_user_projects";
    const DESCRIPTION: &'static str = "List every membership of one user, i.e. the projects they belong to.";

    type Params = UserProjectsParams;

    fn parse(args: &ToolArgs) -> ToolResult<UserProjectsParams> {
        Ok(UserProjectsParams {
            user_id: args.required_id("user_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: UserProjectsParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("principal", Some(params.user_id))
            .build();
        fetch_all(client, Resource::Memberships, filters).await
    }
}
