//! Work package hierarchy and relation tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all};
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

/// Relation types OpenProject accepts.
pub const RELATION_TYPES: &[&str] = &[
    "relates",
    "duplicates",
    "duplicated",
    "blocks",
    "blocked",
    "precedes",
    "follows",
    "includes",
    "partof",
    "requires",
    "required",
];

fn relation_type(args: &ToolArgs) -> ToolResult<Option<String>> {
    match args.optional_str("relation_type")? {
        Some(kind) if !RELATION_TYPES.contains(&kind.as_str()) => Err(ToolError::invalid(format!(
            "relation_type must be one of {}",
            RELATION_TYPES.join(", ")
        ))),
        kind => Ok(kind),
    }
}

// ============================================================================
// Parent / children
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetParentParams {
    pub work_package_id: u64,
    pub parent_id: u64,
}

pub struct SetWorkPackageParentTool;

#[async_trait]
impl ToolHandler for SetWorkPackageParentTool {
    const NAME: &'static str = "set_work_package_parent";
    const DESCRIPTION: &'static str = "Make one work package the parent of another.";

    type Params = SetParentParams;

    fn parse(args: &ToolArgs) -> ToolResult<SetParentParams> {
        let params = SetParentParams {
            work_package_id: args.required_id("work_package_id")?,
            parent_id: args.required_id("parent_id")?,
        };
        if params.work_package_id == params.parent_id {
            return Err(ToolError::invalid("a work package cannot be its own parent"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: SetParentParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .link("parent", Resource::WorkPackages, params.parent_id)
            .build();
        client
            .update(Resource::WorkPackages, params.work_package_id, payload)
            .await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveParentParams {
    pub work_package_id: u64,
}

pub struct RemoveWorkPackageParentTool;

#[async_trait]
impl ToolHandler for RemoveWorkPackageParentTool {
    const NAME: &'static str = "remove_work_package_parent";
    const DESCRIPTION: &'static str = "Detach a work package from its parent.";

    type Params = RemoveParentParams;

    fn parse(args: &ToolArgs) -> ToolResult<RemoveParentParams> {
        Ok(RemoveParentParams {
            work_package_id: args.required_id("work_package_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: RemoveParentParams) -> BackendResult<Value> {
        let payload = HalPayload::new().clear_link("parent").build();
        client
            .update(Resource::WorkPackages, params.work_package_id, payload)
            .await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListChildrenParams {
    pub parent_id: u64,
    /// Include grandchildren and deeper descendants.
    #[serde(default)]
    pub include_descendants: bool,
}

pub struct ListWorkPackageChildrenTool;

#[async_trait]
impl ToolHandler for ListWorkPackageChildrenTool {
    const NAME: &'static str = "list_work_package_children";
    const DESCRIPTION: &'static str = "List the children of a work package, optionally including all descendants.";

    type Params = ListChildrenParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListChildrenParams> {
        Ok(ListChildrenParams {
            parent_id: args.required_id("parent_id")?,
            include_descendants: args.bool_or("include_descendants", false)?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListChildrenParams) -> BackendResult<Value> {
        let field = if params.include_descendants {
            "ancestor"
        } else {
            "parent"
        };
        let filters = FilterBuilder::new().id(field, Some(params.parent_id)).build();
        fetch_all(client, Resource::WorkPackages, filters).await
    }
}

// ============================================================================
// Relations
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateRelationParams {
    pub from_id: u64,
    pub to_id: u64,
    /// relates, duplicates, duplicated, blocks, blocked, precedes, follows,
    /// includes, partof, requires or required.
    pub relation_type: String,
    /// Working days between the two (precedes/follows only).
    pub lag: Option<u64>,
    pub description: Option<String>,
}

pub struct CreateWorkPackageRelationTool;

#[async_trait]
impl ToolHandler for CreateWorkPackageRelationTool {
    const NAME: &'static str = "create_work_package_relation";
    const DESCRIPTION: &'static str = "Create a relation (blocks, follows, relates, ...) between two work packages.";

    type Params = CreateRelationParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateRelationParams> {
        let params = CreateRelationParams {
            from_id: args.required_id("from_id")?,
            to_id: args.required_id("to_id")?,
            relation_type: relation_type(args)?.ok_or_else(|| ToolError::missing("relation_type"))?,
            lag: args.optional_u64("lag")?,
            description: args.optional_str("description")?,
        };
        if params.from_id == params.to_id {
            return Err(ToolError::invalid("a work package cannot be related to itself"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: CreateRelationParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .field("type", params.relation_type)
            .optional_field("lag", params.lag)
            .optional_field("description", params.description)
            .link("to", Resource::WorkPackages, params.to_id)
            .build();
        client.create_relation(params.from_id, payload).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListRelationsParams {
    /// Only relations involving this work package.
    pub work_package_id: Option<u64>,
    pub relation_type: Option<String>,
}

pub struct ListWorkPackageRelationsTool;

#[async_trait]
impl ToolHandler for ListWorkPackageRelationsTool {
    const NAME: &'static str = "list_work_package_relations";
    const DESCRIPTION: &'static str = "List work package relations, optionally for one work package or one relation type.";

    type Params = ListRelationsParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListRelationsParams> {
        Ok(ListRelationsParams {
            work_package_id: args.optional_id("work_package_id")?,
            relation_type: relation_type(args)?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListRelationsParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("involved", params.work_package_id)
            .value("type", params.relation_type.as_deref())
            .build();
        fetch_all(client, Resource::Relations, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RelationIdParams {
    pub relation_id: u64,
}

pub struct GetWorkPackageRelationTool;

#[async_trait]
impl ToolHandler for GetWorkPackageRelationTool {
    const NAME: &'static str = "get_work_package_relation";
    const DESCRIPTION: &'static str = "Get a single relation by ID.";

    type Params = RelationIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<RelationIdParams> {
        Ok(RelationIdParams {
            relation_id: args.required_id("relation_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: RelationIdParams) -> BackendResult<Value> {
        client.get(Resource::Relations, params.relation_id).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateRelationParams {
    pub relation_id: u64,
    pub relation_type: Option<String>,
    pub lag: Option<u64>,
    pub description: Option<String>,
}

pub struct UpdateWorkPackageRelationTool;

#[async_trait]
impl ToolHandler for UpdateWorkPackageRelationTool {
    const NAME: &'static str = "update_work_package_relation";
    const DESCRIPTION: &'static str = "Change the type, lag or description of a relation.";

    type Params = UpdateRelationParams;

    fn parse(args: &ToolArgs) -> ToolResult<UpdateRelationParams> {
        let params = UpdateRelationParams {
            relation_id: args.required_id("relation_id")?,
            relation_type: relation_type(args)?,
            lag: args.optional_u64("lag")?,
            description: args.optional_str("description")?,
        };
        if params.relation_type.is_none() && params.lag.is_none() && params.description.is_none() {
            return Err(ToolError::invalid("no fields to update"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: UpdateRelationParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .optional_field("type", params.relation_type)
            .optional_field("lag", params.lag)
            .optional_field("description", params.description)
            .build();
        client
            .update(Resource::Relations, params.relation_id, payload)
            .await
    }
}

pub struct DeleteWorkPackageRelationTool;

#[async_trait]
impl ToolHandler for DeleteWorkPackageRelationTool {
    const NAME: &'static str = "delete_work_package_relation";
    const DESCRIPTION: &'static str = "Delete a relation.";

    type Params = RelationIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<RelationIdParams> {
        GetWorkPackageRelationTool::parse(args)
    }

    async fn execute(client: &dyn BackendClient, params: RelationIdParams) -> BackendResult<Value> {
        client.delete(Resource::Relations, params.relation_id).await
    }
}
