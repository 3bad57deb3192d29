//! Tool Registry - the closed catalogue of operations.
//!
//! [`ToolName`] enumerates every operation exactly once; the exhaustive
//! matches generated below are what ties a name to its handler, schema and
//! MCP route.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRoute;
use rmcp::model::Tool;
use serde_json::Value;
use tracing::{info, warn};

use super::args::ToolArgs;
use super::definitions::*;
use super::error::{ToolError, ToolResult};
use super::handlers::{ToolHandler, invoke};
use super::router::route;
use crate::domains::openproject::BackendClient;

macro_rules! tool_catalogue {
    ($($variant:ident => $tool:ty),+ $(,)?) => {
        /// Every operation reachable under `/tools/{operation}` and over MCP.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ToolName {
            $($variant),+
        }

        impl ToolName {
            pub const ALL: &'static [ToolName] = &[$(ToolName::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => <$tool as ToolHandler>::NAME),+
                }
            }

            pub fn description(self) -> &'static str {
                match self {
                    $(Self::$variant => <$tool as ToolHandler>::DESCRIPTION),+
                }
            }

            /// Tool model (name, description, input schema).
            pub fn to_tool(self) -> Tool {
                match self {
                    $(Self::$variant => <$tool as ToolHandler>::to_tool()),+
                }
            }

            /// MCP route for this tool.
            pub fn route<S>(self, client: Arc<dyn BackendClient>) -> ToolRoute<S>
            where
                S: Send + Sync + 'static,
            {
                match self {
                    $(Self::$variant => route::<$tool, S>(client)),+
                }
            }

            async fn invoke(self, client: &dyn BackendClient, args: &ToolArgs) -> ToolResult<Value> {
                match self {
                    $(Self::$variant => invoke::<$tool>(client, args).await),+
                }
            }
        }
    };
}

tool_catalogue! {
    TestConnection => TestConnectionTool,

    ListProjects => ListProjectsTool,
    GetProject => GetProjectTool,
    CreateProject => CreateProjectTool,
    UpdateProject => UpdateProjectTool,
    DeleteProject => DeleteProjectTool,

    ListWorkPackages => ListWorkPackagesTool,
    GetWorkPackage => GetWorkPackageTool,
    CreateWorkPackage => CreateWorkPackageTool,
    UpdateWorkPackage => UpdateWorkPackageTool,
    DeleteWorkPackage => DeleteWorkPackageTool,
    ListTypes => ListTypesTool,
    ListStatuses => ListStatusesTool,
    ListPriorities => ListPrioritiesTool,

    SetWorkPackageParent => SetWorkPackageParentTool,
    RemoveWorkPackageParent => RemoveWorkPackageParentTool,
    ListWorkPackageChildren => ListWorkPackageChildrenTool,
    CreateWorkPackageRelation => CreateWorkPackageRelationTool,
    ListWorkPackageRelations => ListWorkPackageRelationsTool,
    GetWorkPackageRelation => GetWorkPackageRelationTool,
    UpdateWorkPackageRelation => UpdateWorkPackageRelationTool,
    DeleteWorkPackageRelation => DeleteWorkPackageRelationTool,

    ListUsers => ListUsersTool,
    GetUser => GetUserTool,

    ListMemberships => ListMembershipsTool,
    GetMembership => GetMembershipTool,
    CreateMembership => CreateMembershipTool,
    UpdateMembership => UpdateMembershipTool,
    DeleteMembership => DeleteMembershipTool,
    ListProjectMembers => ListProjectMembersTool,
    ListUserProjects => ListUserProjectsTool,

    ListRoles => ListRolesTool,
    GetRole => GetRoleTool,

    ListTimeEntries => ListTimeEntriesTool,
    CreateTimeEntry => CreateTimeEntryTool,
    UpdateTimeEntry => UpdateTimeEntryTool,
    DeleteTimeEntry => DeleteTimeEntryTool,
    ListTimeEntryActivities => ListTimeEntryActivitiesTool,

    ListVersions => ListVersionsTool,
    CreateVersion => CreateVersionTool,
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Dispatches tool calls to the backend client.
#[derive(Clone)]
pub struct ToolRegistry {
    client: Arc<dyn BackendClient>,
}

impl ToolRegistry {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn BackendClient> {
        &self.client
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        ToolName::ALL.iter().map(|tool| tool.as_str()).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        ToolName::ALL.iter().map(|tool| tool.to_tool()).collect()
    }

    /// Run a known tool.
    pub async fn call(&self, tool: ToolName, args: &ToolArgs) -> ToolResult<Value> {
        info!("Tool call: {}", tool);
        tool.invoke(self.client.as_ref(), args).await
    }

    /// Run a tool by name; unknown names are an `UnknownOperation`.
    pub async fn call_by_name(&self, name: &str, args: &ToolArgs) -> ToolResult<Value> {
        let tool = name
            .parse::<ToolName>()
            .inspect_err(|_| warn!("Unknown tool requested: {}", name))?;
        self.call(tool, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openproject::Resource;
    use crate::testing::FakeBackend;
    use std::collections::HashSet;

    fn registry(backend: FakeBackend) -> (ToolRegistry, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (ToolRegistry::new(backend.clone()), backend)
    }

    #[test]
    fn test_catalogue_names_unique_and_parseable() {
        let names: HashSet<_> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names.len(), ToolName::ALL.len());
        assert_eq!(ToolName::ALL.len(), 40);

        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>(), Ok(*tool));
            assert!(!tool.description().is_empty());
        }
    }

    #[test]
    fn test_tools_publish_object_schemas() {
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), ToolName::ALL.len());
        let list_wp = tools
            .iter()
            .find(|t| t.name == "list_work_packages")
            .unwrap();
        assert!(list_wp.input_schema.contains_key("properties"));
    }

    #[test]
    fn test_unknown_operation() {
        assert_eq!(
            "drop_database".parse::<ToolName>(),
            Err(ToolError::UnknownOperation("drop_database".into()))
        );
    }

    #[tokio::test]
    async fn test_call_by_name() {
        let (registry, backend) = registry(FakeBackend::new().with_elements(Resource::Roles, 5));
        let result = registry
            .call_by_name("list_roles", &ToolArgs::new())
            .await
            .unwrap();
        assert_eq!(result["count"], 5);
        assert_eq!(backend.call_count(), 1);

        let err = registry
            .call_by_name("nope", &ToolArgs::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(backend.call_count(), 1);
    }
}
