//! Generic `/query` dispatch.
//!
//! `/query` accepts `{"tool": <name>, "params": {...}}` and only forwards a
//! small read-only allow-list. Each allowed tool declares which parameters it
//! reads; anything else in `params` is dropped before the call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::args::ToolArgs;
use super::error::{ToolError, ToolResult};
use super::registry::{ToolName, ToolRegistry};

/// Tools reachable through `/query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTool {
    TestConnection,
    ListProjects,
    ListUsers,
    ListWorkPackages,
}

impl QueryTool {
    pub const ALL: &'static [QueryTool] = &[
        Self::TestConnection,
        Self::ListProjects,
        Self::ListUsers,
        Self::ListWorkPackages,
    ];

    /// The catalogued operation this forwards to.
    pub fn target(self) -> ToolName {
        match self {
            Self::TestConnection => ToolName::TestConnection,
            Self::ListProjects => ToolName::ListProjects,
            Self::ListUsers => ToolName::ListUsers,
            Self::ListWorkPackages => ToolName::ListWorkPackages,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.target().as_str()
    }

    fn accepted_params(self) -> &'static [&'static str] {
        match self {
            Self::TestConnection => &[],
            Self::ListProjects | Self::ListUsers => &["active_only"],
            Self::ListWorkPackages => &["project_id", "status"],
        }
    }

    fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::ListWorkPackages => &["project_id"],
            _ => &[],
        }
    }
}

impl FromStr for QueryTool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

impl fmt::Display for QueryTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `/query` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub tool: Option<String>,

    /// Object of tool parameters; `null` or absent means none.
    #[serde(default)]
    pub params: Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            tool: Some(tool.into()),
            params: Value::Object(params),
        }
    }
}

/// A validated `/query` call, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub tool: QueryTool,
    pub args: ToolArgs,
}

/// Validate a call without touching the backend.
pub fn resolve(call: ToolCall) -> ToolResult<ResolvedCall> {
    let name = call.tool.ok_or_else(|| ToolError::missing("tool"))?;
    let tool: QueryTool = name.parse()?;

    let args = ToolArgs::from_value(call.params)?.select(tool.accepted_params());
    if let Some(missing) = tool
        .required_params()
        .iter()
        .find(|&&param| !args.contains(param))
    {
        return Err(ToolError::missing(*missing));
    }

    Ok(ResolvedCall { tool, args })
}

/// Resolve then execute a `/query` call.
pub async fn dispatch(registry: &ToolRegistry, call: ToolCall) -> ToolResult<Value> {
    let resolved = resolve(call).inspect_err(|e| warn!("Rejected query: {}", e))?;
    info!("Query dispatch: {}", resolved.tool);
    registry.call(resolved.tool.target(), &resolved.args).await
}
