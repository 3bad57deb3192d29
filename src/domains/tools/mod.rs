//! Tools domain module.
//!
//! Tools are the unit of work of the gateway: every HTTP route and every MCP
//! call ends up as one tool invocation against the backend client.
//!
//! ## Architecture
//!
//! - `definitions/` - tool implementations, one file per resource family
//! - `handlers.rs` - the [`ToolHandler`] contract and [`invoke`]
//! - `args.rs` - lenient parameter extraction
//! - `registry.rs` - the closed [`ToolName`] catalogue and dispatch
//! - `dispatch.rs` - the `/query` allow-list
//! - `router.rs` - rmcp ToolRouter for the STDIO transport
//! - `error.rs` - tool error taxonomy
//!
//! ## Adding a New Tool
//!
//! 1. Implement [`ToolHandler`] in the matching file under `definitions/`
//! 2. Export it from `definitions/mod.rs`
//! 3. Add a line to the `tool_catalogue!` invocation in `registry.rs`

mod args;
pub mod definitions;
pub mod dispatch;
mod error;
mod handlers;
mod registry;
pub mod router;

pub use args::ToolArgs;
pub use dispatch::{QueryTool, ToolCall, dispatch};
pub use error::{ToolError, ToolResult};
pub use handlers::{ToolHandler, invoke};
pub use registry::{ToolName, ToolRegistry};
pub use router::build_tool_router;
