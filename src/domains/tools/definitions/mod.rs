//! Tool definitions module.
//!
//! One file per OpenProject resource family. Every list tool goes through
//! [`common::fetch_all`], so they all share full retrieval and the
//! collection envelope.

pub mod common;
pub mod connection;
pub mod memberships;
pub mod projects;
pub mod relations;
pub mod time_entries;
pub mod users;
pub mod versions;
pub mod work_packages;

pub use connection::{NoParams, TestConnectionTool};
pub use memberships::{
    CreateMembershipTool, DeleteMembershipTool, GetMembershipTool, ListMembershipsTool,
    ListProjectMembersTool, ListUserProjectsTool, UpdateMembershipTool,
};
pub use projects::{
    CreateProjectTool, DeleteProjectTool, GetProjectTool, ListProjectsTool, UpdateProjectTool,
};
pub use relations::{
    CreateWorkPackageRelationTool, DeleteWorkPackageRelationTool, GetWorkPackageRelationTool,
    ListWorkPackageChildrenTool, ListWorkPackageRelationsTool, RemoveWorkPackageParentTool,
    SetWorkPackageParentTool, UpdateWorkPackageRelationTool,
};
pub use time_entries::{
    CreateTimeEntryTool, DeleteTimeEntryTool, ListTimeEntriesTool, ListTimeEntryActivitiesTool,
    UpdateTimeEntryTool,
};
pub use users::{GetRoleTool, GetUserTool, ListRolesTool, ListUsersTool};
pub use versions::{CreateVersionTool, ListVersionsTool};
pub use work_packages::{
    CreateWorkPackageTool, DeleteWorkPackageTool, GetWorkPackageTool, ListPrioritiesTool,
    ListStatusesTool, ListTypesTool, ListWorkPackagesTool, UpdateWorkPackageTool,
};
