//! Backend client boundary.
//!
//! The gateway talks to OpenProject only through [`BackendClient`]. The trait
//! deliberately has no pagination parameters: `list` must return the complete
//! collection or fail.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::envelope::CollectionPage;
use super::error::BackendResult;
use super::filters::FilterClause;

/// OpenProject API v3 resource collections used by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Projects,
    WorkPackages,
    Relations,
    Users,
    Memberships,
    Roles,
    TimeEntries,
    TimeEntryActivities,
    Versions,
    Types,
    Statuses,
    Priorities,
}

impl Resource {
    /// Path segment below `/api/v3/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::WorkPackages => "work_packages",
            Self::Relations => "relations",
            Self::Users => "users",
            Self::Memberships => "memberships",
            Self::Roles => "roles",
            Self::TimeEntries => "time_entries",
            Self::TimeEntryActivities => "time_entries/activities",
            Self::Versions => "versions",
            Self::Types => "types",
            Self::Statuses => "statuses",
            Self::Priorities => "priorities",
        }
    }

    /// Human readable plural, used in logs and envelope notes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::WorkPackages => "work packages",
            Self::Relations => "relations",
            Self::Users => "users",
            Self::Memberships => "memberships",
            Self::Roles => "roles",
            Self::TimeEntries => "time entries",
            Self::TimeEntryActivities => "time entry activities",
            Self::Versions => "versions",
            Self::Types => "types",
            Self::Statuses => "statuses",
            Self::Priorities => "priorities",
        }
    }

    /// HAL link target for an entity of this resource.
    pub fn href(self, id: u64) -> String {
        format!("/api/v3/{}/{}", self.path(), id)
    }

    /// Resources whose PATCH requests must carry the current `lockVersion`.
    pub fn requires_lock_version(self) -> bool {
        matches!(self, Self::WorkPackages)
    }
}

/// Acknowledgement returned for successful deletions.
pub fn deletion_ack(resource: Resource, id: u64) -> Value {
    json!({
        "success": true,
        "resource": resource.path(),
        "id": id,
        "message": format!("{} {} deleted", resource.path(), id),
    })
}

/// Operations the gateway needs from OpenProject.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Base URL of the backend, reported by the service metadata endpoint.
    fn base_url(&self) -> &str;

    /// Retrieve every element of `resource` matching `filters`.
    ///
    /// `None` means "no filter argument", which is not the same request as an
    /// empty filter list. Implementations walk all pages internally; a failure
    /// on any page fails the whole call.
    async fn list(
        &self,
        resource: Resource,
        filters: Option<Vec<FilterClause>>,
    ) -> BackendResult<CollectionPage>;

    /// Fetch a single entity.
    async fn get(&self, resource: Resource, id: u64) -> BackendResult<Value>;

    /// Create an entity from a HAL payload.
    async fn create(&self, resource: Resource, payload: Value) -> BackendResult<Value>;

    /// Create a relation originating from work package `from_id`.
    async fn create_relation(&self, from_id: u64, payload: Value) -> BackendResult<Value>;

    /// Patch an entity with the given fields.
    async fn update(&self, resource: Resource, id: u64, payload: Value) -> BackendResult<Value>;

    /// Delete an entity, returning an acknowledgement object.
    async fn delete(&self, resource: Resource, id: u64) -> BackendResult<Value>;

    /// Connectivity probe. `success` in the returned object tells whether the
    /// backend accepted the request.
    async fn test_connection(&self) -> BackendResult<Value>;
}
