//! Helpers shared by the OpenProject tool definitions.
//!
//! - [`fetch_all`] is the single place list tools go through: full retrieval,
//!   then the collection envelope.
//! - [`HalPayload`] builds request bodies in the HAL shape OpenProject expects.

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::domains::openproject::{
    BackendClient, BackendResult, CollectionEnvelope, FilterClause, Resource,
};

/// Retrieve every matching element and wrap it in the collection envelope.
pub async fn fetch_all(
    client: &dyn BackendClient,
    resource: Resource,
    filters: Option<Vec<FilterClause>>,
) -> BackendResult<Value> {
    info!(
        "Retrieving all {} ({} filter clauses)",
        resource.label(),
        filters.as_ref().map_or(0, Vec::len)
    );

    let page = client.list(resource, filters).await?;
    let envelope = CollectionEnvelope::assemble(page, resource.label());

    if envelope.is_consistent() {
        info!("Retrieved all {} {}", envelope.count, resource.label());
    } else {
        warn!(
            "Retrieved {} {} but OpenProject reported {}",
            envelope.count,
            resource.label(),
            envelope.total
        );
    }

    Ok(envelope.into_value())
}

/// Request body builder for OpenProject writes.
#[derive(Debug, Clone, Default)]
pub struct HalPayload {
    fields: Map<String, Value>,
    links: Map<String, Value>,
    meta: Map<String, Value>,
}

impl HalPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn optional_field<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Formattable text such as descriptions and comments (`{"raw": ...}`).
    pub fn formattable(self, key: &str, text: Option<String>) -> Self {
        match text {
            Some(text) => self.field(key, json!({ "raw": text })),
            None => self,
        }
    }

    /// `_links.<key>` pointing at an entity.
    pub fn link(self, key: &str, resource: Resource, id: u64) -> Self {
        self.link_href(key, resource.href(id))
    }

    pub fn optional_link(self, key: &str, resource: Resource, id: Option<u64>) -> Self {
        match id {
            Some(id) => self.link(key, resource, id),
            None => self,
        }
    }

    pub fn link_href(mut self, key: &str, href: impl Into<String>) -> Self {
        self.links.insert(key.to_string(), json!({ "href": href.into() }));
        self
    }

    /// `_links.<key>` as a list of entity links.
    pub fn links(mut self, key: &str, resource: Resource, ids: &[u64]) -> Self {
        let hrefs = ids
            .iter()
            .map(|id| json!({ "href": resource.href(*id) }))
            .collect::<Vec<_>>();
        self.links.insert(key.to_string(), Value::Array(hrefs));
        self
    }

    /// Unset a link (`{"href": null}`).
    pub fn clear_link(mut self, key: &str) -> Self {
        self.links.insert(key.to_string(), json!({ "href": null }));
        self
    }

    /// `_meta.<key>` as formattable text.
    pub fn meta_text(mut self, key: &str, text: Option<String>) -> Self {
        if let Some(text) = text {
            self.meta.insert(key.to_string(), json!({ "raw": text }));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.links.is_empty() && self.meta.is_empty()
    }

    pub fn build(self) -> Value {
        let mut body = self.fields;
        if !self.links.is_empty() {
            body.insert("_links".to_string(), Value::Object(self.links));
        }
        if !self.meta.is_empty() {
            body.insert("_meta".to_string(), Value::Object(self.meta));
        }
        Value::Object(body)
    }
}

/// ISO 8601 duration for a number of hours, e.g. `2.5` → `PT2.5H`.
pub fn iso_hours(hours: f64) -> String {
    format!("PT{}H", hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[test]
    fn test_payload_shape() {
        let body = HalPayload::new()
            .field("subject", "Fix login")
            .formattable("description", Some("Steps".to_string()))
            .formattable("comment", None)
            .link("project", Resource::Projects, 5)
            .optional_link("assignee", Resource::Users, None)
            .build();

        assert_eq!(
            body,
            json!({
                "subject": "Fix login",
                "description": {"raw": "Steps"},
                "_links": {"project": {"href": "/api/v3/projects/5"}}
            })
        );
    }

    #[test]
    fn test_links_and_meta() {
        let body = HalPayload::new()
            .links("roles", Resource::Roles, &[3, 4])
            .clear_link("parent")
            .meta_text("notificationMessage", Some("Welcome".to_string()))
            .build();

        assert_eq!(body["_links"]["roles"][1]["href"], "/api/v3/roles/4");
        assert!(body["_links"]["parent"]["href"].is_null());
        assert_eq!(body["_meta"]["notificationMessage"]["raw"], "Welcome");
    }

    #[test]
    fn test_empty_payload() {
        assert!(HalPayload::new().is_empty());
        assert_eq!(HalPayload::new().build(), json!({}));
    }

    #[test]
    fn test_iso_hours() {
        assert_eq!(iso_hours(2.0), "PT2H");
        assert_eq!(iso_hours(2.5), "PT2.5H");
    }

    #[tokio::test]
    async fn test_fetch_all_envelope() {
        let backend = FakeBackend::new().with_elements(Resource::Versions, 3);
        let result = fetch_all(&backend, Resource::Versions, None).await.unwrap();

        assert_eq!(result["_type"], "Collection");
        assert_eq!(result["count"], 3);
        assert_eq!(result["_retrieval_info"]["note"], "All versions retrieved successfully");
    }
}
