//! reqwest-backed OpenProject API v3 client.
//!
//! Full retrieval lives here: `list` walks `offset=1..` pages until the
//! reported total is reached, so callers never see a partial collection.

use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::client::{BackendClient, Resource, deletion_ack};
use super::envelope::CollectionPage;
use super::error::{BackendError, BackendResult};
use super::filters::{FilterClause, encode_filters};
use crate::core::config::BackendConfig;

/// Longest error body echoed back when OpenProject sends no structured message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for a single OpenProject instance.
#[derive(Debug, Clone)]
pub struct OpenProjectClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl OpenProjectClient {
    /// Build a client from backend configuration.
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("openproject-gateway/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| BackendError::Config(format!("invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            info!("OpenProject requests will use the configured proxy");
        }

        let http = builder
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            page_size: config.page_size.max(1),
        })
    }

    fn api_root(&self) -> String {
        format!("{}/api/v3", self.base_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root(), path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.api_key {
            Some(key) => request.basic_auth("apikey", Some(key)),
            None => request,
        }
    }

    /// Send a request and decode the JSON body, mapping non-success statuses.
    async fn send(&self, request: RequestBuilder) -> BackendResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::status(status.as_u16(), error_message(&body)));
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| BackendError::invalid_response(e.to_string()))
    }

    async fn fetch_page(
        &self,
        resource: Resource,
        filters: Option<&str>,
        offset: u64,
    ) -> BackendResult<CollectionPage> {
        let mut query = vec![
            ("offset", offset.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(filters) = filters {
            query.push(("filters", filters.to_string()));
        }

        debug!("GET {} page {}", resource.path(), offset);
        let document = self
            .send(
                self.request(Method::GET, self.endpoint(resource.path()))
                    .query(&query),
            )
            .await?;
        CollectionPage::from_hal(document)
    }

    /// Insert the current `lockVersion` when the resource needs one and the
    /// payload does not carry it.
    async fn with_lock_version(
        &self,
        resource: Resource,
        id: u64,
        mut payload: Value,
    ) -> BackendResult<Value> {
        if !resource.requires_lock_version() || payload.get("lockVersion").is_some() {
            return Ok(payload);
        }

        let current = self.get(resource, id).await?;
        let lock_version = current.get("lockVersion").cloned().ok_or_else(|| {
            BackendError::invalid_response(format!("{} {} has no lockVersion", resource.path(), id))
        })?;

        if let Value::Object(fields) = &mut payload {
            fields.insert("lockVersion".to_string(), lock_version);
        }
        Ok(payload)
    }
}

#[async_trait]
impl BackendClient for OpenProjectClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list(
        &self,
        resource: Resource,
        filters: Option<Vec<FilterClause>>,
    ) -> BackendResult<CollectionPage> {
        let encoded = filters.as_deref().map(encode_filters);
        collect_pages(|offset| self.fetch_page(resource, encoded.as_deref(), offset)).await
    }

    async fn get(&self, resource: Resource, id: u64) -> BackendResult<Value> {
        let url = self.endpoint(&format!("{}/{}", resource.path(), id));
        self.send(self.request(Method::GET, url)).await
    }

    async fn create(&self, resource: Resource, payload: Value) -> BackendResult<Value> {
        let url = self.endpoint(resource.path());
        self.send(self.request(Method::POST, url).json(&payload)).await
    }

    async fn create_relation(&self, from_id: u64, payload: Value) -> BackendResult<Value> {
        let url = self.endpoint(&format!("work_packages/{}/relations", from_id));
        self.send(self.request(Method::POST, url).json(&payload)).await
    }

    async fn update(&self, resource: Resource, id: u64, payload: Value) -> BackendResult<Value> {
        let payload = self.with_lock_version(resource, id, payload).await?;
        let url = self.endpoint(&format!("{}/{}", resource.path(), id));
        self.send(self.request(Method::PATCH, url).json(&payload)).await
    }

    async fn delete(&self, resource: Resource, id: u64) -> BackendResult<Value> {
        let url = self.endpoint(&format!("{}/{}", resource.path(), id));
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(deletion_ack(resource, id))
    }

    async fn test_connection(&self) -> BackendResult<Value> {
        let response = self.request(Method::GET, self.api_root()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenProject connectivity probe returned HTTP {}", status.as_u16());
            return Ok(json!({
                "success": false,
                "status": status.as_u16(),
                "message": error_message(&body),
            }));
        }

        let root: Value = response.json().await?;
        Ok(json!({
            "success": true,
            "message": "Successfully connected to OpenProject",
            "url": self.base_url,
            "instance_name": root.get("instanceName").cloned().unwrap_or(Value::Null),
            "core_version": root.get("coreVersion").cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Walk pages starting at offset 1 until the collected count reaches the
/// reported total or a page comes back empty.
///
/// The first page's error is returned as is; later errors are wrapped in
/// [`BackendError::IncompleteRetrieval`] so a truncated result never escapes.
pub(crate) async fn collect_pages<F, Fut>(mut fetch: F) -> BackendResult<CollectionPage>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = BackendResult<CollectionPage>>,
{
    let mut elements = Vec::new();
    let mut total = 0;
    let mut offset = 1;

    loop {
        let page = match fetch(offset).await {
            Ok(page) => page,
            Err(source) if offset > 1 => {
                return Err(BackendError::IncompleteRetrieval {
                    offset,
                    retrieved: elements.len(),
                    total,
                    source: Box::new(source),
                });
            }
            Err(e) => return Err(e),
        };

        total = page.total;
        let fetched = page.elements.len();
        elements.extend(page.elements);

        if fetched == 0 || elements.len() as u64 >= total {
            break;
        }
        offset += 1;
    }

    debug!("Collected {} elements over {} page(s)", elements.len(), offset);
    Ok(CollectionPage { elements, total })
}

/// Extract OpenProject's error `message`, falling back to a truncated body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect())
}
