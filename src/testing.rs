//! In-memory backend used by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::core::config::Config;
use crate::core::server::GatewayServer;
use crate::domains::openproject::{
    BackendClient, BackendError, BackendResult, CollectionPage, FilterClause, Resource,
    collect_pages, deletion_ack,
};

/// A backend call as observed by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    List {
        resource: Resource,
        filters: Option<Vec<FilterClause>>,
    },
    Get {
        resource: Resource,
        id: u64,
    },
    Create {
        resource: Resource,
        payload: Value,
    },
    CreateRelation {
        from_id: u64,
        payload: Value,
    },
    Update {
        resource: Resource,
        id: u64,
        payload: Value,
    },
    Delete {
        resource: Resource,
        id: u64,
    },
    TestConnection,
}

/// Pages through canned collections exactly like the real client does.
pub(crate) struct FakeBackend {
    page_size: usize,
    collections: HashMap<Resource, Vec<Value>>,
    reported_totals: HashMap<Resource, u64>,
    fail_after_pages: Option<u64>,
    failure: Option<BackendError>,
    probe: Option<Value>,
    calls: Mutex<Vec<BackendCall>>,
    pages_served: Mutex<u64>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            page_size: 100,
            collections: HashMap::new(),
            reported_totals: HashMap::new(),
            fail_after_pages: None,
            failure: None,
            probe: None,
            calls: Mutex::new(Vec::new()),
            pages_served: Mutex::new(0),
        }
    }

    /// Seed `count` elements with ids `1..=count`.
    pub(crate) fn with_elements(mut self, resource: Resource, count: u64) -> Self {
        let elements = (1..=count)
            .map(|id| json!({"_type": resource.path(), "id": id}))
            .collect();
        self.collections.insert(resource, elements);
        self
    }

    /// Report a total that differs from the stored element count.
    pub(crate) fn with_reported_total(mut self, resource: Resource, total: u64) -> Self {
        self.reported_totals.insert(resource, total);
        self
    }

    /// Every page request after the first `pages` fails.
    pub(crate) fn failing_after_pages(mut self, pages: u64) -> Self {
        self.fail_after_pages = Some(pages);
        self
    }

    /// Every call fails with an upstream HTTP status.
    pub(crate) fn failing(mut self, status: u16, message: &str) -> Self {
        self.failure = Some(BackendError::status(status, message));
        self
    }

    /// Override the connectivity probe answer.
    pub(crate) fn with_probe(mut self, answer: Value) -> Self {
        self.probe = Some(answer);
        self
    }

    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn pages_served(&self) -> u64 {
        *self.pages_served.lock().unwrap()
    }

    /// Filters passed to the most recent `list` call.
    pub(crate) fn last_filters(&self) -> Option<Vec<FilterClause>> {
        let calls = self.calls.lock().unwrap();
        match calls.iter().rev().find(|call| matches!(call, BackendCall::List { .. })) {
            Some(BackendCall::List { filters, .. }) => filters.clone(),
            _ => None,
        }
    }

    /// Payload of the most recent write.
    pub(crate) fn last_payload(&self) -> Option<Value> {
        self.calls.lock().unwrap().iter().rev().find_map(|call| match call {
            BackendCall::Create { payload, .. }
            | BackendCall::CreateRelation { payload, .. }
            | BackendCall::Update { payload, .. } => Some(payload.clone()),
            _ => None,
        })
    }

    fn record(&self, call: BackendCall) -> BackendResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(BackendError::Status { status, message }) => {
                Err(BackendError::status(*status, message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn page(&self, resource: Resource, offset: u64) -> BackendResult<CollectionPage> {
        if self.fail_after_pages.is_some_and(|limit| offset > limit) {
            return Err(BackendError::status(502, "Bad Gateway"));
        }
        *self.pages_served.lock().unwrap() += 1;

        let all = self.collections.get(&resource).cloned().unwrap_or_default();
        let total = self
            .reported_totals
            .get(&resource)
            .copied()
            .unwrap_or(all.len() as u64);
        let start = (offset as usize - 1) * self.page_size;
        let elements = all.into_iter().skip(start).take(self.page_size).collect();
        Ok(CollectionPage::new(elements, total))
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    fn base_url(&self) -> &str {
        "http://openproject.test"
    }

    async fn list(
        &self,
        resource: Resource,
        filters: Option<Vec<FilterClause>>,
    ) -> BackendResult<CollectionPage> {
        self.record(BackendCall::List { resource, filters })?;
        collect_pages(|offset| async move { self.page(resource, offset) }).await
    }

    async fn get(&self, resource: Resource, id: u64) -> BackendResult<Value> {
        self.record(BackendCall::Get { resource, id })?;
        Ok(json!({"_type": resource.path(), "id": id}))
    }

    async fn create(&self, resource: Resource, payload: Value) -> BackendResult<Value> {
        self.record(BackendCall::Create {
            resource,
            payload: payload.clone(),
        })?;
        Ok(with_id(payload, 1000))
    }

    async fn create_relation(&self, from_id: u64, payload: Value) -> BackendResult<Value> {
        self.record(BackendCall::CreateRelation {
            from_id,
            payload: payload.clone(),
        })?;
        Ok(with_id(payload, 2000))
    }

    async fn update(&self, resource: Resource, id: u64, payload: Value) -> BackendResult<Value> {
        self.record(BackendCall::Update {
            resource,
            id,
            payload: payload.clone(),
        })?;
        Ok(with_id(payload, id))
    }

    async fn delete(&self, resource: Resource, id: u64) -> BackendResult<Value> {
        self.record(BackendCall::Delete { resource, id })?;
        Ok(deletion_ack(resource, id))
    }

    async fn test_connection(&self) -> BackendResult<Value> {
        self.record(BackendCall::TestConnection)?;
        Ok(self
            .probe
            .clone()
            .unwrap_or_else(|| json!({"success": true, "message": "Connected to OpenProject"})))
    }
}

fn with_id(mut payload: Value, id: u64) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert("id".to_string(), json!(id));
    }
    payload
}

/// A gateway wired to `backend` with default configuration.
pub(crate) fn gateway(backend: Arc<FakeBackend>) -> GatewayServer {
    gateway_with_config(Config::default(), backend)
}

pub(crate) fn gateway_with_config(config: Config, backend: Arc<FakeBackend>) -> GatewayServer {
    GatewayServer::new(config, backend)
}
