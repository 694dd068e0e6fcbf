//! Test helpers
//!
//! A scriptable in-memory adapter and task source.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use scw_reconciler_provider::{IdShape, LocalityKind, ResourceId, VendorError};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::projector::Diff;
use crate::state::{AttrKind, Attribute, Attributes, ResourceState, Schema};
use crate::traits::{
    OperationContext, OperationStatus, ResourceAdapter, TaskSnapshot, TaskSource, TaskStatus,
};

pub const MOCK_ID: &str = "11111111-2222-3333-4444-555555555555";

/// Scripted vendor reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Attributes),
    Http(u16),
}

impl Reply {
    fn into_result(self) -> CoreResult<Attributes> {
        match self {
            Self::Ok(attrs) => Ok(attrs),
            Self::Http(status) => Err(http_error(status)),
        }
    }
}

pub fn http_error(status: u16) -> CoreError {
    CoreError::Vendor(VendorError::Response {
        service: "mock".into(),
        status,
        raw_message: format!("scripted {status}"),
    })
}

/// Attribute map from `(name, value)` pairs.
pub fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

// ===== MockAdapter =====

/// Regional adapter whose vendor replies are scripted per test.
///
/// Schema: `name` (required), `size` (optional, ForceNew), `label`
/// (optional-computed, updatable), `secret` (computed, sensitive),
/// `status` (computed), `region`.
pub struct MockAdapter {
    name: &'static str,
    schema: Schema,
    with_lifecycle: bool,
    forbidden_means_deleted: bool,
    waits_for_deletion: bool,
    supports_update: bool,
    reads: Mutex<VecDeque<Reply>>,
    /// Served once the read script is exhausted.
    steady_read: Mutex<Reply>,
    creates: Mutex<VecDeque<Reply>>,
    deletes: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn regional(name: &'static str) -> Self {
        Self {
            name,
            schema: Schema::new()
                .attr("name", Attribute::required(AttrKind::String))
                .attr(
                    "size",
                    Attribute::optional(AttrKind::Int {
                        min: Some(1),
                        max: Some(100),
                    })
                    .force_new(),
                )
                .attr("label", Attribute::optional_computed(AttrKind::String))
                .attr("secret", Attribute::computed(AttrKind::String).sensitive())
                .attr("status", Attribute::computed(AttrKind::String))
                .attr(
                    "region",
                    Attribute::optional_computed(AttrKind::String).force_new(),
                ),
            with_lifecycle: false,
            forbidden_means_deleted: false,
            waits_for_deletion: false,
            supports_update: false,
            reads: Mutex::new(VecDeque::new()),
            steady_read: Mutex::new(Reply::Http(404)),
            creates: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_lifecycle(mut self) -> Self {
        self.with_lifecycle = true;
        self
    }

    #[must_use]
    pub fn with_update(mut self) -> Self {
        self.supports_update = true;
        self
    }

    #[must_use]
    pub fn with_deletion_wait(mut self, forbidden_means_deleted: bool) -> Self {
        self.waits_for_deletion = true;
        self.forbidden_means_deleted = forbidden_means_deleted;
        self
    }

    pub async fn push_read(&self, reply: Reply) {
        self.reads.lock().await.push_back(reply);
    }

    pub async fn set_steady_read(&self, reply: Reply) {
        *self.steady_read.lock().await = reply;
    }

    pub async fn push_create(&self, reply: Reply) {
        self.creates.lock().await.push_back(reply);
    }

    pub async fn push_delete(&self, reply: Reply) {
        self.deletes.lock().await.push_back(reply);
    }

    /// Operations invoked so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    async fn record(&self, operation: &str) {
        self.calls.lock().await.push(operation.to_string());
    }
}

/// A settled mock object.
pub fn ready(name: &str) -> Reply {
    Reply::Ok(attrs(&[
        ("name", json!(name)),
        ("label", json!("default")),
        ("status", json!("ready")),
    ]))
}

pub fn with_status(name: &str, status: &str) -> Reply {
    Reply::Ok(attrs(&[
        ("name", json!(name)),
        ("label", json!("default")),
        ("status", json!(status)),
    ]))
}

#[async_trait]
impl ResourceAdapter for MockAdapter {
    fn type_name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn locality_kind(&self) -> LocalityKind {
        LocalityKind::Region
    }

    fn id_shape(&self) -> IdShape {
        IdShape::Regional
    }

    fn lifecycle(&self, attributes: &Attributes) -> Option<OperationStatus> {
        if !self.with_lifecycle {
            return None;
        }
        Some(match attributes.get("status").and_then(Value::as_str) {
            Some("ready") => OperationStatus::Ready,
            Some("error") => OperationStatus::Error,
            Some("deleted") => OperationStatus::Terminated,
            Some("provisioning") => OperationStatus::Provisioning,
            _ => OperationStatus::Pending,
        })
    }

    fn waits_for_deletion(&self) -> bool {
        self.waits_for_deletion
    }

    fn forbidden_means_deleted(&self) -> bool {
        self.forbidden_means_deleted
    }

    fn supports_update(&self) -> bool {
        self.supports_update
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        _configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)> {
        self.record("create").await;
        let reply = self
            .creates
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Reply::Ok(attrs(&[("secret", json!("s3cr3t"))])));
        let created = reply.into_result()?;
        let id = ResourceId::Regional {
            region: ctx.region()?,
            id: Uuid::parse_str(MOCK_ID).map_err(|e| CoreError::Validation(e.to_string()))?,
        };
        Ok((id, created))
    }

    async fn read(&self, _ctx: &OperationContext, _id: &ResourceId) -> CoreResult<Attributes> {
        self.record("read").await;
        let scripted = self.reads.lock().await.pop_front();
        let reply = match scripted {
            Some(reply) => reply,
            None => self.steady_read.lock().await.clone(),
        };
        reply.into_result()
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        _id: &ResourceId,
        _prior: &ResourceState,
        configured: &ResourceState,
        diff: &Diff,
    ) -> CoreResult<Attributes> {
        self.record("update").await;
        let mut echoed = Attributes::new();
        for name in &diff.changed {
            if let Some(value) = configured.get(name) {
                echoed.insert(name.clone(), value.clone());
            }
        }
        Ok(echoed)
    }

    async fn delete(&self, _ctx: &OperationContext, _id: &ResourceId) -> CoreResult<()> {
        self.record("delete").await;
        match self.deletes.lock().await.pop_front() {
            Some(reply) => reply.into_result().map(|_| ()),
            None => Ok(()),
        }
    }
}

// ===== MockTaskSource =====

/// Serves scripted snapshots in order, repeating the last one.
pub struct MockTaskSource {
    snapshots: Mutex<VecDeque<TaskSnapshot>>,
    fetches: Mutex<usize>,
}

impl MockTaskSource {
    pub fn new(snapshots: Vec<TaskSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            fetches: Mutex::new(0),
        }
    }

    pub async fn fetches(&self) -> usize {
        *self.fetches.lock().await
    }
}

pub fn snapshot(status: TaskStatus, affected: &[&str]) -> TaskSnapshot {
    TaskSnapshot {
        id: "aaaa".to_string(),
        status,
        affected: affected.iter().map(|s| (*s).to_string()).collect(),
        message: None,
    }
}

#[async_trait]
impl TaskSource for MockTaskSource {
    async fn fetch_task(&self, _project_id: Uuid, task_id: &str) -> CoreResult<TaskSnapshot> {
        *self.fetches.lock().await += 1;
        let mut queue = self.snapshots.lock().await;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.map(|mut s| {
            s.id = task_id.to_string();
            s
        })
        .ok_or_else(|| http_error(404))
    }
}

/// Shared handle for registering a mock and inspecting it afterwards.
pub fn shared(adapter: MockAdapter) -> Arc<MockAdapter> {
    Arc::new(adapter)
}
