//! Resource adapter abstract Trait

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use scw_reconciler_provider::{IdShape, Locality, LocalityKind, Region, ResourceId, Zone};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::projector::Diff;
use crate::state::{Attributes, ResourceState, Schema};
use crate::waiter::{Waiter, DEFAULT_RETRY_INTERVAL};

/// Coarse lifecycle of a vendor object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Provisioning,
    Ready,
    Error,
    Terminated,
}

impl OperationStatus {
    /// Ends a readiness wait.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error | Self::Terminated)
    }
}

/// Reconciler operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Per-operation upper bounds enforced by the waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(10 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(10 * 60),
            delete: Duration::from_secs(10 * 60),
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Everything an adapter needs to run one operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub resource_type: &'static str,
    pub operation: Operation,
    /// Resolved locality of the resource.
    pub locality: Locality,
    /// Resolved owning project, if any.
    pub project_id: Option<Uuid>,
    /// Waiter bound to this operation's timeout and cancellation token.
    pub waiter: Waiter,
}

impl OperationContext {
    pub fn cancel_token(&self) -> &CancellationToken {
        self.waiter.cancel_token()
    }

    /// Run a vendor call, racing it against cancellation.
    pub async fn call<T, E, Fut>(&self, future: Fut) -> CoreResult<T>
    where
        Fut: Future<Output = Result<T, E>>,
        CoreError: From<E>,
    {
        self.waiter
            .run(self.resource_type, async move { future.await.map_err(CoreError::from) })
            .await
    }

    pub fn region(&self) -> CoreResult<Region> {
        self.locality.region().ok_or_else(|| {
            CoreError::Validation(format!(
                "[{}] expected a regional locality, got '{}'",
                self.resource_type, self.locality
            ))
        })
    }

    pub fn zone(&self) -> CoreResult<Zone> {
        self.locality.zone().ok_or_else(|| {
            CoreError::Validation(format!(
                "[{}] expected a zonal locality, got '{}'",
                self.resource_type, self.locality
            ))
        })
    }

    pub fn require_project(&self) -> CoreResult<Uuid> {
        self.project_id.ok_or_else(|| {
            CoreError::Validation(format!(
                "[{}] project_id is not configured and no default project is set",
                self.resource_type
            ))
        })
    }
}

/// Resource Adapter Trait
///
/// Per-resource glue between declarative state and one vendor API. The
/// reconciler treats adapters as opaque beyond these operations.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Registry key, e.g. `"vpn_gateway"`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    fn locality_kind(&self) -> LocalityKind;

    /// Composite ID shape accepted by decode and import.
    fn id_shape(&self) -> IdShape;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    fn default_retry_interval(&self) -> Duration {
        DEFAULT_RETRY_INTERVAL
    }

    /// Lifecycle of an observed state; `None` if the resource has none.
    fn lifecycle(&self, _attributes: &Attributes) -> Option<OperationStatus> {
        None
    }

    /// Poll after delete until the resource is gone.
    fn waits_for_deletion(&self) -> bool {
        false
    }

    /// HTTP 403 during delete observation means the resource is gone.
    fn forbidden_means_deleted(&self) -> bool {
        false
    }

    /// Without in-place update every change is a replacement.
    fn supports_update(&self) -> bool {
        false
    }

    /// Create the resource. Returns its ID and whatever the create response carried.
    async fn create(
        &self,
        ctx: &OperationContext,
        configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)>;

    /// Observe the resource. Must fail with a NotFound-class error when it is absent.
    async fn read(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<Attributes>;

    async fn update(
        &self,
        _ctx: &OperationContext,
        _id: &ResourceId,
        _prior: &ResourceState,
        _configured: &ResourceState,
        _diff: &Diff,
    ) -> CoreResult<Attributes> {
        Err(CoreError::Validation(format!(
            "[{}] does not support in-place update",
            self.type_name()
        )))
    }

    async fn delete(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<()>;

    /// Seed state for an imported ID.
    async fn import_state(
        &self,
        _ctx: &OperationContext,
        id: &ResourceId,
    ) -> CoreResult<ResourceState> {
        Ok(ResourceState::with_id(id.to_string()))
    }
}
