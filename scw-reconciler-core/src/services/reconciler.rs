//! Reconciler
//!
//! Drives each CRUD operation through an adapter and turns vendor outcomes
//! into state changes (drift) or surfaced errors.

use std::sync::Arc;
use std::time::Duration;

use scw_reconciler_provider::{Locality, ResourceId};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{effective_retry_interval, ProviderConfig};
use crate::error::{ApplyError, CoreError, CoreResult, ErrorClass};
use crate::projector::{
    apply_changes, diff, embedded_locality, finalize, seed_state, validate_config,
};
use crate::resolver::LocalityResolver;
use crate::state::{Attributes, ResourceState};
use crate::traits::{AdapterRegistry, Operation, OperationContext, OperationStatus, ResourceAdapter};
use crate::waiter::{WaitMode, Waiter};

/// Attribute holding the owning project, when a schema declares one.
pub const PROJECT_ATTRIBUTE: &str = "project_id";

/// Result of a Read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Present(ResourceState),
    /// The resource is gone; the host should clear the stored ID and re-plan.
    Drifted,
}

impl ReadOutcome {
    pub fn into_state(self) -> Option<ResourceState> {
        match self {
            Self::Present(state) => Some(state),
            Self::Drifted => None,
        }
    }
}

/// Result of an Update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(ResourceState),
    /// A ForceNew change destroyed and recreated the resource.
    Replaced(ResourceState),
    Unchanged(ResourceState),
}

impl UpdateOutcome {
    pub fn state(&self) -> &ResourceState {
        match self {
            Self::Updated(state) | Self::Replaced(state) | Self::Unchanged(state) => state,
        }
    }

    pub fn into_state(self) -> ResourceState {
        match self {
            Self::Updated(state) | Self::Replaced(state) | Self::Unchanged(state) => state,
        }
    }
}

/// Reconciliation entry point shared by all operations.
///
/// Holds no per-resource state; operations on distinct resources may run
/// concurrently.
pub struct Reconciler {
    registry: Arc<dyn AdapterRegistry>,
    resolver: LocalityResolver,
    retry_override: Option<Duration>,
}

impl Reconciler {
    #[must_use]
    pub fn new(registry: Arc<dyn AdapterRegistry>, config: &ProviderConfig) -> Self {
        Self {
            registry,
            resolver: LocalityResolver::from_config(config),
            retry_override: config.retry_interval,
        }
    }

    pub fn resolver(&self) -> &LocalityResolver {
        &self.resolver
    }

    pub(crate) async fn adapter(&self, resource_type: &str) -> CoreResult<Arc<dyn ResourceAdapter>> {
        self.registry
            .get(resource_type)
            .await
            .ok_or_else(|| CoreError::UnknownResourceType(resource_type.to_string()))
    }

    pub(crate) fn context(
        &self,
        adapter: &dyn ResourceAdapter,
        operation: Operation,
        locality: Locality,
        project_id: Option<Uuid>,
        cancel: &CancellationToken,
    ) -> OperationContext {
        let timeout = adapter.timeouts().for_operation(operation);
        let interval =
            effective_retry_interval(self.retry_override, adapter.default_retry_interval());
        OperationContext {
            resource_type: adapter.type_name(),
            operation,
            locality,
            project_id,
            waiter: Waiter::new(timeout, interval, cancel.clone()),
        }
    }

    /// Decode the stored ID, accepting a bare UUID when a locality is known.
    fn decode_stored(
        &self,
        adapter: &dyn ResourceAdapter,
        state: &ResourceState,
    ) -> CoreResult<ResourceId> {
        let type_name = adapter.type_name();
        let raw = state
            .id
            .as_deref()
            .ok_or_else(|| CoreError::Validation(format!("[{type_name}] state has no ID")))?;
        let kind = adapter.locality_kind();
        let configured = kind.attribute().and_then(|attr| state.get_str(attr));
        let fallback = self.resolver.resolve(type_name, kind, configured, None).ok();
        Ok(ResourceId::decode_with_fallback(
            raw,
            adapter.id_shape(),
            fallback,
        )?)
    }

    /// Locality and project of an existing resource.
    pub(crate) fn scope(
        &self,
        adapter: &dyn ResourceAdapter,
        id: &ResourceId,
        state: &ResourceState,
    ) -> CoreResult<(Locality, Option<Uuid>)> {
        let locality = self.resolver.resolve(
            adapter.type_name(),
            adapter.locality_kind(),
            None,
            Some(id.locality()),
        )?;
        let from_id = match id {
            ResourceId::ProjectScoped { project, .. } => Some(*project),
            _ => None,
        };
        let project = self
            .resolver
            .resolve_project(state.get_str(PROJECT_ATTRIBUTE), from_id)?;
        Ok((locality, project))
    }

    /// Read until the lifecycle is terminal; Error and Terminated fail.
    async fn settle(
        &self,
        adapter: &dyn ResourceAdapter,
        ctx: &OperationContext,
        id: &ResourceId,
    ) -> CoreResult<Attributes> {
        let type_name = adapter.type_name();
        let fresh = ctx
            .waiter
            .wait_for(
                type_name,
                WaitMode::Ready,
                || adapter.read(ctx, id),
                |attrs: &Attributes| adapter.lifecycle(attrs).is_none_or(OperationStatus::is_terminal),
            )
            .await?
            .ok_or_else(|| CoreError::Projection(format!("[{type_name}] {id} read returned nothing")))?;

        match adapter.lifecycle(&fresh) {
            Some(status @ (OperationStatus::Error | OperationStatus::Terminated)) => {
                let status = fresh
                    .get("status")
                    .and_then(Value::as_str)
                    .map_or_else(|| format!("{status:?}").to_lowercase(), str::to_string);
                Err(CoreError::ResourceFailed {
                    resource: format!("{type_name} {id}"),
                    status,
                })
            }
            _ => Ok(fresh),
        }
    }

    // ============ Create ============

    /// Create a resource, then read it back to hydrate computed attributes.
    ///
    /// Once the vendor create succeeded, every later failure carries the
    /// state to persist in [`ApplyError::persisted`]; nothing is rolled back.
    pub async fn create(
        &self,
        resource_type: &str,
        configured: &ResourceState,
        cancel: &CancellationToken,
    ) -> Result<ResourceState, ApplyError> {
        let adapter = self.adapter(resource_type).await?;
        let adapter = adapter.as_ref();
        let schema = adapter.schema();
        let kind = adapter.locality_kind();

        validate_config(resource_type, schema, configured).map_err(|e| {
            e.log(resource_type);
            e
        })?;
        let locality = self.resolver.resolve(
            resource_type,
            kind,
            kind.attribute().and_then(|attr| configured.get_str(attr)),
            embedded_locality(schema, configured),
        )?;
        let project_id = self
            .resolver
            .resolve_project(configured.get_str(PROJECT_ATTRIBUTE), None)?;
        let ctx = self.context(adapter, Operation::Create, locality, project_id, cancel);

        log::info!("[{resource_type}] creating");
        let (id, created) = ctx
            .waiter
            .run(resource_type, adapter.create(&ctx, configured))
            .await
            .map_err(|e| {
                e.log(resource_type);
                ApplyError::from(e)
            })?;
        let seeded = seed_state(schema, kind, &id, configured, created);
        log::info!("[{resource_type}] created {id}");

        match self.hydrate(adapter, &ctx, &id, configured, &seeded).await {
            Ok(state) => Ok(state),
            Err(e) => {
                e.log(resource_type);
                log::warn!("[{resource_type}] keeping {id} in state for the next pass");
                Err(ApplyError::new(e, Some(seeded)))
            }
        }
    }

    async fn hydrate(
        &self,
        adapter: &dyn ResourceAdapter,
        ctx: &OperationContext,
        id: &ResourceId,
        configured: &ResourceState,
        seeded: &ResourceState,
    ) -> CoreResult<ResourceState> {
        let fresh = self.settle(adapter, ctx, id).await?;
        let state = finalize(
            adapter.type_name(),
            adapter.schema(),
            adapter.locality_kind(),
            id,
            fresh,
            Some(seeded),
        )?;
        self.converge(adapter, ctx, id, configured, state).await
    }

    /// Apply configured values the create call could not carry.
    ///
    /// Only updatable attributes are converged; a ForceNew mismatch is logged
    /// and left for the next plan.
    async fn converge(
        &self,
        adapter: &dyn ResourceAdapter,
        ctx: &OperationContext,
        id: &ResourceId,
        configured: &ResourceState,
        state: ResourceState,
    ) -> CoreResult<ResourceState> {
        if !adapter.supports_update() {
            return Ok(state);
        }
        let type_name = adapter.type_name();
        let schema = adapter.schema();

        let mut pending = diff(schema, &state, configured);
        pending.changed.retain(|name| configured.get(name).is_some());
        if pending.is_empty() {
            return Ok(state);
        }
        pending.requires_replace = pending
            .changed
            .iter()
            .any(|name| schema.get(name).is_some_and(|attr| attr.force_new));
        if pending.requires_replace {
            log::warn!(
                "[{type_name}] {id} differs from configuration after create: {}",
                pending.changed.join(", ")
            );
            return Ok(state);
        }

        log::info!(
            "[{type_name}] applying {} to {id} after create",
            pending.changed.join(", ")
        );
        let returned = ctx
            .waiter
            .run(type_name, adapter.update(ctx, id, &state, configured, &pending))
            .await?;
        let applied = apply_changes(schema, &state, configured, returned);
        let fresh = self.settle(adapter, ctx, id).await?;
        finalize(
            type_name,
            schema,
            adapter.locality_kind(),
            id,
            fresh,
            Some(&applied),
        )
    }

    // ============ Read ============

    /// Refresh stored state. NotFound is drift, never an error.
    pub async fn read(
        &self,
        resource_type: &str,
        state: &ResourceState,
        cancel: &CancellationToken,
    ) -> CoreResult<ReadOutcome> {
        let adapter = self.adapter(resource_type).await?;
        let adapter = adapter.as_ref();
        let id = self.decode_stored(adapter, state)?;
        let (locality, project_id) = self.scope(adapter, &id, state)?;
        let ctx = self.context(adapter, Operation::Read, locality, project_id, cancel);

        log::debug!("[{resource_type}] reading {id}");
        match ctx.waiter.run(resource_type, adapter.read(&ctx, &id)).await {
            Ok(fresh) => finalize(
                resource_type,
                adapter.schema(),
                adapter.locality_kind(),
                &id,
                fresh,
                Some(state),
            )
            .map(ReadOutcome::Present)
            .map_err(|e| {
                e.log(resource_type);
                e
            }),
            Err(e) if e.class() == ErrorClass::NotFound => {
                log::warn!("[{resource_type}] {id} no longer exists, clearing it from state");
                Ok(ReadOutcome::Drifted)
            }
            Err(e) => {
                e.log(resource_type);
                Err(e)
            }
        }
    }

    // ============ Update ============

    /// Apply configuration changes in place, or replace on a ForceNew change.
    ///
    /// When the vendor update succeeded but the re-read failed, the updated
    /// state is carried in [`ApplyError::persisted`].
    pub async fn update(
        &self,
        resource_type: &str,
        prior: &ResourceState,
        configured: &ResourceState,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, ApplyError> {
        let adapter = self.adapter(resource_type).await?;
        let adapter = adapter.as_ref();
        let schema = adapter.schema();

        validate_config(resource_type, schema, configured).map_err(|e| {
            e.log(resource_type);
            e
        })?;
        let changes = diff(schema, prior, configured);
        if changes.is_empty() {
            log::debug!("[{resource_type}] no changes");
            return Ok(UpdateOutcome::Unchanged(prior.clone()));
        }
        let id = self.decode_stored(adapter, prior)?;

        if changes.requires_replace || !adapter.supports_update() {
            log::info!(
                "[{resource_type}] {id}: {} changed, replacing",
                changes.changed.join(", ")
            );
            self.delete(resource_type, prior, cancel).await?;
            return self
                .create(resource_type, configured, cancel)
                .await
                .map(UpdateOutcome::Replaced);
        }

        let (locality, project_id) = self.scope(adapter, &id, prior)?;
        let ctx = self.context(adapter, Operation::Update, locality, project_id, cancel);

        log::info!(
            "[{resource_type}] updating {id}: {}",
            changes.changed.join(", ")
        );
        let returned = ctx
            .waiter
            .run(
                resource_type,
                adapter.update(&ctx, &id, prior, configured, &changes),
            )
            .await
            .map_err(|e| {
                e.log(resource_type);
                ApplyError::from(e)
            })?;
        let applied = apply_changes(schema, prior, configured, returned);

        let refreshed = self.settle(adapter, &ctx, &id).await.and_then(|fresh| {
            finalize(
                resource_type,
                schema,
                adapter.locality_kind(),
                &id,
                fresh,
                Some(&applied),
            )
        });
        match refreshed {
            Ok(state) => Ok(UpdateOutcome::Updated(state)),
            Err(e) => {
                e.log(resource_type);
                Err(ApplyError::new(e, Some(applied)))
            }
        }
    }

    // ============ Delete ============

    /// Delete a resource. An already-absent resource is a success.
    pub async fn delete(
        &self,
        resource_type: &str,
        state: &ResourceState,
        cancel: &CancellationToken,
    ) -> CoreResult<()> {
        let adapter = self.adapter(resource_type).await?;
        let adapter = adapter.as_ref();
        if state.id.is_none() {
            log::debug!("[{resource_type}] nothing to delete");
            return Ok(());
        }
        let id = self.decode_stored(adapter, state)?;
        let (locality, project_id) = self.scope(adapter, &id, state)?;
        let ctx = self.context(adapter, Operation::Delete, locality, project_id, cancel);

        log::info!("[{resource_type}] deleting {id}");
        match ctx.waiter.run(resource_type, adapter.delete(&ctx, &id)).await {
            Ok(()) => {}
            Err(e) if is_gone(adapter, &e) => {
                log::info!("[{resource_type}] {id} already gone ({})", e.class());
                return Ok(());
            }
            Err(e) => {
                e.log(resource_type);
                return Err(e);
            }
        }

        if adapter.waits_for_deletion() {
            let mode = WaitMode::Deletion {
                forbidden_is_gone: adapter.forbidden_means_deleted(),
            };
            ctx.waiter
                .wait_for(
                    resource_type,
                    mode,
                    || adapter.read(&ctx, &id),
                    |attrs: &Attributes| adapter.lifecycle(attrs) == Some(OperationStatus::Terminated),
                )
                .await
                .map_err(|e| {
                    e.log(resource_type);
                    e
                })?;
        }

        log::info!("[{resource_type}] deleted {id}");
        Ok(())
    }
}

fn is_gone(adapter: &dyn ResourceAdapter, error: &CoreError) -> bool {
    match error.class() {
        ErrorClass::NotFound => true,
        ErrorClass::Forbidden => adapter.forbidden_means_deleted(),
        _ => false,
    }
}
