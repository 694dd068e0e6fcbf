//! `domain_registration`: a registrar order tracked through its background task
//!
//! The ID is `project/task`. Domains only become readable once the task
//! succeeds, so every Read goes through the task tracker first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use scw_reconciler_provider::services::domain::{
    AutoRenewStatus, BuyDomainsRequest, Domain, RegistrarTaskStatus,
};
use scw_reconciler_provider::{IdShape, LocalityKind, ResourceId, ScwClient, VendorError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ErrorClass};
use crate::projector::{expand, Diff};
use crate::services::TaskTracker;
use crate::state::{AttrKind, Attribute, Attributes, ResourceState, Schema};
use crate::traits::{
    OperationContext, ResourceAdapter, TaskSnapshot, TaskSource, TaskStatus, Timeouts,
};

pub const TYPE_NAME: &str = "domain_registration";

// ============ Task source ============

/// Registrar tasks seen through [`TaskSource`].
pub struct RegistrarTaskSource {
    client: Arc<ScwClient>,
}

impl RegistrarTaskSource {
    pub fn new(client: Arc<ScwClient>) -> Self {
        Self { client }
    }
}

fn task_status(status: RegistrarTaskStatus) -> TaskStatus {
    match status {
        RegistrarTaskStatus::Running => TaskStatus::Running,
        RegistrarTaskStatus::Success => TaskStatus::Succeeded,
        RegistrarTaskStatus::Error => TaskStatus::Failed,
        RegistrarTaskStatus::New
        | RegistrarTaskStatus::WaitingPayment
        | RegistrarTaskStatus::Pending
        | RegistrarTaskStatus::Unavailable => TaskStatus::Pending,
    }
}

fn parse_task_id(task_id: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(task_id).map_err(|e| {
        CoreError::Validation(format!("[{TYPE_NAME}] invalid task id '{task_id}': {e}"))
    })
}

#[async_trait]
impl TaskSource for RegistrarTaskSource {
    async fn fetch_task(&self, _project_id: Uuid, task_id: &str) -> CoreResult<TaskSnapshot> {
        let task = self.client.domain().get_task(parse_task_id(task_id)?).await?;
        log::debug!("[{TYPE_NAME}] task {} is {:?}", task.id, task.status);
        Ok(TaskSnapshot {
            id: task.id.to_string(),
            status: task_status(task.status),
            affected: task.domains,
            message: task.message,
        })
    }
}

// ============ Adapter ============

#[derive(Debug, Deserialize)]
struct DomainConfig {
    domain_names: Vec<String>,
    #[serde(default = "default_duration")]
    duration_in_years: u32,
    #[serde(default)]
    owner_contact_id: Option<String>,
}

fn default_duration() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct RenewConfig {
    domain_names: Vec<String>,
    auto_renew: Option<bool>,
}

pub struct DomainRegistrationAdapter {
    client: Arc<ScwClient>,
    tasks: TaskTracker,
    schema: Schema,
}

impl DomainRegistrationAdapter {
    pub fn new(client: Arc<ScwClient>) -> Self {
        let tasks = TaskTracker::new(Arc::new(RegistrarTaskSource::new(client.clone())));
        let schema = Schema::new()
            .attr(
                "domain_names",
                Attribute::required(AttrKind::Set).force_new(),
            )
            .attr(
                "duration_in_years",
                Attribute::optional(AttrKind::Int {
                    min: Some(1),
                    max: Some(10),
                })
                .force_new()
                .write_only(),
            )
            .attr(
                "owner_contact_id",
                Attribute::optional(AttrKind::String)
                    .force_new()
                    .write_only(),
            )
            .attr(
                "project_id",
                Attribute::optional_computed(AttrKind::String).force_new(),
            )
            .attr("auto_renew", Attribute::optional_computed(AttrKind::Bool))
            .attr("task_id", Attribute::computed(AttrKind::String))
            .attr("task_status", Attribute::computed(AttrKind::String))
            .attr("domains", Attribute::computed(AttrKind::Map));
        Self {
            client,
            tasks,
            schema,
        }
    }

    async fn read_domain(&self, ctx: &OperationContext, name: String) -> CoreResult<Domain> {
        let domain = ctx.call(self.client.domain().get_domain(&name)).await?;
        if domain.status.ends_with("_error") {
            return Err(CoreError::ResourceFailed {
                resource: name,
                status: domain.status,
            });
        }
        Ok(domain)
    }

    async fn set_auto_renew(
        &self,
        ctx: &OperationContext,
        name: &str,
        enabled: bool,
    ) -> CoreResult<()> {
        ctx.call(self.client.domain().set_auto_renew(name, enabled))
            .await
            .map(|_| ())
    }
}

fn task_parts(id: &ResourceId) -> CoreResult<(Uuid, &str)> {
    match id {
        ResourceId::ProjectScoped { project, sub_id } => Ok((*project, sub_id.as_str())),
        other => Err(CoreError::Validation(format!(
            "[{TYPE_NAME}] expected project/task, got '{other}'"
        ))),
    }
}

fn renewing(status: AutoRenewStatus) -> bool {
    matches!(status, AutoRenewStatus::Enabled | AutoRenewStatus::Enabling)
}

#[async_trait]
impl ResourceAdapter for DomainRegistrationAdapter {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn locality_kind(&self) -> LocalityKind {
        LocalityKind::Global
    }

    fn id_shape(&self) -> IdShape {
        IdShape::ProjectScoped
    }

    // Registrations can take a while to clear payment.
    fn timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(10 * 60),
            ..Timeouts::default()
        }
    }

    fn supports_update(&self) -> bool {
        true
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)> {
        let config: DomainConfig = expand(&self.schema, configured)?;
        let request = BuyDomainsRequest {
            project_id: ctx.require_project()?,
            domains: config.domain_names,
            duration_in_years: config.duration_in_years,
            owner_contact_id: config.owner_contact_id,
        };
        let order = ctx.call(self.client.domain().buy_domains(&request)).await?;
        log::info!(
            "[{TYPE_NAME}] ordered {} domain(s), task {}",
            request.domains.len(),
            order.task_id
        );

        let id = TaskTracker::composite_id(order.project_id, &order.task_id.to_string());
        let mut attributes = Attributes::new();
        attributes.insert("task_id".to_string(), json!(order.task_id.to_string()));
        attributes.insert("project_id".to_string(), json!(order.project_id.to_string()));
        if !order.domains.is_empty() {
            attributes.insert("domain_names".to_string(), json!(order.domains));
        }
        Ok((id, attributes))
    }

    async fn read(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<Attributes> {
        let (project, task_id) = task_parts(id)?;
        let report = self
            .tasks
            .resolve(&ctx.waiter, project, task_id, |name| self.read_domain(ctx, name))
            .await?
            .into_result()?;

        if !report.objects.is_empty() && report.present().next().is_none() {
            return Err(VendorError::ResourceNotFound {
                service: "domain".to_string(),
                resource: "domain".to_string(),
                resource_id: report.task.affected.join(","),
                raw_message: None,
            }
            .into());
        }
        for name in report.missing() {
            log::warn!("[{TYPE_NAME}] {name} from task {task_id} no longer exists");
        }

        let mut domains = Map::new();
        let mut auto_renew = true;
        for (name, domain) in report.present() {
            auto_renew &= renewing(domain.auto_renew_status);
            domains.insert(
                name.to_string(),
                json!({
                    "status": domain.status,
                    "auto_renew_status": domain.auto_renew_status,
                    "expired_at": domain.expired_at,
                }),
            );
        }

        let mut attributes = Attributes::new();
        if !report.task.affected.is_empty() {
            attributes.insert("domain_names".to_string(), json!(report.task.affected));
        }
        if !domains.is_empty() {
            attributes.insert("auto_renew".to_string(), Value::Bool(auto_renew));
        }
        attributes.insert("domains".to_string(), Value::Object(domains));
        attributes.insert("task_id".to_string(), json!(task_id));
        attributes.insert(
            "task_status".to_string(),
            json!(report.task.status.as_str()),
        );
        attributes.insert("project_id".to_string(), json!(project.to_string()));
        Ok(attributes)
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        _id: &ResourceId,
        _prior: &ResourceState,
        configured: &ResourceState,
        diff: &Diff,
    ) -> CoreResult<Attributes> {
        let config: RenewConfig = expand(&self.schema, configured)?;
        let mut attributes = Attributes::new();
        let Some(enabled) = config.auto_renew.filter(|_| diff.contains("auto_renew")) else {
            return Ok(attributes);
        };

        let calls = config
            .domain_names
            .iter()
            .map(|name| self.set_auto_renew(ctx, name, enabled));
        for result in join_all(calls).await {
            result?;
        }
        log::info!(
            "[{TYPE_NAME}] auto-renew {} on {} domain(s)",
            if enabled { "enabled" } else { "disabled" },
            config.domain_names.len()
        );
        attributes.insert("auto_renew".to_string(), Value::Bool(enabled));
        Ok(attributes)
    }

    // Registrations cannot be cancelled; stop renewal and forget them.
    async fn delete(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<()> {
        let (project, task_id) = task_parts(id)?;
        let task = ctx.call(self.tasks.fetch(project, task_id)).await?;

        let calls = task
            .affected
            .iter()
            .map(|name| self.set_auto_renew(ctx, name, false));
        for (name, result) in task.affected.iter().zip(join_all(calls).await) {
            match result {
                Ok(()) => log::info!("[{TYPE_NAME}] auto-renew disabled on {name}"),
                Err(e) if e.class() == ErrorClass::NotFound => {
                    log::debug!("[{TYPE_NAME}] {name} already gone");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
