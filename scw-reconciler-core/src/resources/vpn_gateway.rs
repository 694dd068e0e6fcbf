//! `vpn_gateway`: regional gateway with a provisioning lifecycle

use std::sync::Arc;

use async_trait::async_trait;
use scw_reconciler_provider::services::vpn::{
    CreateGatewayRequest, GatewayStatus, UpdateGatewayRequest,
};
use scw_reconciler_provider::{IdShape, LocalityKind, ResourceId, ScwClient};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::projector::{expand, flatten, Diff};
use crate::state::{AttrKind, Attribute, Attributes, ResourceState, Schema};
use crate::traits::{OperationContext, OperationStatus, ResourceAdapter};

pub const TYPE_NAME: &str = "vpn_gateway";

const STATUSES: &[&str] = &[
    "configuring",
    "provisioning",
    "active",
    "deprovisioning",
    "failed",
    "locked",
    "unknown_status",
];

#[derive(Debug, Deserialize)]
struct GatewayConfig {
    name: String,
    gateway_type: String,
    private_network_id: Uuid,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayChanges {
    name: Option<String>,
    tags: Option<Vec<String>>,
}

pub struct VpnGatewayAdapter {
    client: Arc<ScwClient>,
    schema: Schema,
}

impl VpnGatewayAdapter {
    pub fn new(client: Arc<ScwClient>) -> Self {
        let schema = Schema::new()
            .attr("name", Attribute::required(AttrKind::String))
            .attr(
                "gateway_type",
                Attribute::required(AttrKind::String).force_new(),
            )
            .attr(
                "private_network_id",
                Attribute::required(AttrKind::LocalityId).force_new(),
            )
            .attr(
                "project_id",
                Attribute::optional_computed(AttrKind::String).force_new(),
            )
            .attr("tags", Attribute::optional_computed(AttrKind::List))
            .attr("status", Attribute::computed(AttrKind::Enum(STATUSES)))
            .attr("created_at", Attribute::computed(AttrKind::Timestamp))
            .attr(
                "region",
                Attribute::optional_computed(AttrKind::String).force_new(),
            );
        Self { client, schema }
    }
}

#[async_trait]
impl ResourceAdapter for VpnGatewayAdapter {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
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
        let status: GatewayStatus =
            serde_json::from_value(attributes.get("status").filter(|v| v.is_string())?.clone())
                .ok()?;
        Some(match status {
            GatewayStatus::Active => OperationStatus::Ready,
            GatewayStatus::Failed | GatewayStatus::Locked => OperationStatus::Error,
            GatewayStatus::Provisioning
            | GatewayStatus::Configuring
            | GatewayStatus::Deprovisioning => OperationStatus::Provisioning,
            GatewayStatus::UnknownStatus => OperationStatus::Pending,
        })
    }

    fn waits_for_deletion(&self) -> bool {
        true
    }

    fn supports_update(&self) -> bool {
        true
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)> {
        let config: GatewayConfig = expand(&self.schema, configured)?;
        let region = ctx.region()?;
        let request = CreateGatewayRequest {
            name: config.name,
            project_id: ctx.require_project()?,
            gateway_type: config.gateway_type,
            private_network_id: config.private_network_id,
            tags: config.tags,
        };
        let gateway = ctx
            .call(self.client.vpn().create_gateway(region, &request))
            .await?;
        let id = ResourceId::Regional {
            region,
            id: gateway.id,
        };
        Ok((id, flatten(&self.schema, &gateway, ctx.locality)?))
    }

    async fn read(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<Attributes> {
        let gateway = ctx
            .call(self.client.vpn().get_gateway(ctx.region()?, id.uuid()))
            .await?;
        flatten(&self.schema, &gateway, ctx.locality)
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        _prior: &ResourceState,
        configured: &ResourceState,
        diff: &Diff,
    ) -> CoreResult<Attributes> {
        let wanted: GatewayChanges = expand(&self.schema, configured)?;
        let request = UpdateGatewayRequest {
            name: wanted.name.filter(|_| diff.contains("name")),
            tags: wanted.tags.filter(|_| diff.contains("tags")),
        };
        let gateway = ctx
            .call(
                self.client
                    .vpn()
                    .update_gateway(ctx.region()?, id.uuid(), &request),
            )
            .await?;
        flatten(&self.schema, &gateway, ctx.locality)
    }

    async fn delete(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<()> {
        ctx.call(self.client.vpn().delete_gateway(ctx.region()?, id.uuid()))
            .await
    }
}
