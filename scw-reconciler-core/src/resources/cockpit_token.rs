//! `cockpit_token`: regional, replace-only, with a create-time secret

use std::sync::Arc;

use async_trait::async_trait;
use scw_reconciler_provider::services::cockpit::CreateTokenRequest;
use scw_reconciler_provider::{IdShape, LocalityKind, ResourceId, ScwClient};
use serde::Deserialize;

use crate::error::CoreResult;
use crate::projector::{expand, flatten};
use crate::state::{AttrKind, Attribute, Attributes, ResourceState, Schema};
use crate::traits::{OperationContext, ResourceAdapter};

pub const TYPE_NAME: &str = "cockpit_token";

#[derive(Debug, Deserialize)]
struct TokenConfig {
    name: String,
    #[serde(default)]
    scopes: Vec<String>,
}

pub struct CockpitTokenAdapter {
    client: Arc<ScwClient>,
    schema: Schema,
}

impl CockpitTokenAdapter {
    pub fn new(client: Arc<ScwClient>) -> Self {
        let schema = Schema::new()
            .attr("name", Attribute::required(AttrKind::String).force_new())
            .attr(
                "project_id",
                Attribute::optional_computed(AttrKind::String).force_new(),
            )
            .attr(
                "scopes",
                Attribute::optional_computed(AttrKind::List).force_new(),
            )
            .attr(
                "secret_key",
                Attribute::computed(AttrKind::String).sensitive(),
            )
            .attr("created_at", Attribute::computed(AttrKind::Timestamp))
            .attr(
                "region",
                Attribute::optional_computed(AttrKind::String).force_new(),
            );
        Self { client, schema }
    }
}

#[async_trait]
impl ResourceAdapter for CockpitTokenAdapter {
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

    // Tokens die with their project, which then answers 403.
    fn waits_for_deletion(&self) -> bool {
        true
    }

    fn forbidden_means_deleted(&self) -> bool {
        true
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)> {
        let config: TokenConfig = expand(&self.schema, configured)?;
        let region = ctx.region()?;
        let request = CreateTokenRequest {
            project_id: ctx.require_project()?,
            name: config.name,
            scopes: config.scopes,
        };
        let token = ctx
            .call(self.client.cockpit().create_token(region, &request))
            .await?;
        let id = ResourceId::Regional {
            region,
            id: token.id,
        };
        Ok((id, flatten(&self.schema, &token, ctx.locality)?))
    }

    async fn read(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<Attributes> {
        let token = ctx
            .call(self.client.cockpit().get_token(ctx.region()?, id.uuid()))
            .await?;
        flatten(&self.schema, &token, ctx.locality)
    }

    async fn delete(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<()> {
        ctx.call(self.client.cockpit().delete_token(ctx.region()?, id.uuid()))
            .await
    }
}
