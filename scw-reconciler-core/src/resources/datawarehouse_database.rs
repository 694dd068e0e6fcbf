//! `datawarehouse_database`: a named database under a regional deployment

use std::sync::Arc;

use async_trait::async_trait;
use scw_reconciler_provider::services::datawarehouse::Database;
use scw_reconciler_provider::{IdShape, LocalityKind, ResourceId, ScwClient};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::projector::{expand, flatten, qualify};
use crate::state::{AttrKind, Attribute, Attributes, ResourceState, Schema};
use crate::traits::{OperationContext, ResourceAdapter};

pub const TYPE_NAME: &str = "datawarehouse_database";

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    deployment_id: Uuid,
    name: String,
}

pub struct DatawarehouseDatabaseAdapter {
    client: Arc<ScwClient>,
    schema: Schema,
}

impl DatawarehouseDatabaseAdapter {
    pub fn new(client: Arc<ScwClient>) -> Self {
        let schema = Schema::new()
            .attr(
                "deployment_id",
                Attribute::required(AttrKind::LocalityId).force_new(),
            )
            .attr("name", Attribute::required(AttrKind::String).force_new())
            .attr(
                "size",
                Attribute::computed(AttrKind::Int {
                    min: Some(0),
                    max: None,
                }),
            )
            .attr(
                "region",
                Attribute::optional_computed(AttrKind::String).force_new(),
            );
        Self { client, schema }
    }

    fn attributes_of(
        &self,
        ctx: &OperationContext,
        deployment: Uuid,
        db: &Database,
    ) -> CoreResult<Attributes> {
        let mut attributes = flatten(&self.schema, db, ctx.locality)?;
        attributes.insert(
            "deployment_id".to_string(),
            Value::String(qualify(&deployment.to_string(), ctx.locality)),
        );
        Ok(attributes)
    }
}

fn named_parts(id: &ResourceId) -> CoreResult<(Uuid, &str)> {
    match id {
        ResourceId::RegionalNamed { parent, name, .. } => Ok((*parent, name.as_str())),
        other => Err(CoreError::Validation(format!(
            "[{TYPE_NAME}] expected region/deployment/name, got '{other}'"
        ))),
    }
}

#[async_trait]
impl ResourceAdapter for DatawarehouseDatabaseAdapter {
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
        IdShape::RegionalNamed
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        configured: &ResourceState,
    ) -> CoreResult<(ResourceId, Attributes)> {
        let config: DatabaseConfig = expand(&self.schema, configured)?;
        let region = ctx.region()?;
        let db = ctx
            .call(
                self.client
                    .datawarehouse()
                    .create_database(region, config.deployment_id, &config.name),
            )
            .await?;
        let id = ResourceId::RegionalNamed {
            region,
            parent: config.deployment_id,
            name: db.name.clone(),
        };
        Ok((id, self.attributes_of(ctx, config.deployment_id, &db)?))
    }

    // No single-database endpoint; the list is filtered by name.
    async fn read(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<Attributes> {
        let (deployment, name) = named_parts(id)?;
        let db = ctx
            .call(
                self.client
                    .datawarehouse()
                    .get_database(ctx.region()?, deployment, name),
            )
            .await?;
        self.attributes_of(ctx, deployment, &db)
    }

    async fn delete(&self, ctx: &OperationContext, id: &ResourceId) -> CoreResult<()> {
        let (deployment, name) = named_parts(id)?;
        ctx.call(
            self.client
                .datawarehouse()
                .delete_database(ctx.region()?, deployment, name),
        )
        .await
    }
}
