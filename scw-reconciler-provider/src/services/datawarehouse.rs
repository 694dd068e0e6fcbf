//! Datawarehouse databases API (regional, named under a deployment)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ScwClient;
use crate::error::{Result, VendorError};
use crate::locality::Region;

use super::segment;

const SERVICE: &str = "datawarehouse";

/// A database inside a deployment. Databases are keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct ListDatabasesResponse {
    #[serde(default)]
    databases: Vec<Database>,
}

#[derive(Debug, Serialize)]
struct CreateDatabaseRequest<'a> {
    name: &'a str,
}

/// Datawarehouse API bound to a shared client.
#[derive(Debug, Clone, Copy)]
pub struct DatawarehouseApi<'a> {
    client: &'a ScwClient,
}

impl<'a> DatawarehouseApi<'a> {
    pub fn new(client: &'a ScwClient) -> Self {
        Self { client }
    }

    fn databases_path(region: Region, deployment_id: Uuid) -> String {
        format!("/datawarehouse/v1beta1/regions/{region}/deployments/{deployment_id}/databases")
    }

    pub async fn create_database(
        &self,
        region: Region,
        deployment_id: Uuid,
        name: &str,
    ) -> Result<Database> {
        self.client
            .post(
                SERVICE,
                &Self::databases_path(region, deployment_id),
                &CreateDatabaseRequest { name },
            )
            .await
    }

    /// List databases, optionally filtered by exact name.
    pub async fn list_databases(
        &self,
        region: Region,
        deployment_id: Uuid,
        name: Option<&str>,
    ) -> Result<Vec<Database>> {
        let mut path = Self::databases_path(region, deployment_id);
        if let Some(name) = name {
            path.push_str("?name=");
            path.push_str(&segment(name));
        }
        let resp: ListDatabasesResponse = self.client.get(SERVICE, &path).await?;
        Ok(resp.databases)
    }

    /// Look up one database by name through the list endpoint.
    ///
    /// The API has no single-database GET; an empty match is reported as
    /// [`VendorError::ResourceNotFound`].
    pub async fn get_database(
        &self,
        region: Region,
        deployment_id: Uuid,
        name: &str,
    ) -> Result<Database> {
        self.list_databases(region, deployment_id, Some(name))
            .await?
            .into_iter()
            .find(|db| db.name == name)
            .ok_or_else(|| VendorError::ResourceNotFound {
                service: SERVICE.to_string(),
                resource: "database".to_string(),
                resource_id: format!("{region}/{deployment_id}/{name}"),
                raw_message: None,
            })
    }

    pub async fn delete_database(
        &self,
        region: Region,
        deployment_id: Uuid,
        name: &str,
    ) -> Result<()> {
        let path = format!(
            "{}/{}",
            Self::databases_path(region, deployment_id),
            segment(name)
        );
        self.client.delete(SERVICE, &path).await
    }
}

impl ScwClient {
    /// Datawarehouse API view of this client.
    pub fn datawarehouse(&self) -> DatawarehouseApi<'_> {
        DatawarehouseApi::new(self)
    }
}
