//! Cockpit tokens API (regional)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ScwClient;
use crate::error::Result;
use crate::locality::Region;

const SERVICE: &str = "cockpit";

/// A Cockpit access token.
///
/// `secret_key` is only populated in the create response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default, with = "crate::utils::datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::utils::datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    pub region: Region,
}

/// Body of a token creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub project_id: Uuid,
    pub name: String,
    #[serde(default, rename = "token_scopes")]
    pub scopes: Vec<String>,
}

/// Cockpit API bound to a shared client.
#[derive(Debug, Clone, Copy)]
pub struct CockpitApi<'a> {
    client: &'a ScwClient,
}

impl<'a> CockpitApi<'a> {
    pub fn new(client: &'a ScwClient) -> Self {
        Self { client }
    }

    fn tokens_path(region: Region) -> String {
        format!("/cockpit/v1/regions/{region}/tokens")
    }

    pub async fn create_token(&self, region: Region, req: &CreateTokenRequest) -> Result<Token> {
        self.client
            .post(SERVICE, &Self::tokens_path(region), req)
            .await
    }

    pub async fn get_token(&self, region: Region, token_id: Uuid) -> Result<Token> {
        let path = format!("{}/{token_id}", Self::tokens_path(region));
        self.client.get(SERVICE, &path).await
    }

    pub async fn delete_token(&self, region: Region, token_id: Uuid) -> Result<()> {
        let path = format!("{}/{token_id}", Self::tokens_path(region));
        self.client.delete(SERVICE, &path).await
    }
}

impl ScwClient {
    /// Cockpit API view of this client.
    pub fn cockpit(&self) -> CockpitApi<'_> {
        CockpitApi::new(self)
    }
}
