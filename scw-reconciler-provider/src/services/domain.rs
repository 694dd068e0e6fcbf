//! Domain registrar API (project-scoped orders, background tasks)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ScwClient;
use crate::error::Result;

use super::segment;

const SERVICE: &str = "domain";
const BASE: &str = "/domain/v2beta1";

/// Body of a domain purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyDomainsRequest {
    pub project_id: Uuid,
    pub domains: Vec<String>,
    pub duration_in_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_contact_id: Option<String>,
}

/// Purchase acknowledgement. Registration continues in the background task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub project_id: Uuid,
    pub task_id: Uuid,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default, with = "crate::utils::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Background task state as reported by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrarTaskStatus {
    New,
    WaitingPayment,
    Pending,
    Running,
    Success,
    Error,
    #[serde(other)]
    Unavailable,
}

/// A registrar background task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: RegistrarTaskStatus,
    /// Domains the task acts on. Known once the order is processed.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "crate::utils::datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Auto-renew state of a registered domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoRenewStatus {
    Enabled,
    Enabling,
    Disabled,
    Disabling,
    #[serde(other)]
    Unknown,
}

/// A registered domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,
    pub project_id: Uuid,
    pub status: String,
    pub auto_renew_status: AutoRenewStatus,
    #[serde(default, with = "crate::utils::datetime")]
    pub expired_at: Option<DateTime<Utc>>,
}

/// Domain registrar API bound to a shared client.
#[derive(Debug, Clone, Copy)]
pub struct DomainApi<'a> {
    client: &'a ScwClient,
}

impl<'a> DomainApi<'a> {
    pub fn new(client: &'a ScwClient) -> Self {
        Self { client }
    }

    pub async fn buy_domains(&self, req: &BuyDomainsRequest) -> Result<OrderResponse> {
        self.client
            .post(SERVICE, &format!("{BASE}/buy-domains"), req)
            .await
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<RegistrarTask> {
        self.client
            .get(SERVICE, &format!("{BASE}/tasks/{task_id}"))
            .await
    }

    pub async fn get_domain(&self, domain: &str) -> Result<Domain> {
        self.client
            .get(SERVICE, &format!("{BASE}/domains/{}", segment(domain)))
            .await
    }

    pub async fn set_auto_renew(&self, domain: &str, enabled: bool) -> Result<Domain> {
        let action = if enabled {
            "enable-auto-renew"
        } else {
            "disable-auto-renew"
        };
        let path = format!("{BASE}/domains/{}/{action}", segment(domain));
        self.client
            .post(SERVICE, &path, &serde_json::json!({}))
            .await
    }
}

impl ScwClient {
    /// Domain API view of this client.
    pub fn domain(&self) -> DomainApi<'_> {
        DomainApi::new(self)
    }
}
