//! Site-to-site VPN gateways API (regional)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ScwClient;
use crate::error::Result;
use crate::locality::Region;

const SERVICE: &str = "vpn";

/// Gateway lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Configuring,
    Provisioning,
    Active,
    Deprovisioning,
    Failed,
    Locked,
    #[serde(other)]
    UnknownStatus,
}

impl GatewayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuring => "configuring",
            Self::Provisioning => "provisioning",
            Self::Active => "active",
            Self::Deprovisioning => "deprovisioning",
            Self::Failed => "failed",
            Self::Locked => "locked",
            Self::UnknownStatus => "unknown_status",
        }
    }
}

/// A VPN gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnGateway {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub status: GatewayStatus,
    pub gateway_type: String,
    pub private_network_id: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "crate::utils::datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::utils::datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    pub region: Region,
}

/// Body of a gateway creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGatewayRequest {
    pub name: String,
    pub project_id: Uuid,
    pub gateway_type: String,
    pub private_network_id: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of a gateway update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGatewayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// VPN API bound to a shared client.
#[derive(Debug, Clone, Copy)]
pub struct VpnApi<'a> {
    client: &'a ScwClient,
}

impl<'a> VpnApi<'a> {
    pub fn new(client: &'a ScwClient) -> Self {
        Self { client }
    }

    fn gateways_path(region: Region) -> String {
        format!("/s2s-vpn/v1alpha1/regions/{region}/vpn-gateways")
    }

    pub async fn create_gateway(
        &self,
        region: Region,
        req: &CreateGatewayRequest,
    ) -> Result<VpnGateway> {
        self.client
            .post(SERVICE, &Self::gateways_path(region), req)
            .await
    }

    pub async fn get_gateway(&self, region: Region, gateway_id: Uuid) -> Result<VpnGateway> {
        let path = format!("{}/{gateway_id}", Self::gateways_path(region));
        self.client.get(SERVICE, &path).await
    }

    pub async fn update_gateway(
        &self,
        region: Region,
        gateway_id: Uuid,
        req: &UpdateGatewayRequest,
    ) -> Result<VpnGateway> {
        let path = format!("{}/{gateway_id}", Self::gateways_path(region));
        self.client.patch(SERVICE, &path, req).await
    }

    pub async fn delete_gateway(&self, region: Region, gateway_id: Uuid) -> Result<()> {
        let path = format!("{}/{gateway_id}", Self::gateways_path(region));
        self.client.delete(SERVICE, &path).await
    }
}

impl ScwClient {
    /// Vpn API view of this client.
    pub fn vpn(&self) -> VpnApi<'_> {
        VpnApi::new(self)
    }
}
