//! Reference resource adapters
//!
//! One adapter per vendor object family, each exercising a different ID
//! shape and lifecycle.

use std::sync::Arc;

use scw_reconciler_provider::ScwClient;

use crate::traits::AdapterRegistry;

pub mod cockpit_token;
pub mod datawarehouse_database;
pub mod domain_registration;
pub mod vpn_gateway;

pub use cockpit_token::CockpitTokenAdapter;
pub use datawarehouse_database::DatawarehouseDatabaseAdapter;
pub use domain_registration::{DomainRegistrationAdapter, RegistrarTaskSource};
pub use vpn_gateway::VpnGatewayAdapter;

/// Register every built-in adapter against a shared client.
pub async fn register_all(registry: &dyn AdapterRegistry, client: Arc<ScwClient>) {
    registry
        .register(Arc::new(CockpitTokenAdapter::new(client.clone())))
        .await;
    registry
        .register(Arc::new(DatawarehouseDatabaseAdapter::new(client.clone())))
        .await;
    registry
        .register(Arc::new(DomainRegistrationAdapter::new(client.clone())))
        .await;
    registry.register(Arc::new(VpnGatewayAdapter::new(client))).await;
    log::debug!("[registry] built-in adapters registered");
}
