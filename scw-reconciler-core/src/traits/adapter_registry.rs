//! Adapter registry abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::ResourceAdapter;

/// Adapter Registry Trait
///
/// Manages all registered adapters, indexed by resource type name.
/// Provides a default memory implementation of `InMemoryAdapterRegistry`.
#[async_trait]
pub trait AdapterRegistry: Send + Sync {
    /// Register an adapter under its `type_name()`, replacing any previous one.
    async fn register(&self, adapter: Arc<dyn ResourceAdapter>);

    /// Remove the adapter for `resource_type`.
    async fn unregister(&self, resource_type: &str);

    /// Get the adapter for `resource_type`.
    async fn get(&self, resource_type: &str) -> Option<Arc<dyn ResourceAdapter>>;

    /// List all registered resource types, sorted.
    async fn list_types(&self) -> Vec<String>;
}

/// In-memory adapter registry
#[derive(Clone)]
pub struct InMemoryAdapterRegistry {
    adapters: Arc<RwLock<HashMap<String, Arc<dyn ResourceAdapter>>>>,
}

impl InMemoryAdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdapterRegistry for InMemoryAdapterRegistry {
    async fn register(&self, adapter: Arc<dyn ResourceAdapter>) {
        let name = adapter.type_name().to_string();
        if self.adapters.write().await.insert(name.clone(), adapter).is_some() {
            log::warn!("[registry] replaced adapter for {name}");
        }
    }

    async fn unregister(&self, resource_type: &str) {
        self.adapters.write().await.remove(resource_type);
    }

    async fn get(&self, resource_type: &str) -> Option<Arc<dyn ResourceAdapter>> {
        self.adapters.read().await.get(resource_type).cloned()
    }

    async fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.adapters.read().await.keys().cloned().collect();
        types.sort();
        types
    }
}
