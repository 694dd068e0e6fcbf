//! Import of externally created resources

use scw_reconciler_provider::ResourceId;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult, ErrorClass};
use crate::projector::finalize;
use crate::services::Reconciler;
use crate::state::ResourceState;
use crate::traits::Operation;

impl Reconciler {
    /// Import a resource by a user-supplied ID.
    ///
    /// A bare UUID is accepted for regional and zonal resources and is
    /// qualified with the provider default locality. Unlike a routine Read,
    /// NotFound here is an error.
    pub async fn import(
        &self,
        resource_type: &str,
        raw_id: &str,
        cancel: &CancellationToken,
    ) -> CoreResult<ResourceState> {
        let adapter = self.adapter(resource_type).await?;
        let adapter = adapter.as_ref();
        let kind = adapter.locality_kind();
        let raw_id = raw_id.trim();

        let id = ResourceId::decode_with_fallback(
            raw_id,
            adapter.id_shape(),
            self.resolver().provider_default(kind),
        )
        .map_err(|e| {
            let e = CoreError::from(e);
            e.log(resource_type);
            e
        })?;
        if id.to_string() != raw_id {
            log::info!("[{resource_type}] importing '{raw_id}' as {id}");
        } else {
            log::info!("[{resource_type}] importing {id}");
        }

        let (locality, project_id) =
            self.scope(adapter, &id, &ResourceState::with_id(id.to_string()))?;
        let ctx = self.context(adapter, Operation::Read, locality, project_id, cancel);

        let seeded = ctx
            .waiter
            .run(resource_type, adapter.import_state(&ctx, &id))
            .await?;

        match ctx.waiter.run(resource_type, adapter.read(&ctx, &id)).await {
            Ok(fresh) => finalize(
                resource_type,
                adapter.schema(),
                kind,
                &id,
                fresh,
                Some(&seeded),
            ),
            Err(e) if e.class() == ErrorClass::NotFound => {
                let e = CoreError::ImportNotFound {
                    resource_type: resource_type.to_string(),
                    id: raw_id.to_string(),
                };
                e.log(resource_type);
                Err(e)
            }
            Err(e) => {
                e.log(resource_type);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scw_reconciler_provider::Region;

    use super::*;
    use crate::config::ProviderConfig;
    use crate::test_utils::{ready, MockAdapter, MOCK_ID};
    use crate::traits::{AdapterRegistry, InMemoryAdapterRegistry};

    const TYPE: &str = "mock_thing";

    async fn setup(config: &ProviderConfig) -> (Reconciler, Arc<MockAdapter>) {
        let adapter = Arc::new(MockAdapter::regional(TYPE));
        let registry = Arc::new(InMemoryAdapterRegistry::new());
        registry.register(adapter.clone()).await;
        (Reconciler::new(registry, config), adapter)
    }

    fn with_default() -> ProviderConfig {
        ProviderConfig::default().with_default_region(Region::FrPar)
    }

    #[tokio::test]
    async fn bare_uuid_gets_default_region() {
        let (rec, mock) = setup(&with_default()).await;
        mock.set_steady_read(ready("a")).await;

        let state = rec
            .import(TYPE, MOCK_ID, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(state.id.as_deref(), Some(format!("fr-par/{MOCK_ID}").as_str()));
        assert_eq!(state.get_str("region"), Some("fr-par"));
        assert_eq!(state.get_str("name"), Some("a"));
    }

    #[tokio::test]
    async fn qualified_id_keeps_its_region() {
        let (rec, mock) = setup(&with_default()).await;
        mock.set_steady_read(ready("a")).await;

        let state = rec
            .import(TYPE, &format!("pl-waw/{MOCK_ID}"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(state.get_str("region"), Some("pl-waw"));
    }

    #[tokio::test]
    async fn not_found_fails_import() {
        let (rec, _mock) = setup(&with_default()).await;
        let err = rec
            .import(TYPE, MOCK_ID, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ImportNotFound { .. }));
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[tokio::test]
    async fn bare_uuid_without_default_is_rejected() {
        let (rec, mock) = setup(&ProviderConfig::default()).await;
        let err = rec
            .import(TYPE, MOCK_ID, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Id(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_is_rejected() {
        let (rec, _mock) = setup(&with_default()).await;
        let err = rec
            .import(TYPE, "fr-par/not-a-uuid", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Id(_)));
    }
}
