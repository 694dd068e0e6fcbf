//! Locality resolution
//!
//! Order: explicit configuration, then a locality embedded in an ID, then the
//! provider default. Implicit sources never override explicit configuration.

use scw_reconciler_provider::{parse_canonical_uuid, Locality, LocalityKind, Region, Zone};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::{CoreError, CoreResult};

/// Derives the effective region, zone and project of an operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalityResolver {
    default_region: Option<Region>,
    default_zone: Option<Zone>,
    default_project: Option<Uuid>,
}

impl LocalityResolver {
    pub fn new(
        default_region: Option<Region>,
        default_zone: Option<Zone>,
        default_project: Option<Uuid>,
    ) -> Self {
        Self {
            default_region,
            default_zone,
            default_project,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.default_region,
            config.default_zone,
            config.default_project_id,
        )
    }

    /// Provider-level default for `kind`.
    ///
    /// With only a default zone configured, its region serves as the default region.
    pub fn provider_default(&self, kind: LocalityKind) -> Option<Locality> {
        match kind {
            LocalityKind::Region => self
                .default_region
                .or_else(|| self.default_zone.map(Zone::region))
                .map(Locality::Region),
            LocalityKind::Zone => self.default_zone.map(Locality::Zone),
            LocalityKind::Global => Some(Locality::Global),
        }
    }

    /// Resolve the locality of a resource of kind `kind`.
    ///
    /// * `configured` - the region/zone attribute from configuration, if set
    /// * `from_id` - a locality carried by the resource's own or a parent's ID
    pub fn resolve(
        &self,
        resource_type: &str,
        kind: LocalityKind,
        configured: Option<&str>,
        from_id: Option<Locality>,
    ) -> CoreResult<Locality> {
        if kind == LocalityKind::Global {
            return Ok(Locality::Global);
        }

        if let Some(raw) = configured {
            return Locality::parse_as(kind, raw)
                .map_err(|e| CoreError::Validation(format!("[{resource_type}] {kind}: {e}")));
        }

        let embedded = from_id.and_then(|locality| match (kind, locality) {
            (LocalityKind::Region, Locality::Zone(zone)) => Some(Locality::Region(zone.region())),
            (_, locality) if locality.kind() == kind => Some(locality),
            _ => None,
        });

        embedded
            .or_else(|| self.provider_default(kind))
            .ok_or_else(|| CoreError::MissingLocality {
                resource_type: resource_type.to_string(),
                kind,
            })
    }

    /// Resolve the owning project: configuration, then ID, then the provider default.
    pub fn resolve_project(
        &self,
        configured: Option<&str>,
        from_id: Option<Uuid>,
    ) -> CoreResult<Option<Uuid>> {
        if let Some(raw) = configured {
            return parse_canonical_uuid(raw)
                .map(Some)
                .ok_or_else(|| CoreError::Validation(format!("project_id: '{raw}' is not a UUID")));
        }
        Ok(from_id.or(self.default_project))
    }
}
