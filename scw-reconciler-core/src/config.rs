//! Provider configuration
//!
//! Read once at startup, then shared read-only by every operation.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use scw_reconciler_provider::{
    parse_canonical_uuid, ClientOptions, Region, ScwClient, Zone, DEFAULT_API_URL,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT,
};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

pub const ENV_API_URL: &str = "SCW_API_URL";
pub const ENV_SECRET_KEY: &str = "SCW_SECRET_KEY";
pub const ENV_DEFAULT_REGION: &str = "SCW_DEFAULT_REGION";
pub const ENV_DEFAULT_ZONE: &str = "SCW_DEFAULT_ZONE";
pub const ENV_DEFAULT_PROJECT_ID: &str = "SCW_DEFAULT_PROJECT_ID";
pub const ENV_RETRY_INTERVAL: &str = "SCW_RETRY_INTERVAL";

/// Process-wide retry interval override, frozen after the first write.
static GLOBAL_RETRY_INTERVAL: OnceLock<Duration> = OnceLock::new();

/// Set the process-wide retry interval override.
///
/// Returns `false` for a zero interval or if an override was already set;
/// the first value wins.
pub fn set_global_retry_interval(interval: Duration) -> bool {
    set_once(&GLOBAL_RETRY_INTERVAL, interval)
}

/// The process-wide retry interval override, if any.
pub fn global_retry_interval() -> Option<Duration> {
    GLOBAL_RETRY_INTERVAL.get().copied()
}

/// Resolve the retry interval for one waiter.
///
/// Precedence: injected override, then the global override, then the adapter default.
pub fn effective_retry_interval(injected: Option<Duration>, adapter_default: Duration) -> Duration {
    resolve_interval(injected, global_retry_interval(), adapter_default)
}

fn set_once(cell: &OnceLock<Duration>, interval: Duration) -> bool {
    if interval.is_zero() {
        log::warn!("[config] ignoring zero retry interval override");
        return false;
    }
    cell.set(interval).is_ok()
}

// Zero would turn every wait into a busy loop.
fn resolve_interval(
    injected: Option<Duration>,
    global: Option<Duration>,
    adapter_default: Duration,
) -> Duration {
    injected
        .filter(|d| !d.is_zero())
        .or(global)
        .unwrap_or(adapter_default)
}

/// Provider-level configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub secret_key: Option<String>,
    pub default_region: Option<Region>,
    pub default_zone: Option<Zone>,
    pub default_project_id: Option<Uuid>,
    /// Overrides every adapter's default retry interval when set.
    pub retry_interval: Option<Duration>,
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            secret_key: None,
            default_region: None,
            default_zone: None,
            default_project_id: None,
            retry_interval: None,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// Load from `SCW_*` environment variables.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_API_URL) {
            config.api_url = url;
        }
        config.secret_key = get(ENV_SECRET_KEY);
        config.default_region = get(ENV_DEFAULT_REGION)
            .map(|v| {
                v.parse::<Region>()
                    .map_err(|e| CoreError::Config(format!("{ENV_DEFAULT_REGION}: {e}")))
            })
            .transpose()?;
        config.default_zone = get(ENV_DEFAULT_ZONE)
            .map(|v| {
                v.parse::<Zone>()
                    .map_err(|e| CoreError::Config(format!("{ENV_DEFAULT_ZONE}: {e}")))
            })
            .transpose()?;
        config.default_project_id = get(ENV_DEFAULT_PROJECT_ID)
            .map(|v| {
                parse_canonical_uuid(&v).ok_or_else(|| {
                    CoreError::Config(format!("{ENV_DEFAULT_PROJECT_ID}: '{v}' is not a UUID"))
                })
            })
            .transpose()?;
        config.retry_interval = get(ENV_RETRY_INTERVAL)
            .map(|v| match v.trim().parse::<u64>() {
                Ok(0) => Err(CoreError::Config(format!(
                    "{ENV_RETRY_INTERVAL}: must be at least 1 second"
                ))),
                Ok(secs) => Ok(Duration::from_secs(secs)),
                Err(_) => Err(CoreError::Config(format!(
                    "{ENV_RETRY_INTERVAL}: '{v}' is not a number of seconds"
                ))),
            })
            .transpose()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> CoreResult<()> {
        if self.retry_interval.is_some_and(|d| d.is_zero()) {
            return Err(CoreError::Config("retry interval must be non-zero".to_string()));
        }
        if let (Some(region), Some(zone)) = (self.default_region, self.default_zone) {
            if zone.region() != region {
                return Err(CoreError::Config(format!(
                    "default zone {zone} is not in default region {region}"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    #[must_use]
    pub fn with_default_region(mut self, region: Region) -> Self {
        self.default_region = Some(region);
        self
    }

    #[must_use]
    pub fn with_default_zone(mut self, zone: Zone) -> Self {
        self.default_zone = Some(zone);
        self
    }

    #[must_use]
    pub fn with_default_project_id(mut self, project_id: Uuid) -> Self {
        self.default_project_id = Some(project_id);
        self
    }

    /// A zero interval clears the override.
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval).filter(|d| !d.is_zero());
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the shared vendor client. Requires a secret key.
    pub fn build_client(&self) -> CoreResult<Arc<ScwClient>> {
        let secret_key = self
            .secret_key
            .clone()
            .ok_or_else(|| CoreError::Config(format!("{ENV_SECRET_KEY} is not set")))?;
        let options = ClientOptions::new(secret_key)
            .with_api_url(self.api_url.clone())
            .with_request_timeout(self.request_timeout)
            .with_max_retries(self.max_retries);
        Ok(Arc::new(ScwClient::new(options)?))
    }
}
