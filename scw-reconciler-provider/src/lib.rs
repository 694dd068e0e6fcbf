//! # scw-reconciler-provider
//!
//! Vendor-facing layer of the reconciliation engine: the locality catalog,
//! composite resource IDs, the vendor error taxonomy and a retrying HTTP
//! client with typed per-service APIs.
//!
//! ## Feature Flags
//!
//! ### Service Selection
//!
//! - **`all-services`** *(default)*: enable every service below.
//! - **`cockpit`**: Cockpit tokens.
//! - **`datawarehouse`**: Datawarehouse databases.
//! - **`domain`**: Domain registrar orders, tasks and auto-renew.
//! - **`vpn`**: Site-to-site VPN gateways.
//!
//! ### TLS Backend
//!
//! - **`native-tls`** *(default)*: the platform's native TLS implementation.
//! - **`rustls`**: rustls, for cross-compilation targets.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scw_reconciler_provider::{ClientOptions, Region, ResourceId, IdShape, ScwClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ScwClient::new(ClientOptions::new("secret-key"))?;
//!
//! let id = ResourceId::decode("fr-par/11111111-2222-3333-4444-555555555555", IdShape::Regional)?;
//! let gateway = client
//!     .vpn()
//!     .get_gateway(Region::FrPar, id.uuid())
//!     .await?;
//! println!("{} is {}", gateway.name, gateway.status.as_str());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every API call returns [`Result<T, VendorError>`](VendorError). Use
//! [`classify`] to reduce an error to its [`ErrorClass`]; transient
//! transport failures (`NetworkError`, `Timeout`, `RateLimited`, HTTP
//! 502-504) are already retried with exponential backoff by the client.
//! POST requests are only resent when the vendor cannot have acted on them.

mod classifier;
mod client;
mod error;
mod http_client;
mod id;
mod locality;
pub mod services;
mod utils;

pub use classifier::{ErrorClass, class_for_status, classify};
pub use client::{
    ClientOptions, DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, ScwClient,
};
pub use error::{Result, VendorError};
pub use http_client::{RetryPolicy, backoff_delay, is_retryable};
pub use id::{
    IdError, IdShape, ResourceId, SEPARATOR, decode, encode, parse_canonical_uuid, strip_locality,
};
pub use locality::{Locality, LocalityKind, Region, UnknownLocality, Zone};

pub use utils::{datetime, log_sanitizer};
