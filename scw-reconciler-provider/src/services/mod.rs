//! Per-service API clients
//!
//! Each service borrows the shared [`ScwClient`](crate::ScwClient) and
//! exposes typed calls for the handful of endpoints the reference resources
//! need. Services are feature-gated like the rest of the crate.

#[cfg(feature = "cockpit")]
pub mod cockpit;
#[cfg(feature = "datawarehouse")]
pub mod datawarehouse;
#[cfg(feature = "domain")]
pub mod domain;
#[cfg(feature = "vpn")]
pub mod vpn;

#[cfg(feature = "cockpit")]
pub use cockpit::CockpitApi;
#[cfg(feature = "datawarehouse")]
pub use datawarehouse::DatawarehouseApi;
#[cfg(feature = "domain")]
pub use domain::DomainApi;
#[cfg(feature = "vpn")]
pub use vpn::VpnApi;

/// Percent-encode a single path segment.
pub(crate) fn segment(s: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(s)
}
