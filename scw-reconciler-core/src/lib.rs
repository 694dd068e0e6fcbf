//! Reconciliation engine for regional cloud resources
//!
//! Drives declarative state through vendor APIs:
//! - Locality resolution and composite IDs
//! - Readiness and deletion waits with cancellation
//! - State projection between configuration and vendor objects
//! - Import and background-task tracking
//!
//! Vendor access goes through `scw-reconciler-provider`; resource types plug
//! in through [`traits::ResourceAdapter`].

pub mod config;
pub mod error;
pub mod projector;
pub mod resolver;
pub mod resources;
pub mod services;
pub mod state;
pub mod traits;
pub mod waiter;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::ProviderConfig;
pub use error::{ApplyError, CoreError, CoreResult, Diagnostic};
pub use services::{ReadOutcome, Reconciler, UpdateOutcome};
pub use state::{Attributes, ResourceState};
pub use traits::{AdapterRegistry, InMemoryAdapterRegistry, ResourceAdapter, TaskSource};
