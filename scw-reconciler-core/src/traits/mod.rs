//! Adapter and task-source abstraction trait definitions

mod adapter_registry;
mod resource_adapter;
mod task_source;

pub use adapter_registry::{AdapterRegistry, InMemoryAdapterRegistry};
pub use resource_adapter::{
    Operation, OperationContext, OperationStatus, ResourceAdapter, Timeouts,
};
pub use task_source::{TaskSnapshot, TaskSource, TaskStatus};
