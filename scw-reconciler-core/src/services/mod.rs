//! Reconciliation services

mod import_gateway;
mod reconciler;
mod task_tracker;

pub use reconciler::{ReadOutcome, Reconciler, UpdateOutcome, PROJECT_ATTRIBUTE};
pub use task_tracker::{ObjectOutcome, ObjectReport, TaskReport, TaskTracker};
