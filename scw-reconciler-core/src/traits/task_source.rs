//! Background task source abstract Trait

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;

/// Vendor task state, reduced to what the tracker acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// One observation of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    /// Names of the objects the task acts on. May be empty until the task completes.
    pub affected: Vec<String>,
    pub message: Option<String>,
}

/// Task Source Trait
///
/// Fetches the current state of a project-scoped background task.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Must fail with a NotFound-class error when the task does not exist.
    async fn fetch_task(&self, project_id: Uuid, task_id: &str) -> CoreResult<TaskSnapshot>;
}
