//! Composite-task tracking
//!
//! Vendor operations that enqueue a background task are addressed by a
//! `project/task` composite ID. The objects a task produced are only known
//! once it completes; each is then read on its own.

use std::future::Future;
use std::sync::Arc;

use scw_reconciler_provider::ResourceId;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ErrorClass, FailedObjects};
use crate::traits::{TaskSnapshot, TaskSource, TaskStatus};
use crate::waiter::{WaitMode, Waiter};

/// Result of reading one object produced by a task.
#[derive(Debug)]
pub enum ObjectOutcome<T> {
    Present(T),
    /// The object read returned NotFound.
    Missing,
    Failed { class: ErrorClass, message: String },
}

#[derive(Debug)]
pub struct ObjectReport<T> {
    pub name: String,
    pub outcome: ObjectOutcome<T>,
}

/// Terminal task plus the outcome of every affected object, in task order.
#[derive(Debug)]
pub struct TaskReport<T> {
    pub task: TaskSnapshot,
    pub objects: Vec<ObjectReport<T>>,
}

impl<T> TaskReport<T> {
    /// Objects whose read failed with anything but NotFound.
    pub fn failures(&self) -> FailedObjects {
        FailedObjects(
            self.objects
                .iter()
                .filter_map(|o| match &o.outcome {
                    ObjectOutcome::Failed { message, .. } => {
                        Some((o.name.clone(), message.clone()))
                    }
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .filter(|o| matches!(o.outcome, ObjectOutcome::Missing))
            .map(|o| o.name.as_str())
    }

    pub fn present(&self) -> impl Iterator<Item = (&str, &T)> {
        self.objects.iter().filter_map(|o| match &o.outcome {
            ObjectOutcome::Present(value) => Some((o.name.as_str(), value)),
            _ => None,
        })
    }

    /// Fail with [`CoreError::TaskObjectsFailed`] when any object failed.
    pub fn into_result(self) -> CoreResult<Self> {
        let failed = self.failures();
        if failed.0.is_empty() {
            Ok(self)
        } else {
            Err(CoreError::TaskObjectsFailed {
                task_id: self.task.id,
                failed,
            })
        }
    }
}

/// Tracks background tasks through a [`TaskSource`].
#[derive(Clone)]
pub struct TaskTracker {
    source: Arc<dyn TaskSource>,
}

impl TaskTracker {
    #[must_use]
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self { source }
    }

    /// `project/task` composite ID.
    pub fn composite_id(project_id: Uuid, task_id: &str) -> ResourceId {
        ResourceId::ProjectScoped {
            project: project_id,
            sub_id: task_id.to_string(),
        }
    }

    /// Single observation without waiting.
    pub async fn fetch(&self, project_id: Uuid, task_id: &str) -> CoreResult<TaskSnapshot> {
        self.source.fetch_task(project_id, task_id).await
    }

    /// Poll until the task is Succeeded or Failed.
    ///
    /// A Failed task is reported as [`CoreError::TaskFailed`].
    pub async fn wait(
        &self,
        waiter: &Waiter,
        project_id: Uuid,
        task_id: &str,
    ) -> CoreResult<TaskSnapshot> {
        let resource = format!("task {task_id}");
        let snapshot = waiter
            .wait_for(
                &resource,
                WaitMode::Ready,
                || self.source.fetch_task(project_id, task_id),
                |task: &TaskSnapshot| task.status.is_terminal(),
            )
            .await?
            .ok_or_else(|| CoreError::TaskFailed {
                task_id: task_id.to_string(),
                message: "task disappeared while waiting".to_string(),
            })?;

        if snapshot.status == TaskStatus::Failed {
            let message = snapshot
                .message
                .clone()
                .unwrap_or_else(|| "no message from vendor".to_string());
            log::warn!("[task] {task_id} failed: {message}");
            return Err(CoreError::TaskFailed {
                task_id: task_id.to_string(),
                message,
            });
        }

        log::debug!(
            "[task] {task_id} succeeded, {} affected object(s)",
            snapshot.affected.len()
        );
        Ok(snapshot)
    }

    /// Wait for the task, then read every affected object concurrently.
    ///
    /// Per-object failures are recorded in the report, never raised here.
    pub async fn resolve<T, F, Fut>(
        &self,
        waiter: &Waiter,
        project_id: Uuid,
        task_id: &str,
        read_object: F,
    ) -> CoreResult<TaskReport<T>>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let task = self.wait(waiter, project_id, task_id).await?;

        let reads = task.affected.iter().map(|name| {
            let read = read_object(name.clone());
            async move { (name.clone(), read.await) }
        });
        let results = futures::future::join_all(reads).await;

        let objects = results
            .into_iter()
            .map(|(name, result)| {
                let outcome = match result {
                    Ok(value) => ObjectOutcome::Present(value),
                    Err(e) if e.class() == ErrorClass::NotFound => ObjectOutcome::Missing,
                    Err(e) => {
                        e.log(&name);
                        ObjectOutcome::Failed {
                            class: e.class(),
                            message: e.to_string(),
                        }
                    }
                };
                ObjectReport { name, outcome }
            })
            .collect();

        Ok(TaskReport { task, objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VendorError;
    use crate::test_utils::{snapshot, MockTaskSource};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const PROJECT: Uuid = Uuid::from_u128(0xbbbb);

    fn waiter() -> Waiter {
        Waiter::new(
            Duration::from_secs(60),
            Duration::from_secs(1),
            CancellationToken::new(),
        )
    }

    #[test]
    fn composite_id_encoding() {
        let id = TaskTracker::composite_id(PROJECT, "aaaa");
        assert_eq!(id.to_string(), format!("{PROJECT}/aaaa"));
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_reads_every_affected_object() {
        let source = Arc::new(MockTaskSource::new(vec![
            snapshot(TaskStatus::Pending, &[]),
            snapshot(TaskStatus::Running, &[]),
            snapshot(TaskStatus::Succeeded, &["example.com", "example.net"]),
        ]));
        let tracker = TaskTracker::new(source.clone());

        let report = tracker
            .resolve(&waiter(), PROJECT, "aaaa", |name| async move {
                Ok::<_, CoreError>(name.len())
            })
            .await
            .unwrap();

        assert_eq!(source.fetches().await, 3);
        let present: Vec<_> = report.present().collect();
        assert_eq!(present, vec![("example.com", &11), ("example.net", &11)]);
        assert!(report.failures().0.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_task_is_an_error() {
        let mut failed = snapshot(TaskStatus::Failed, &[]);
        failed.message = Some("payment refused".into());
        let tracker = TaskTracker::new(Arc::new(MockTaskSource::new(vec![failed])));
        let err = tracker.wait(&waiter(), PROJECT, "aaaa").await.unwrap_err();
        assert!(err.to_string().contains("payment refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_success_reports_per_object_failures() {
        let tracker = TaskTracker::new(Arc::new(MockTaskSource::new(vec![snapshot(
            TaskStatus::Succeeded,
            &["ok.com", "gone.com", "broken.com"],
        )])));

        let report = tracker
            .resolve(&waiter(), PROJECT, "aaaa", |name| async move {
                match name.as_str() {
                    "ok.com" => Ok(()),
                    "gone.com" => Err(CoreError::Vendor(VendorError::Response {
                        service: "domain".into(),
                        status: 404,
                        raw_message: String::new(),
                    })),
                    _ => Err(CoreError::ResourceFailed {
                        resource: name,
                        status: "create_error".into(),
                    }),
                }
            })
            .await
            .unwrap();

        assert_eq!(report.missing().collect::<Vec<_>>(), vec!["gone.com"]);
        let failures = report.failures();
        assert_eq!(failures.0.len(), 1);
        assert_eq!(failures.0[0].0, "broken.com");

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, CoreError::TaskObjectsFailed { .. }));
    }
}
