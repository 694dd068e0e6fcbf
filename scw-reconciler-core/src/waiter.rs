//! Long-running operation waiter
//!
//! Polls a caller-supplied fetch until the observed object is terminal.
//! Polling is sequential and stateless between invocations; the only
//! suspension points are the fetch itself and the sleep between fetches,
//! both of which race the cancellation token.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult, ErrorClass};

/// Default interval between polls.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// What the wait is observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Waiting for a resource to settle. NotFound ends the wait with an error.
    Ready,
    /// Waiting for a resource to disappear. NotFound ends the wait successfully.
    Deletion {
        /// Also treat Forbidden as "gone" (tenancy deleted with the resource).
        forbidden_is_gone: bool,
    },
}

/// Bounded, cancellable poller.
#[derive(Debug, Clone)]
pub struct Waiter {
    timeout: Duration,
    retry_interval: Duration,
    cancel: CancellationToken,
}

impl Waiter {
    pub fn new(timeout: Duration, retry_interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            timeout,
            retry_interval,
            cancel,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Same waiter with another timeout (e.g. for a different operation phase).
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Race `future` against cancellation.
    pub async fn run<T, Fut>(&self, resource: &str, future: Fut) -> CoreResult<T>
    where
        Fut: Future<Output = CoreResult<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(cancelled(resource)),
            result = future => result,
        }
    }

    /// Poll `fetch` until `is_terminal` accepts the observed object.
    ///
    /// Returns `Ok(None)` when a deletion wait observes the object gone.
    ///
    /// * Transient and Conflict errors keep polling.
    /// * NotFound ends a deletion wait successfully (Forbidden too when allowed).
    /// * Any other error ends the wait.
    /// * Exceeding the timeout yields [`CoreError::WaitTimeout`], classified Transient.
    pub async fn wait_for<T, F, Fut, P>(
        &self,
        resource: &str,
        mode: WaitMode,
        mut fetch: F,
        is_terminal: P,
    ) -> CoreResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
        P: Fn(&T) -> bool,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let polled = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(cancelled(resource)),
                () = tokio::time::sleep_until(deadline) => None,
                result = fetch() => Some(result),
            };
            let Some(polled) = polled else {
                return Err(self.timed_out(resource, attempt));
            };

            match polled {
                Ok(observed) if is_terminal(&observed) => {
                    log::debug!("[{resource}] terminal state reached after {attempt} poll(s)");
                    return Ok(Some(observed));
                }
                Ok(_) => {
                    log::debug!("[{resource}] not terminal yet (poll {attempt})");
                }
                Err(e @ CoreError::Cancelled { .. }) => return Err(e),
                Err(e) => match (mode, e.class()) {
                    (WaitMode::Deletion { .. }, ErrorClass::NotFound)
                    | (
                        WaitMode::Deletion {
                            forbidden_is_gone: true,
                        },
                        ErrorClass::Forbidden,
                    ) => {
                        log::debug!("[{resource}] gone ({})", e.class());
                        return Ok(None);
                    }
                    (_, ErrorClass::Transient | ErrorClass::Conflict) => {
                        log::debug!("[{resource}] retrying after {}: {e}", e.class());
                    }
                    _ => return Err(e),
                },
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(resource, attempt));
            }

            // The last sleep is cut short so the wait never overruns its deadline.
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(cancelled(resource)),
                () = tokio::time::sleep(self.retry_interval.min(deadline - now)) => {}
            }
        }
    }

    fn timed_out(&self, resource: &str, attempt: u32) -> CoreError {
        log::warn!(
            "[{resource}] gave up after {:?} ({attempt} poll(s))",
            self.timeout
        );
        CoreError::WaitTimeout {
            resource: resource.to_string(),
            timeout: self.timeout,
        }
    }
}

fn cancelled(resource: &str) -> CoreError {
    CoreError::Cancelled {
        resource: resource.to_string(),
    }
}
