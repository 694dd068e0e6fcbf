//! Unified error type definition

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::state::ResourceState;

// Re-export library error types
pub use scw_reconciler_provider::{ErrorClass, IdError, VendorError};
use scw_reconciler_provider::{classify, LocalityKind};

/// Core layer error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Vendor API failure (converted from the provider crate)
    #[error("{0}")]
    Vendor(#[from] VendorError),

    /// Malformed resource ID
    #[error("Invalid resource ID: {0}")]
    Id(#[from] IdError),

    /// Configuration value rejected before any vendor call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// No locality could be derived for a non-global resource
    #[error("[{resource_type}] no {kind} configured and no provider default")]
    MissingLocality {
        resource_type: String,
        kind: LocalityKind,
    },

    /// The waiter gave up
    #[error("[{resource}] timed out after {timeout:?} waiting for a terminal state")]
    WaitTimeout { resource: String, timeout: Duration },

    /// The operation context was cancelled
    #[error("[{resource}] operation cancelled")]
    Cancelled { resource: String },

    /// The resource reached an error state
    #[error("[{resource}] resource entered failed state '{status}'")]
    ResourceFailed { resource: String, status: String },

    /// A background task finished unsuccessfully
    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    /// A background task succeeded but some of its objects did not
    #[error("Task {task_id} left objects in a failed state: {failed}")]
    TaskObjectsFailed {
        task_id: String,
        failed: FailedObjects,
    },

    /// Import target does not exist
    #[error("[{resource_type}] cannot import '{id}': resource not found")]
    ImportNotFound { resource_type: String, id: String },

    /// No adapter registered under this name
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Projection between typed vendor objects and state failed
    #[error("Projection error: {0}")]
    Projection(String),
}

/// `(object name, reason)` pairs reported by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailedObjects(pub Vec<(String, String)>);

impl std::fmt::Display for FailedObjects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, reason)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} ({reason})")?;
        }
        Ok(())
    }
}

impl CoreError {
    /// Error class driving drift vs surfaced failure. Total over all variants.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Vendor(e) => classify(e),
            Self::WaitTimeout { .. } => ErrorClass::Transient,
            Self::ImportNotFound { .. } => ErrorClass::NotFound,
            Self::Id(_)
            | Self::Validation(_)
            | Self::Config(_)
            | Self::MissingLocality { .. }
            | Self::Cancelled { .. }
            | Self::ResourceFailed { .. }
            | Self::TaskFailed { .. }
            | Self::TaskObjectsFailed { .. }
            | Self::UnknownResourceType(_)
            | Self::Projection(_) => ErrorClass::Fatal,
        }
    }

    /// Whether it is expected behavior (user input, missing resource, etc.), used for log levels.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Id(_)
            | Self::Validation(_)
            | Self::Config(_)
            | Self::MissingLocality { .. }
            | Self::ImportNotFound { .. }
            | Self::UnknownResourceType(_)
            | Self::Cancelled { .. } => true,
            Self::Vendor(e) => e.is_expected(),
            _ => false,
        }
    }

    /// `(kind, message)` pair handed to the host.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let class = self.class();
        let mut message = self.to_string();
        if class == ErrorClass::Gone {
            message.push_str(" (the resource no longer exists upstream and must be recreated)");
        }
        Diagnostic {
            kind: class.as_str().to_string(),
            message,
        }
    }

    /// Log at `warn` or `error` depending on [`is_expected`](Self::is_expected).
    pub(crate) fn log(&self, context: &str) {
        if self.is_expected() {
            log::warn!("[{context}] {self}");
        } else {
            log::error!("[{context}] {self}");
        }
    }
}

/// Error surface handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Error class name (see [`ErrorClass::as_str`]).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// A failed apply step that may still have state to persist.
///
/// When the vendor mutation succeeded but a later step failed, `persisted`
/// carries the state the host must store so the next pass can reconcile.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ApplyError {
    #[source]
    pub error: CoreError,
    pub persisted: Option<ResourceState>,
}

impl ApplyError {
    pub fn new(error: CoreError, persisted: Option<ResourceState>) -> Self {
        Self { error, persisted }
    }
}

impl From<CoreError> for ApplyError {
    fn from(error: CoreError) -> Self {
        Self {
            error,
            persisted: None,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
