//! Utility modules.

/// Timestamp serde helpers shared by wire models.
pub mod datetime;

/// Log sanitization utilities to prevent secret exposure.
pub mod log_sanitizer;
