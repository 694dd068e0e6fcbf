use serde::{Deserialize, Serialize};

/// Unified error type for all vendor API operations.
///
/// Each variant includes a `service` field identifying which API produced the error,
/// plus variant-specific context. All variants are serializable for structured error reporting.
///
/// The named variants mirror the structured error bodies returned by the vendor API
/// (`not_found`, `permissions_denied`, `precondition_failed`, `transient_state`, ...).
/// [`Response`](Self::Response) carries the raw HTTP status when the body has no
/// recognizable type.
///
/// # Retryable Errors
///
/// The following variants represent transient transport failures that may succeed on retry:
/// - [`NetworkError`](Self::NetworkError): network connectivity issues
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
/// - [`Response`](Self::Response) with a 502/503/504 status
///
/// The built-in HTTP client automatically retries these with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum VendorError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Service that produced the error.
        service: String,
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Service that produced the error.
        service: String,
        /// Error details.
        detail: String,
    },

    /// The API rate limit has been exceeded (HTTP 429).
    RateLimited {
        /// Service that produced the error.
        service: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The secret key is missing, invalid or expired (HTTP 401).
    InvalidCredentials {
        /// Service that produced the error.
        service: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The requested resource does not exist.
    ResourceNotFound {
        /// Service that produced the error.
        service: String,
        /// Resource type reported by the API (e.g. `"vpn_gateway"`).
        resource: String,
        /// ID or name of the missing resource.
        resource_id: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated principal lacks permission for the operation.
    PermissionsDenied {
        /// Service that produced the error.
        service: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// An optimistic-concurrency or state precondition did not hold.
    PreconditionFailed {
        /// Service that produced the error.
        service: String,
        /// Name of the failed precondition, if reported.
        precondition: Option<String>,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The resource is in a transient state and cannot be modified yet.
    TransientState {
        /// Service that produced the error.
        service: String,
        /// Resource type reported by the API.
        resource: String,
        /// ID of the busy resource.
        resource_id: String,
        /// State the resource is currently in.
        current_state: String,
    },

    /// A request argument is invalid.
    InvalidArgument {
        /// Service that produced the error.
        service: String,
        /// Name of the invalid argument.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The project's resource quota has been exceeded.
    ///
    /// Unlike [`RateLimited`](Self::RateLimited), this is not a transient condition.
    QuotaExceeded {
        /// Service that produced the error.
        service: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// A non-success HTTP response with no recognizable structured body.
    Response {
        /// Service that produced the error.
        service: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body or message.
        raw_message: String,
    },

    /// Failed to parse the API response.
    ParseError {
        /// Service that produced the error.
        service: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Service that produced the error.
        service: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// An unrecognized structured error from the API.
    Unknown {
        /// Service that produced the error.
        service: String,
        /// Raw error type from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl VendorError {
    /// Whether this is expected behavior (user input, missing resource, etc.), used for log levels.
    ///
    /// Use `warn` when this returns `true` and `error` otherwise.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::InvalidCredentials { .. }
            | Self::ResourceNotFound { .. }
            | Self::PermissionsDenied { .. }
            | Self::PreconditionFailed { .. }
            | Self::TransientState { .. }
            | Self::InvalidArgument { .. }
            | Self::QuotaExceeded { .. } => true,
            Self::Response { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Service that produced this error.
    pub fn service(&self) -> &str {
        match self {
            Self::NetworkError { service, .. }
            | Self::Timeout { service, .. }
            | Self::RateLimited { service, .. }
            | Self::InvalidCredentials { service, .. }
            | Self::ResourceNotFound { service, .. }
            | Self::PermissionsDenied { service, .. }
            | Self::PreconditionFailed { service, .. }
            | Self::TransientState { service, .. }
            | Self::InvalidArgument { service, .. }
            | Self::QuotaExceeded { service, .. }
            | Self::Response { service, .. }
            | Self::ParseError { service, .. }
            | Self::SerializationError { service, .. }
            | Self::Unknown { service, .. } => service,
        }
    }
}

impl std::fmt::Display for VendorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { service, detail } => {
                write!(f, "[{service}] Network error: {detail}")
            }
            Self::Timeout { service, detail } => {
                write!(f, "[{service}] Request timeout: {detail}")
            }
            Self::RateLimited {
                service,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{service}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{service}] Rate limited")
                }
            }
            Self::InvalidCredentials {
                service,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{service}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{service}] Invalid credentials")
                }
            }
            Self::ResourceNotFound {
                service,
                resource,
                resource_id,
                ..
            } => {
                write!(f, "[{service}] {resource} '{resource_id}' not found")
            }
            Self::PermissionsDenied {
                service,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{service}] Permissions denied: {msg}")
                } else {
                    write!(f, "[{service}] Permissions denied")
                }
            }
            Self::PreconditionFailed {
                service,
                precondition,
                raw_message,
            } => match (precondition, raw_message) {
                (Some(p), Some(msg)) => {
                    write!(f, "[{service}] Precondition '{p}' failed: {msg}")
                }
                (Some(p), None) => write!(f, "[{service}] Precondition '{p}' failed"),
                (None, Some(msg)) => write!(f, "[{service}] Precondition failed: {msg}"),
                (None, None) => write!(f, "[{service}] Precondition failed"),
            },
            Self::TransientState {
                service,
                resource,
                resource_id,
                current_state,
            } => {
                write!(
                    f,
                    "[{service}] {resource} '{resource_id}' is in transient state '{current_state}'"
                )
            }
            Self::InvalidArgument {
                service,
                param,
                detail,
            } => {
                write!(f, "[{service}] Invalid argument '{param}': {detail}")
            }
            Self::QuotaExceeded { service, .. } => {
                write!(f, "[{service}] Quota exceeded")
            }
            Self::Response {
                service,
                status,
                raw_message,
            } => {
                write!(f, "[{service}] HTTP {status}: {raw_message}")
            }
            Self::ParseError { service, detail } => {
                write!(f, "[{service}] Parse error: {detail}")
            }
            Self::SerializationError { service, detail } => {
                write!(f, "[{service}] Serialization error: {detail}")
            }
            Self::Unknown {
                service,
                raw_message,
                ..
            } => {
                write!(f, "[{service}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for VendorError {}

/// Convenience type alias for `Result<T, VendorError>`.
pub type Result<T> = std::result::Result<T, VendorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network_error() {
        let e = VendorError::NetworkError {
            service: "vpn".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[vpn] Network error: connection refused");
    }

    #[test]
    fn display_resource_not_found() {
        let e = VendorError::ResourceNotFound {
            service: "vpn".to_string(),
            resource: "vpn_gateway".to_string(),
            resource_id: "11111111-2222-3333-4444-555555555555".to_string(),
            raw_message: None,
        };
        assert_eq!(
            e.to_string(),
            "[vpn] vpn_gateway '11111111-2222-3333-4444-555555555555' not found"
        );
    }

    #[test]
    fn display_permissions_denied_with_message() {
        let e = VendorError::PermissionsDenied {
            service: "cockpit".to_string(),
            raw_message: Some("project deleted".to_string()),
        };
        assert_eq!(e.to_string(), "[cockpit] Permissions denied: project deleted");
    }

    #[test]
    fn display_precondition_variants() {
        let with_both = VendorError::PreconditionFailed {
            service: "domain".into(),
            precondition: Some("resource_still_in_use".into()),
            raw_message: Some("zone has records".into()),
        };
        assert_eq!(
            with_both.to_string(),
            "[domain] Precondition 'resource_still_in_use' failed: zone has records"
        );
        let bare = VendorError::PreconditionFailed {
            service: "domain".into(),
            precondition: None,
            raw_message: None,
        };
        assert_eq!(bare.to_string(), "[domain] Precondition failed");
    }

    #[test]
    fn display_transient_state() {
        let e = VendorError::TransientState {
            service: "datawarehouse".into(),
            resource: "deployment".into(),
            resource_id: "abc".into(),
            current_state: "provisioning".into(),
        };
        assert_eq!(
            e.to_string(),
            "[datawarehouse] deployment 'abc' is in transient state 'provisioning'"
        );
    }

    #[test]
    fn display_rate_limited_with_retry() {
        let e = VendorError::RateLimited {
            service: "vpn".to_string(),
            retry_after: Some(30),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[vpn] Rate limited (retry after 30s)");
    }

    #[test]
    fn display_response() {
        let e = VendorError::Response {
            service: "cockpit".into(),
            status: 409,
            raw_message: "conflict".into(),
        };
        assert_eq!(e.to_string(), "[cockpit] HTTP 409: conflict");
    }

    #[test]
    fn expected_variants() {
        assert!(
            VendorError::ResourceNotFound {
                service: "t".into(),
                resource: "r".into(),
                resource_id: "1".into(),
                raw_message: None,
            }
            .is_expected()
        );
        assert!(
            VendorError::Response {
                service: "t".into(),
                status: 409,
                raw_message: String::new(),
            }
            .is_expected()
        );
        assert!(
            !VendorError::Response {
                service: "t".into(),
                status: 500,
                raw_message: String::new(),
            }
            .is_expected()
        );
        assert!(
            !VendorError::ParseError {
                service: "t".into(),
                detail: "bad".into(),
            }
            .is_expected()
        );
    }

    #[test]
    fn serialize_json_tagged() {
        let e = VendorError::RateLimited {
            service: "vpn".to_string(),
            retry_after: Some(60),
            raw_message: Some("too many requests".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"RateLimited\""));
        assert!(json.contains("\"retry_after\":60"));
    }

    #[test]
    fn deserialize_json_round_trip() {
        let original = VendorError::TransientState {
            service: "vpn".into(),
            resource: "vpn_gateway".into(),
            resource_id: "x".into(),
            current_state: "configuring".into(),
        };
        let json = serde_json::to_string(&original).unwrap();
        let back: VendorError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), original.to_string());
    }

    #[test]
    fn service_accessor() {
        let e = VendorError::Unknown {
            service: "domain".into(),
            raw_code: Some("weird".into()),
            raw_message: "oops".into(),
        };
        assert_eq!(e.service(), "domain");
    }
}
