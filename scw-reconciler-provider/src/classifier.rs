//! Error classification
//!
//! Maps every [`VendorError`] onto a small [`ErrorClass`] taxonomy. The
//! reconciler decides drift vs failure from the class alone, never from
//! error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VendorError;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The target does not exist.
    NotFound,
    /// The caller may not access the target.
    Forbidden,
    /// A concurrent mutation is in flight.
    Conflict,
    /// A state guard did not hold.
    PreconditionFailed,
    /// The target or endpoint is permanently gone.
    Gone,
    /// Worth retrying later.
    Transient,
    /// Anything else.
    Fatal,
}

impl ErrorClass {
    /// Every class, in declaration order.
    pub const ALL: [ErrorClass; 7] = [
        ErrorClass::NotFound,
        ErrorClass::Forbidden,
        ErrorClass::Conflict,
        ErrorClass::PreconditionFailed,
        ErrorClass::Gone,
        ErrorClass::Transient,
        ErrorClass::Fatal,
    ];

    /// Stable snake-case name, used as the diagnostic kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::PreconditionFailed => "precondition_failed",
            Self::Gone => "gone",
            Self::Transient => "transient",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a vendor error. Total and pure.
pub fn classify(error: &VendorError) -> ErrorClass {
    match error {
        VendorError::ResourceNotFound { .. } => ErrorClass::NotFound,
        VendorError::PermissionsDenied { .. } => ErrorClass::Forbidden,
        VendorError::PreconditionFailed { .. } => ErrorClass::PreconditionFailed,
        VendorError::TransientState { .. }
        | VendorError::NetworkError { .. }
        | VendorError::Timeout { .. }
        | VendorError::RateLimited { .. } => ErrorClass::Transient,
        VendorError::Response { status, .. } => class_for_status(*status),
        VendorError::InvalidCredentials { .. }
        | VendorError::InvalidArgument { .. }
        | VendorError::QuotaExceeded { .. }
        | VendorError::ParseError { .. }
        | VendorError::SerializationError { .. }
        | VendorError::Unknown { .. } => ErrorClass::Fatal,
    }
}

/// Classify a raw HTTP status with no structured body.
pub fn class_for_status(status: u16) -> ErrorClass {
    match status {
        404 => ErrorClass::NotFound,
        403 => ErrorClass::Forbidden,
        409 => ErrorClass::Conflict,
        410 => ErrorClass::Gone,
        412 => ErrorClass::PreconditionFailed,
        429 | 500..=599 => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> VendorError {
        VendorError::Response {
            service: "test".into(),
            status,
            raw_message: String::new(),
        }
    }

    // ---- status table ----

    #[test]
    fn status_table() {
        assert_eq!(class_for_status(404), ErrorClass::NotFound);
        assert_eq!(class_for_status(403), ErrorClass::Forbidden);
        assert_eq!(class_for_status(409), ErrorClass::Conflict);
        assert_eq!(class_for_status(410), ErrorClass::Gone);
        assert_eq!(class_for_status(412), ErrorClass::PreconditionFailed);
        assert_eq!(class_for_status(429), ErrorClass::Transient);
        assert_eq!(class_for_status(500), ErrorClass::Transient);
        assert_eq!(class_for_status(503), ErrorClass::Transient);
        assert_eq!(class_for_status(400), ErrorClass::Fatal);
        assert_eq!(class_for_status(422), ErrorClass::Fatal);
        assert_eq!(class_for_status(302), ErrorClass::Fatal);
    }

    #[test]
    fn response_uses_status_table() {
        assert_eq!(classify(&response(404)), ErrorClass::NotFound);
        assert_eq!(classify(&response(502)), ErrorClass::Transient);
    }

    // ---- structured variants ----

    #[test]
    fn structured_variants() {
        let not_found = VendorError::ResourceNotFound {
            service: "vpn".into(),
            resource: "vpn_gateway".into(),
            resource_id: "x".into(),
            raw_message: None,
        };
        assert_eq!(classify(&not_found), ErrorClass::NotFound);

        let denied = VendorError::PermissionsDenied {
            service: "cockpit".into(),
            raw_message: None,
        };
        assert_eq!(classify(&denied), ErrorClass::Forbidden);

        let precondition = VendorError::PreconditionFailed {
            service: "domain".into(),
            precondition: None,
            raw_message: None,
        };
        assert_eq!(classify(&precondition), ErrorClass::PreconditionFailed);

        let busy = VendorError::TransientState {
            service: "vpn".into(),
            resource: "vpn_gateway".into(),
            resource_id: "x".into(),
            current_state: "configuring".into(),
        };
        assert_eq!(classify(&busy), ErrorClass::Transient);
    }

    #[test]
    fn transport_failures_are_transient() {
        let net = VendorError::NetworkError {
            service: "t".into(),
            detail: "reset".into(),
        };
        let timeout = VendorError::Timeout {
            service: "t".into(),
            detail: "slow".into(),
        };
        assert_eq!(classify(&net), ErrorClass::Transient);
        assert_eq!(classify(&timeout), ErrorClass::Transient);
    }

    #[test]
    fn local_failures_are_fatal() {
        let parse = VendorError::ParseError {
            service: "t".into(),
            detail: "eof".into(),
        };
        let creds = VendorError::InvalidCredentials {
            service: "t".into(),
            raw_message: None,
        };
        assert_eq!(classify(&parse), ErrorClass::Fatal);
        assert_eq!(classify(&creds), ErrorClass::Fatal);
    }

    #[test]
    fn class_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorClass::PreconditionFailed).unwrap();
        assert_eq!(json, "\"precondition_failed\"");
        for class in ErrorClass::ALL {
            assert_eq!(format!("\"{class}\""), serde_json::to_string(&class).unwrap());
        }
    }
}
