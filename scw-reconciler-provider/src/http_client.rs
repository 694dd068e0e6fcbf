//! Generic HTTP client tools
//!
//! Shared request execution for every service client: sending, logging,
//! mapping non-success responses onto [`VendorError`] variants, and retrying
//! transient transport failures.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::VendorError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Default connect timeout (seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Upper bound honored for a server-provided `Retry-After`
const MAX_RETRY_AFTER_SECS: u64 = 30;
/// Upper bound for exponential backoff (milliseconds)
const MAX_BACKOFF_MS: u64 = 10_000;

/// Create the shared HTTP client with connect and request timeouts.
pub fn create_http_client(request_timeout: Duration) -> Result<Client, VendorError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .build()
        .map_err(|e| VendorError::NetworkError {
            service: "client".to_string(),
            detail: format!("Failed to build HTTP client: {e}"),
        })
}

/// Which failures may be sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Every transient failure is retried.
    Idempotent,
    /// Retried only when the vendor cannot have acted on the request:
    /// rate limited, or the connection was never established.
    NotIdempotent,
}

impl RetryPolicy {
    /// POST creates and orders; everything else may be replayed.
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::POST {
            Self::NotIdempotent
        } else {
            Self::Idempotent
        }
    }
}

/// A failed attempt, remembering whether the request left the client.
struct Failure {
    error: VendorError,
    unsent: bool,
}

impl Failure {
    fn sent(error: VendorError) -> Self {
        Self {
            error,
            unsent: false,
        }
    }

    fn may_retry(&self, policy: RetryPolicy) -> bool {
        if !is_retryable(&self.error) {
            return false;
        }
        match policy {
            RetryPolicy::Idempotent => true,
            RetryPolicy::NotIdempotent => {
                self.unsent || matches!(self.error, VendorError::RateLimited { .. })
            }
        }
    }
}

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns the success response text.
    ///
    /// # Arguments
    /// * `request_builder` - configured request (URL, headers, body)
    /// * `service` - service name, for logging and error context
    /// * `method_name` - HTTP method, for logging
    /// * `url` - request URL, for logging
    ///
    /// # Returns
    /// * `Ok((status_code, response_text))` for a 2xx response
    /// * `Err(VendorError)` for transport failures and non-2xx responses
    pub async fn execute_request(
        request_builder: RequestBuilder,
        service: &str,
        method_name: &str,
        url: &str,
    ) -> Result<(u16, String), VendorError> {
        Self::attempt(request_builder, service, method_name, url)
            .await
            .map_err(|f| f.error)
    }

    async fn attempt(
        request_builder: RequestBuilder,
        service: &str,
        method_name: &str,
        url: &str,
    ) -> Result<(u16, String), Failure> {
        log::debug!("[{service}] {method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            let error = if e.is_timeout() {
                VendorError::Timeout {
                    service: service.to_string(),
                    detail: e.to_string(),
                }
            } else {
                VendorError::NetworkError {
                    service: service.to_string(),
                    detail: e.to_string(),
                }
            };
            Failure {
                error,
                unsent: e.is_connect(),
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{service}] Response Status: {status_code}");

        // Read before the body consumes the response
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let response_text = response.text().await.map_err(|e| {
            Failure::sent(VendorError::NetworkError {
                service: service.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })
        })?;

        log::debug!(
            "[{service}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        if status_code == 429 {
            log::warn!("[{service}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(Failure::sent(VendorError::RateLimited {
                service: service.to_string(),
                retry_after,
                raw_message: Some(response_text),
            }));
        }

        if !(200..300).contains(&status_code) {
            return Err(Failure::sent(map_error_response(
                service,
                status_code,
                &response_text,
            )));
        }

        Ok((status_code, response_text))
    }

    /// Parse JSON response
    pub fn parse_json<T>(response_text: &str, service: &str) -> Result<T, VendorError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{service}] JSON parse failed: {e}");
            log::error!(
                "[{service}] Raw response: {}",
                truncate_for_log(response_text)
            );
            VendorError::ParseError {
                service: service.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Performs an HTTP request with retries.
    ///
    /// # Retry strategy
    /// - Only transient transport failures are retried (see [`is_retryable`])
    /// - [`RetryPolicy::NotIdempotent`] requests are only resent when they
    ///   were rate limited or never reached the server
    /// - Exponential backoff: 100ms, 200ms, 400ms, ... (maximum 10 seconds)
    /// - `Retry-After` on HTTP 429 is honored up to 30 seconds
    /// - Structured API errors (not found, denied, ...) are returned immediately
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        service: &str,
        method_name: &str,
        url: &str,
        max_retries: u32,
        policy: RetryPolicy,
    ) -> Result<(u16, String), VendorError> {
        if max_retries == 0 {
            return Self::execute_request(request_builder, service, method_name, url).await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            // RequestBuilder is single-use
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{service}] Cannot clone request, disabling retry");
                return Self::execute_request(request_builder, service, method_name, url).await;
            };

            match Self::attempt(req, service, method_name, url).await {
                Ok(resp) => return Ok(resp),
                Err(f) if attempt < max_retries && f.may_retry(policy) => {
                    let delay = retry_delay(&f.error, attempt);
                    log::warn!(
                        "[{}] Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                        service,
                        attempt + 1,
                        max_retries,
                        delay.as_secs_f32(),
                        f.error
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(f.error);
                }
                Err(f) => {
                    if is_retryable(&f.error) && policy == RetryPolicy::NotIdempotent {
                        log::warn!(
                            "[{service}] {method_name} {url} may have been applied, not resending: {}",
                            f.error
                        );
                    }
                    return Err(f.error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| VendorError::NetworkError {
            service: service.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}

// ============ Error body mapping ============

/// Structured error body returned by the vendor API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
    resource: Option<String>,
    resource_id: Option<String>,
    precondition: Option<String>,
    help_message: Option<String>,
    current_state: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    argument_name: Option<String>,
    reason: Option<String>,
    help_message: Option<String>,
}

/// Map a non-success response to the most specific [`VendorError`] variant.
///
/// Bodies without a recognizable `type` keep their raw status so the
/// classifier can fall back to the status table.
pub(crate) fn map_error_response(service: &str, status: u16, body: &str) -> VendorError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.help_message.clone());
    let unknown = || "<unknown>".to_string();

    match parsed.kind.as_deref() {
        Some("not_found") => VendorError::ResourceNotFound {
            service: service.to_string(),
            resource: parsed.resource.unwrap_or_else(unknown),
            resource_id: parsed.resource_id.unwrap_or_else(unknown),
            raw_message: message,
        },
        Some("permissions_denied") => VendorError::PermissionsDenied {
            service: service.to_string(),
            raw_message: message,
        },
        Some("precondition_failed") => VendorError::PreconditionFailed {
            service: service.to_string(),
            precondition: parsed.precondition,
            raw_message: message,
        },
        Some("transient_state") => VendorError::TransientState {
            service: service.to_string(),
            resource: parsed.resource.unwrap_or_else(unknown),
            resource_id: parsed.resource_id.unwrap_or_else(unknown),
            current_state: parsed.current_state.unwrap_or_else(unknown),
        },
        Some("denied_authentication" | "authentication_error") => {
            VendorError::InvalidCredentials {
                service: service.to_string(),
                raw_message: message,
            }
        }
        Some("invalid_arguments") => {
            let first = parsed.details.into_iter().next();
            let (param, detail) = match first {
                Some(d) => (
                    d.argument_name.unwrap_or_else(unknown),
                    d.reason
                        .or(d.help_message)
                        .or(message)
                        .unwrap_or_default(),
                ),
                None => (unknown(), message.unwrap_or_default()),
            };
            VendorError::InvalidArgument {
                service: service.to_string(),
                param,
                detail,
            }
        }
        Some("quotas_exceeded") => VendorError::QuotaExceeded {
            service: service.to_string(),
            raw_message: message,
        },
        Some(kind) if matches!(status, 403 | 404 | 409 | 410 | 412 | 500..=599) => {
            log::debug!("[{service}] Unrecognized error type '{kind}' on HTTP {status}");
            VendorError::Response {
                service: service.to_string(),
                status,
                raw_message: message.unwrap_or_else(|| body.to_string()),
            }
        }
        Some(kind) => VendorError::Unknown {
            service: service.to_string(),
            raw_code: Some(kind.to_string()),
            raw_message: message.unwrap_or_else(|| body.to_string()),
        },
        None => VendorError::Response {
            service: service.to_string(),
            status,
            raw_message: message.unwrap_or_else(|| body.to_string()),
        },
    }
}

// ============ Retry policy ============

/// Whether the error is a transient transport failure worth retrying.
///
/// Structured API errors are never retried here; state-level waiting is
/// the job of the waiter, not the transport.
pub fn is_retryable(error: &VendorError) -> bool {
    match error {
        VendorError::NetworkError { .. }
        | VendorError::Timeout { .. }
        | VendorError::RateLimited { .. } => true,
        VendorError::Response { status, .. } => matches!(status, 502..=504),
        _ => false,
    }
}

/// Delay before the next attempt.
fn retry_delay(error: &VendorError, attempt: u32) -> Duration {
    if let VendorError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS))
    } else {
        backoff_delay(attempt)
    }
}

/// Exponential backoff: 100ms, 200ms, 400ms, 800ms, 1.6s, ... capped at 10s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
