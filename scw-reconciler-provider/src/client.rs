//! Authenticated vendor API client
//!
//! One [`ScwClient`] is shared by every operation. Its configuration is
//! fixed at construction; per-service APIs borrow it.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, VendorError};
use crate::http_client::{HttpUtils, RetryPolicy, create_http_client};

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.scaleway.com";
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of transport retries per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const AUTH_HEADER: &str = "X-Auth-Token";

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL, without trailing slash.
    pub api_url: String,
    /// Secret key sent as `X-Auth-Token`.
    pub secret_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Transport retries for transient failures.
    pub max_retries: u32,
}

impl ClientOptions {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            secret_key: secret_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Thread-safe vendor API client.
pub struct ScwClient {
    http: Client,
    api_url: String,
    secret_key: String,
    max_retries: u32,
}

impl std::fmt::Debug for ScwClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScwClient")
            .field("api_url", &self.api_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ScwClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        if options.secret_key.trim().is_empty() {
            return Err(VendorError::InvalidCredentials {
                service: "client".to_string(),
                raw_message: Some("secret key is empty".to_string()),
            });
        }
        Ok(Self {
            http: create_http_client(options.request_timeout)?,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            secret_key: options.secret_key,
            max_retries: options.max_retries,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Execute a request and return the raw success body.
    async fn send_raw(
        &self,
        service: &str,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String> {
        let url = format!("{}{path}", self.api_url);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(AUTH_HEADER, &self.secret_key);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let (_, text) = HttpUtils::execute_request_with_retry(
            request,
            service,
            method.as_str(),
            &url,
            self.max_retries,
            RetryPolicy::for_method(&method),
        )
        .await?;
        Ok(text)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        service: &str,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        let text = self.send_raw(service, method, path, body).await?;
        HttpUtils::parse_json(&text, service)
    }

    fn encode_body<B: Serialize>(service: &str, body: &B) -> Result<String> {
        serde_json::to_string(body).map_err(|e| VendorError::SerializationError {
            service: service.to_string(),
            detail: e.to_string(),
        })
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, service: &str, path: &str) -> Result<T> {
        self.send(service, Method::GET, path, None).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        service: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = Self::encode_body(service, body)?;
        self.send(service, Method::POST, path, Some(body)).await
    }

    /// PATCH a JSON body to `path` and decode the JSON response.
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        service: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = Self::encode_body(service, body)?;
        self.send(service, Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, service: &str, path: &str) -> Result<()> {
        self.send_raw(service, Method::DELETE, path, None)
            .await
            .map(|_| ())
    }
}
