//! Driven port for raw HTTP exchanges with the upstream platform.
//!
//! The domain owns the request and response shapes so the gateway and the
//! login protocol can be exercised against scripted transports. Adapters
//! only move bytes; status interpretation stays in the gateway.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::define_port_error;

/// HTTP methods used against the upstream platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload encodings.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// `application/json` body.
    Json(Value),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Extra headers; the adapter adds `User-Agent` and `Accept` itself.
    pub headers: Vec<(String, String)>,
    /// Payload.
    pub body: RequestBody,
}

impl UpstreamRequest {
    /// Start a request without headers or body.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a form-encoded body.
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Look up the first header value with `name`, ignoring ASCII case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw upstream response: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

impl UpstreamResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Return whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures before a complete response was received.
    pub enum TransportError {
        /// The request exceeded the configured timeout.
        Timeout { message: String } => UpstreamUnavailable: "upstream request timed out: {message}",
        /// The connection could not be established or was reset.
        Connect { message: String } => UpstreamUnavailable: "upstream connection failed: {message}",
        /// The response body could not be read.
        Body { message: String } => UpstreamUnavailable: "upstream body could not be read: {message}",
    }
}

/// Port for sending one request to the upstream platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Send `request` and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no complete response arrived.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}
