//! Gateway error taxonomy.
//!
//! Every failure surfaced by the gateway carries one [`ErrorKind`] from a
//! closed set. Callers render `Authentication`/`Authorization` as
//! "please re-authenticate" and everything else as an operation failure.
//! The optional status code and raw upstream body exist for diagnostics only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials or session token were rejected, missing, or expired.
    Authentication,
    /// Authenticated but not permitted to perform the action.
    Authorization,
    /// The resource does not exist upstream.
    NotFound,
    /// The payload sent by the caller is structurally invalid.
    Validation,
    /// Network failure, timeout, or cancellation before a response arrived.
    UpstreamUnavailable,
    /// Any other non-success response from the upstream platform.
    Upstream,
}

impl ErrorKind {
    /// Return whether the caller should be asked to re-authenticate.
    pub fn requires_reauthentication(self) -> bool {
        matches!(self, Self::Authentication | Self::Authorization)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Upstream => "upstream",
        };
        f.write_str(label)
    }
}

/// Error envelope returned by every gateway operation.
///
/// ## Invariants
/// - `message` is never blank; constructors substitute the kind label.
///
/// # Examples
/// ```
/// use recipe_gateway::domain::{ErrorKind, GatewayError};
///
/// let err = GatewayError::not_found("recipe r-1 does not exist");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert!(err.status_code().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    raw_body: Option<String>,
    cancelled: bool,
}

impl GatewayError {
    /// Create an error of `kind` with a human-readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.to_string()
        } else {
            message
        };
        Self {
            kind,
            message,
            status_code: None,
            raw_body: None,
            cancelled: false,
        }
    }

    /// Attach the upstream HTTP status that produced this error.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Attach the raw upstream response body for diagnostics.
    pub fn with_raw_body(mut self, raw_body: impl Into<String>) -> Self {
        self.raw_body = Some(raw_body.into());
        self
    }

    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Upstream HTTP status, when the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Raw upstream body, when one was captured.
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// Convenience constructor for [`ErrorKind::Authentication`].
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Convenience constructor for [`ErrorKind::Authorization`].
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Convenience constructor for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Convenience constructor for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Convenience constructor for [`ErrorKind::UpstreamUnavailable`].
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    /// Convenience constructor for [`ErrorKind::Upstream`].
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    /// Error raised when a cancellation token fires mid-operation.
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::upstream_unavailable("request cancelled")
        }
    }

    /// Return whether this error records a caller-side cancellation.
    pub fn is_cancellation(&self) -> bool {
        self.cancelled
    }

    /// Return whether an idempotent read may be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::UpstreamUnavailable => !self.cancelled,
            ErrorKind::Upstream => self.status_code.is_some_and(|status| status >= 500),
            _ => false,
        }
    }
}
