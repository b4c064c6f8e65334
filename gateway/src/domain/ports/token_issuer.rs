//! Driven port for the upstream login exchange.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Credential;

/// Token material returned by a successful login exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque access token.
    pub access_token: String,
    /// Refresh token, recorded but not exchanged.
    pub refresh_token: Option<String>,
    /// Lifetime declared by the server, in seconds.
    pub expires_in_secs: i64,
    /// Upstream user identifier.
    pub subject_id: Option<String>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in_secs", &self.expires_in_secs)
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

define_port_error! {
    /// Errors surfaced by the login exchange.
    pub enum TokenIssuerError {
        /// The server refused the credentials or the client.
        Rejected { message: String } => Authentication: "login rejected: {message}",
        /// The token endpoint could not be reached or answered with 5xx.
        Unavailable { message: String } => UpstreamUnavailable: "login endpoint unavailable: {message}",
        /// The token response could not be decoded.
        Malformed { message: String } => Authentication: "login response malformed: {message}",
    }
}

/// Port exchanging credentials for session tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Exchange `credential` for a fresh token.
    async fn issue(&self, credential: &Credential) -> Result<IssuedToken, TokenIssuerError>;

    /// Ask the upstream to forget `access_token`.
    async fn revoke(&self, access_token: &str) -> Result<(), TokenIssuerError>;
}

/// Issuer handing out a fixed token, for offline runs.
#[derive(Debug, Clone)]
pub struct FixtureTokenIssuer {
    access_token: String,
    expires_in_secs: i64,
}

impl FixtureTokenIssuer {
    /// Build an issuer returning `access_token` valid for `expires_in_secs`.
    pub fn new(access_token: impl Into<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in_secs,
        }
    }
}

impl Default for FixtureTokenIssuer {
    fn default() -> Self {
        Self::new("mock-fixture-token", 3_600)
    }
}

#[async_trait]
impl TokenIssuer for FixtureTokenIssuer {
    async fn issue(&self, credential: &Credential) -> Result<IssuedToken, TokenIssuerError> {
        Ok(IssuedToken {
            access_token: self.access_token.clone(),
            refresh_token: None,
            expires_in_secs: self.expires_in_secs,
            subject_id: Some(credential.email().to_owned()),
        })
    }

    async fn revoke(&self, _access_token: &str) -> Result<(), TokenIssuerError> {
        Ok(())
    }
}
