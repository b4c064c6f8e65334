//! OAuth2 password-grant login against the regional account host.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::dto::TokenResponseDto;
use super::endpoints::UpstreamEndpoints;
use crate::domain::Credential;
use crate::domain::ports::{
    HttpMethod, IssuedToken, TokenIssuer, TokenIssuerError, TransportError, UpstreamRequest,
    UpstreamTransport,
};

/// Public client identifier of the mobile app.
pub const DEFAULT_CLIENT_ID: &str = "kupferwerk-client-nwot";
/// Static `Authorization` header value sent with the token exchange.
pub const DEFAULT_CLIENT_SECRET_HEADER: &str =
    "Basic a3VwZmVyd2Vyay1jbGllbnQtbndvdDpMczUwT04xd285U3FzMWRDZEpnZQ==";

/// Client identity presented to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClient {
    /// `client_id` form field.
    pub client_id: String,
    /// Full `Authorization` header value, e.g. `Basic …`.
    pub authorization_header: String,
}

impl Default for OAuthClient {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_owned(),
            authorization_header: DEFAULT_CLIENT_SECRET_HEADER.to_owned(),
        }
    }
}

/// Token issuer performing the password grant over an [`UpstreamTransport`].
pub struct OAuthTokenIssuer {
    transport: Arc<dyn UpstreamTransport>,
    endpoints: UpstreamEndpoints,
    client: OAuthClient,
}

impl OAuthTokenIssuer {
    /// Build an issuer.
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        endpoints: UpstreamEndpoints,
        client: OAuthClient,
    ) -> Self {
        Self {
            transport,
            endpoints,
            client,
        }
    }
}

#[async_trait]
impl TokenIssuer for OAuthTokenIssuer {
    async fn issue(&self, credential: &Credential) -> Result<IssuedToken, TokenIssuerError> {
        let request = UpstreamRequest::new(HttpMethod::Post, self.endpoints.token())
            .header("Authorization", self.client.authorization_header.as_str())
            .form([
                ("grant_type", "password"),
                ("username", credential.email()),
                ("password", credential.password()),
                ("client_id", self.client.client_id.as_str()),
            ]);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(map_transport_error)?;
        if !response.is_success() {
            return Err(map_status_error(response.status));
        }

        let token: TokenResponseDto = serde_json::from_str(&response.body)
            .map_err(|error| TokenIssuerError::malformed(error.to_string()))?;
        if token.access_token.trim().is_empty() {
            return Err(TokenIssuerError::malformed("access_token is empty"));
        }
        debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "token endpoint issued a session token"
        );

        Ok(IssuedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in_secs: token.expires_in,
            subject_id: token.sub,
        })
    }

    async fn revoke(&self, access_token: &str) -> Result<(), TokenIssuerError> {
        let request = UpstreamRequest::new(HttpMethod::Post, self.endpoints.logout())
            .header("Authorization", format!("Bearer {access_token}"));
        let response = self
            .transport
            .send(request)
            .await
            .map_err(map_transport_error)?;
        if response.is_success() {
            Ok(())
        } else {
            Err(map_status_error(response.status))
        }
    }
}

fn map_transport_error(error: TransportError) -> TokenIssuerError {
    TokenIssuerError::unavailable(error.to_string())
}

fn map_status_error(status: u16) -> TokenIssuerError {
    if status >= 500 {
        TokenIssuerError::unavailable(format!("token endpoint responded with status {status}"))
    } else {
        TokenIssuerError::rejected(format!("token endpoint responded with status {status}"))
    }
}
