//! Builders wiring configured adapters into an [`UpstreamGateway`].
//!
//! Fixture mode swaps the login exchange and session verification for
//! offline fixtures; everything else is built the same way.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use tracing::info;

use crate::config::GatewaySettings;
use crate::domain::ports::{
    FixtureSessionVerifier, FixtureTokenIssuer, InMemoryTokenCache, SessionVerifier, TokenCache,
    TokenIssuer, UpstreamTransport,
};
use crate::domain::{CredentialValidationError, SessionManager, SessionPorts};
use crate::outbound::cache::FileTokenCache;
use crate::outbound::upstream::{
    EndpointError, GatewayOptions, GatewayPorts, OAuthTokenIssuer, ReqwestTransport,
    UnknownAuthStyle, UpstreamEndpoints, UpstreamGateway, UpstreamProfileVerifier,
};

/// Errors raised while assembling the gateway from settings.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Credentials were partially configured or blank.
    #[error("invalid credentials: {0}")]
    Credential(#[from] CredentialValidationError),
    /// A base URL could not be used.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// The auth style name was not recognised.
    #[error(transparent)]
    AuthStyle(#[from] UnknownAuthStyle),
    /// The token cache path is not valid UTF-8.
    #[error("token cache path is not valid UTF-8: {0}")]
    CachePath(String),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the HTTP transport described by `settings`.
///
/// # Errors
///
/// Fails when the reqwest client cannot be constructed.
pub fn build_transport(
    settings: &GatewaySettings,
) -> Result<Arc<dyn UpstreamTransport>, BootstrapError> {
    let transport = ReqwestTransport::new(settings.timeout(), settings.user_agent())?;
    Ok(Arc::new(transport))
}

/// Build a gateway over `transport` using `settings`.
///
/// # Errors
///
/// Fails on invalid credentials, URLs, auth style or cache path.
pub fn build_gateway(
    settings: &GatewaySettings,
    transport: Arc<dyn UpstreamTransport>,
) -> Result<UpstreamGateway, BootstrapError> {
    let credential = settings.credential()?;
    let auth_style = settings.auth_style()?;
    let endpoints = UpstreamEndpoints::new(
        settings.base_url(),
        &settings.auth_base_url(),
        settings.language(),
    )?;

    let (issuer, verifier): (Arc<dyn TokenIssuer>, Arc<dyn SessionVerifier>) =
        if settings.fixture_mode {
            info!("fixture mode: login and session checks stay offline");
            (
                Arc::new(FixtureTokenIssuer::default()),
                Arc::new(FixtureSessionVerifier),
            )
        } else {
            (
                Arc::new(OAuthTokenIssuer::new(
                    transport.clone(),
                    endpoints.clone(),
                    settings.oauth_client(),
                )),
                Arc::new(UpstreamProfileVerifier::new(
                    transport.clone(),
                    endpoints.clone(),
                    auth_style,
                )),
            )
        };

    let session = SessionManager::new(
        credential,
        SessionPorts::new(issuer, build_cache(settings)?),
        Arc::new(DefaultClock),
        settings.refresh_margin(),
    );
    let options = GatewayOptions {
        auth_style,
        retry: settings.retry_policy(),
    };
    Ok(UpstreamGateway::new(
        session,
        endpoints,
        GatewayPorts::new(transport, verifier),
        options,
    ))
}

fn build_cache(settings: &GatewaySettings) -> Result<Arc<dyn TokenCache>, BootstrapError> {
    let Some(path) = settings.token_cache_path() else {
        return Ok(Arc::new(InMemoryTokenCache::default()));
    };
    let path = Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|path| BootstrapError::CachePath(path.display().to_string()))?;
    info!(path = %path, "persisting session token");
    Ok(Arc::new(FileTokenCache::new(path)))
}
