//! Gateway configuration loaded via OrthoConfig.
//!
//! Every field is optional on the wire; accessors supply the defaults so
//! that an empty environment yields a working Swiss-German setup.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::session::DEFAULT_REFRESH_MARGIN;
use crate::domain::{Credential, CredentialValidationError};
use crate::outbound::upstream::{
    AuthStyle, DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET_HEADER, DEFAULT_USER_AGENT, OAuthClient,
    RetryPolicy, UnknownAuthStyle, UpstreamEndpoints,
};

const DEFAULT_BASE_URL: &str = "https://cookidoo.de";
const DEFAULT_COUNTRY_CODE: &str = "ch";
const DEFAULT_LANGUAGE: &str = "de-CH";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Settings for the upstream gateway.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPE_GATEWAY")]
pub struct GatewaySettings {
    /// Account e-mail used for the password grant.
    pub email: Option<String>,
    /// Account password used for the password grant.
    pub password: Option<String>,
    /// Recipe platform base URL.
    pub base_url: Option<String>,
    /// Account host override; derived from the country code when absent.
    pub auth_base_url: Option<String>,
    /// Two-letter market code selecting the account host.
    pub country_code: Option<String>,
    /// Locale used in recipe routes.
    pub language: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Attempts for idempotent reads, including the first.
    pub max_retry_attempts: Option<u32>,
    /// Pause between read attempts in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// User agent sent upstream.
    pub user_agent: Option<String>,
    /// OAuth client identifier.
    pub client_id: Option<String>,
    /// Full `Authorization` header value for the token exchange.
    pub client_secret_header: Option<String>,
    /// `bearer` or `cookie`.
    pub auth_style: Option<String>,
    /// Token cache file; the token is kept in memory only when absent.
    pub token_cache_path: Option<PathBuf>,
    /// Renew tokens this many seconds before expiry.
    pub token_refresh_margin_secs: Option<u64>,
    /// Use fixture login and verification instead of the network.
    #[ortho_config(default = false)]
    pub fixture_mode: bool,
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("country_code", &self.country_code)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("user_agent", &self.user_agent)
            .field("client_id", &self.client_id)
            .field("auth_style", &self.auth_style)
            .field("token_cache_path", &self.token_cache_path)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .field("fixture_mode", &self.fixture_mode)
            .finish_non_exhaustive()
    }
}

impl GatewaySettings {
    /// Return the account credential, if one is configured.
    ///
    /// # Errors
    ///
    /// Fails when only one half of the pair is set or either half is blank.
    pub fn credential(&self) -> Result<Option<Credential>, CredentialValidationError> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (None, None) => Ok(None),
            (email, password) => Credential::try_from_parts(
                email.unwrap_or_default(),
                password.unwrap_or_default(),
            )
            .map(Some),
        }
    }

    /// Return the recipe platform base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Return the market code.
    pub fn country_code(&self) -> &str {
        self.country_code.as_deref().unwrap_or(DEFAULT_COUNTRY_CODE)
    }

    /// Return the account host, derived from the market unless overridden.
    pub fn auth_base_url(&self) -> String {
        self.auth_base_url
            .clone()
            .unwrap_or_else(|| UpstreamEndpoints::auth_host_for_country(self.country_code()))
    }

    /// Return the recipe locale.
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Return the per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Return the read retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self
                .max_retry_attempts
                .unwrap_or(DEFAULT_MAX_RETRY_ATTEMPTS)
                .max(1),
            delay: Duration::from_millis(self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)),
        }
    }

    /// Return the user agent.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Return the OAuth client identity.
    pub fn oauth_client(&self) -> OAuthClient {
        OAuthClient {
            client_id: self
                .client_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_owned()),
            authorization_header: self
                .client_secret_header
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_SECRET_HEADER.to_owned()),
        }
    }

    /// Return how tokens are attached to requests.
    ///
    /// # Errors
    ///
    /// Fails when the configured name is neither `bearer` nor `cookie`.
    pub fn auth_style(&self) -> Result<AuthStyle, UnknownAuthStyle> {
        self.auth_style
            .as_deref()
            .map_or(Ok(AuthStyle::default()), AuthStyle::from_str)
    }

    /// Return the token cache file, if persistence is enabled.
    pub fn token_cache_path(&self) -> Option<&Path> {
        self.token_cache_path.as_deref()
    }

    /// Return the safety margin before expiry.
    pub fn refresh_margin(&self) -> Duration {
        self.token_refresh_margin_secs
            .map_or(DEFAULT_REFRESH_MARGIN, Duration::from_secs)
    }
}
