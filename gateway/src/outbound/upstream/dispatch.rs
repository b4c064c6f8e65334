//! Authenticated request dispatch.
//!
//! This is the only place where transport failures and non-success statuses
//! become [`GatewayError`]s.

use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error_translation::translate_status;
use crate::domain::ports::{UpstreamRequest, UpstreamTransport};
use crate::domain::{ErrorKind, GatewayError, SessionManager};

const OAUTH_PROXY_COOKIE: &str = "_oauth2_proxy";

/// How the access token is attached to authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStyle {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `Cookie: _oauth2_proxy=<token>`
    Cookie,
}

impl AuthStyle {
    /// Attach `access_token` to `request`.
    pub fn apply(self, request: UpstreamRequest, access_token: &str) -> UpstreamRequest {
        match self {
            Self::Bearer => request.header("Authorization", format!("Bearer {access_token}")),
            Self::Cookie => {
                request.header("Cookie", format!("{OAUTH_PROXY_COOKIE}={access_token}"))
            }
        }
    }
}

/// Error returned when an auth style name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown auth style `{0}`; expected `bearer` or `cookie`")]
pub struct UnknownAuthStyle(String);

impl FromStr for AuthStyle {
    type Err = UnknownAuthStyle;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "cookie" => Ok(Self::Cookie),
            _ => Err(UnknownAuthStyle(raw.to_owned())),
        }
    }
}

/// Sends requests with the session token attached.
#[derive(Clone)]
pub(super) struct Dispatcher {
    transport: Arc<dyn UpstreamTransport>,
    session: SessionManager,
    auth_style: AuthStyle,
}

impl Dispatcher {
    pub(super) fn new(
        transport: Arc<dyn UpstreamTransport>,
        session: SessionManager,
        auth_style: AuthStyle,
    ) -> Self {
        Self {
            transport,
            session,
            auth_style,
        }
    }

    pub(super) fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send `request` with a valid token and return the success body.
    ///
    /// A 401 drops the token so that the next call logs in again.
    pub(super) async fn send_authenticated(
        &self,
        request: UpstreamRequest,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let access_token = self.session.get_valid_token(cancel).await?;
        let request = self.auth_style.apply(request, &access_token);
        let outcome = self.send(request, cancel).await;
        let rejected = matches!(
            &outcome,
            Err(error)
                if error.kind() == ErrorKind::Authentication && error.status_code() == Some(401)
        );
        if rejected {
            self.session.invalidate(&access_token).await;
        }
        outcome
    }

    async fn send(
        &self,
        request: UpstreamRequest,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let method = request.method;
        let path = request.url.path().to_owned();
        debug!(%method, %path, "dispatching upstream request");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(GatewayError::cancelled()),
            response = self.transport.send(request) => response.map_err(GatewayError::from)?,
        };

        if response.is_success() {
            debug!(%method, %path, status = response.status, "upstream request succeeded");
            return Ok(response.body);
        }
        debug!(%method, %path, status = response.status, "upstream request failed");
        Err(translate_status(response.status, &response.body))
    }
}

/// Decode a success body that must not be empty.
pub(super) fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, GatewayError> {
    if body.trim().is_empty() {
        return Err(GatewayError::upstream(format!("empty {what} response")));
    }
    serde_json::from_str(body).map_err(|error| {
        GatewayError::upstream(format!("invalid {what} payload: {error}")).with_raw_body(body)
    })
}

/// Decode a success body that may legitimately be empty.
pub(super) fn decode_optional<T: DeserializeOwned>(
    body: &str,
    what: &str,
) -> Result<Option<T>, GatewayError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    decode(body, what).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::HttpMethod;
    use rstest::rstest;
    use url::Url;

    fn request() -> UpstreamRequest {
        UpstreamRequest::new(
            HttpMethod::Get,
            Url::parse("https://cookidoo.de/recipes/r").expect("static url"),
        )
    }

    #[rstest]
    #[case::bearer(AuthStyle::Bearer, "Authorization", "Bearer tok")]
    #[case::cookie(AuthStyle::Cookie, "Cookie", "_oauth2_proxy=tok")]
    fn styles_attach_token(#[case] style: AuthStyle, #[case] header: &str, #[case] value: &str) {
        let request = style.apply(request(), "tok");
        assert_eq!(request.header_value(header), Some(value));
    }

    #[rstest]
    #[case("bearer", Some(AuthStyle::Bearer))]
    #[case(" Cookie ", Some(AuthStyle::Cookie))]
    #[case("basic", None)]
    fn styles_parse_from_names(#[case] raw: &str, #[case] expected: Option<AuthStyle>) {
        assert_eq!(raw.parse::<AuthStyle>().ok(), expected);
    }

    #[test]
    fn empty_bodies_fail_strict_decoding() {
        let err = decode::<serde_json::Value>("  ", "recipe").expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(decode_optional::<serde_json::Value>("", "recipe").expect("empty ok").is_none());
    }

    #[test]
    fn malformed_bodies_are_upstream_errors() {
        let err = decode::<serde_json::Value>("{oops", "recipe").expect_err("malformed");
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.raw_body(), Some("{oops"));
    }
}
