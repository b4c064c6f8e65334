//! Session verification by fetching the upstream profile.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::dispatch::AuthStyle;
use super::endpoints::UpstreamEndpoints;
use super::error_translation::translate_status;
use crate::domain::ports::{HttpMethod, SessionVerifier, UpstreamRequest, UpstreamTransport};
use crate::domain::GatewayError;

/// Verifier asking the account host for the profile behind a token.
pub struct UpstreamProfileVerifier {
    transport: Arc<dyn UpstreamTransport>,
    endpoints: UpstreamEndpoints,
    auth_style: AuthStyle,
}

impl UpstreamProfileVerifier {
    /// Build a verifier.
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        endpoints: UpstreamEndpoints,
        auth_style: AuthStyle,
    ) -> Self {
        Self {
            transport,
            endpoints,
            auth_style,
        }
    }
}

#[async_trait]
impl SessionVerifier for UpstreamProfileVerifier {
    async fn verify(
        &self,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, GatewayError> {
        let request = self.auth_style.apply(
            UpstreamRequest::new(HttpMethod::Get, self.endpoints.profile()),
            access_token,
        );
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(GatewayError::cancelled()),
            response = self.transport.send(request) => response.map_err(GatewayError::from)?,
        };
        if response.is_success() {
            return Ok(true);
        }

        let error = translate_status(response.status, &response.body);
        if error.kind().requires_reauthentication() {
            Ok(false)
        } else {
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::domain::ports::UpstreamResponse;
    use crate::test_support::ScriptedTransport;
    use rstest::rstest;

    fn verifier(transport: Arc<ScriptedTransport>) -> UpstreamProfileVerifier {
        let endpoints = UpstreamEndpoints::new(
            "https://cookidoo.de",
            "https://ch.tmmobile.vorwerk-digital.com",
            "de-CH",
        )
        .expect("static urls");
        UpstreamProfileVerifier::new(transport, endpoints, AuthStyle::Cookie)
    }

    #[rstest]
    #[case::accepted(200, true)]
    #[case::expired(401, false)]
    #[case::forbidden(403, false)]
    #[tokio::test]
    async fn profile_status_decides_verdict(#[case] status: u16, #[case] accepted: bool) {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(UpstreamResponse::new(status, r#"{"userInfo":{"username":"k"}}"#));

        let verdict = verifier(transport.clone())
            .verify("tok", &CancellationToken::new())
            .await
            .expect("verdict");
        assert_eq!(verdict, accepted);
        assert_eq!(
            transport.requests()[0].header_value("Cookie"),
            Some("_oauth2_proxy=tok")
        );
    }

    #[tokio::test]
    async fn server_errors_propagate() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response(UpstreamResponse::new(502, "bad gateway"));

        let err = verifier(transport)
            .verify("tok", &CancellationToken::new())
            .await
            .expect_err("server error");
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
