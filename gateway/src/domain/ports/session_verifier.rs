//! Strategy port deciding whether an access token is still accepted.
//!
//! Production wiring asks the upstream platform; offline and test wiring use
//! [`FixtureSessionVerifier`], which recognises well-known mock tokens.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::GatewayError;

/// Port verifying a session token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Return `Ok(true)` when `access_token` is accepted.
    ///
    /// # Errors
    ///
    /// Availability failures propagate; rejection is `Ok(false)`.
    async fn verify(
        &self,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, GatewayError>;
}

const MOCK_TOKEN_PREFIX: &str = "mock-";
const WELL_KNOWN_TOKENS: [&str; 2] = ["test-token", "demo-token"];

/// Verifier accepting only mock tokens, without network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSessionVerifier;

impl FixtureSessionVerifier {
    /// Return whether `access_token` is one of the recognised mock tokens.
    pub fn is_mock_token(access_token: &str) -> bool {
        access_token.starts_with(MOCK_TOKEN_PREFIX) || WELL_KNOWN_TOKENS.contains(&access_token)
    }
}

#[async_trait]
impl SessionVerifier for FixtureSessionVerifier {
    async fn verify(
        &self,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, GatewayError> {
        if cancel.is_cancelled() {
            return Err(GatewayError::cancelled());
        }
        Ok(Self::is_mock_token(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mock-123", true)]
    #[case("test-token", true)]
    #[case("demo-token", true)]
    #[case("eyJhbGciOi", false)]
    #[case("test-token-2", false)]
    #[tokio::test]
    async fn fixture_accepts_mock_tokens_only(#[case] token: &str, #[case] accepted: bool) {
        let verdict = FixtureSessionVerifier
            .verify(token, &CancellationToken::new())
            .await
            .expect("fixture verify");
        assert_eq!(verdict, accepted);
    }

    #[tokio::test]
    async fn fixture_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = FixtureSessionVerifier
            .verify("mock-1", &cancel)
            .await
            .expect_err("cancelled");
        assert_eq!(err, GatewayError::cancelled());
    }
}
