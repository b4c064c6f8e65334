//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod retry_sleeper;
mod session_verifier;
mod token_cache;
mod token_issuer;
mod upstream_transport;

pub use retry_sleeper::{RetrySleeper, TokioSleeper};
#[cfg(test)]
pub use session_verifier::MockSessionVerifier;
pub use session_verifier::{FixtureSessionVerifier, SessionVerifier};
#[cfg(test)]
pub use token_cache::MockTokenCache;
pub use token_cache::{InMemoryTokenCache, TokenCache, TokenCacheError};
#[cfg(test)]
pub use token_issuer::MockTokenIssuer;
pub use token_issuer::{FixtureTokenIssuer, IssuedToken, TokenIssuer, TokenIssuerError};
#[cfg(test)]
pub use upstream_transport::MockUpstreamTransport;
pub use upstream_transport::{
    HttpMethod, RequestBody, TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport,
};
