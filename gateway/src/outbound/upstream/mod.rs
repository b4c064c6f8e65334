//! Adapters for the upstream recipe platform.
//!
//! Wire DTOs, mapping and status translation stay private to this module;
//! callers see the [`UpstreamGateway`] façade and the port implementations.

mod dispatch;
mod dto;
mod endpoints;
mod error_translation;
mod gateway;
mod http_transport;
mod mapper;
mod profile_verifier;
mod retry;
mod token_endpoint;

pub use dispatch::{AuthStyle, UnknownAuthStyle};
pub use endpoints::{EndpointError, UpstreamEndpoints};
pub use gateway::{GatewayOptions, GatewayPorts, RecipeCreationError, UpstreamGateway};
pub use http_transport::{DEFAULT_USER_AGENT, ReqwestTransport};
pub use profile_verifier::UpstreamProfileVerifier;
pub use retry::RetryPolicy;
pub use token_endpoint::{
    DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET_HEADER, OAuthClient, OAuthTokenIssuer,
};
