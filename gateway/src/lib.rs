//! Recipe gateway library modules.
//!
//! The crate follows a hexagonal layout: `domain` holds entities, the error
//! taxonomy, the step formatter, the session lifecycle manager and the ports
//! it depends on; `outbound` holds the adapters that talk to the upstream
//! recipe platform and to the local filesystem; `bootstrap` wires both from
//! [`GatewaySettings`].

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::GatewaySettings;
pub use domain::{ErrorKind, GatewayError, SessionManager};
pub use outbound::upstream::{RecipeCreationError, UpstreamGateway};
