//! Domain entities, the gateway error taxonomy and the session lifecycle.
//!
//! Nothing in here performs I/O directly; adapters reach the domain through
//! the traits in [`ports`].

mod collection;
mod credentials;
mod error;
mod ids;
mod paging;
pub mod ports;
mod recipe;
pub mod session;
mod step_format;

pub use self::collection::{Collection, UpstreamUser};
pub use self::credentials::{Credential, CredentialValidationError};
pub use self::error::{ErrorKind, GatewayError};
pub use self::ids::{CollectionId, IdValidationError, RecipeId};
pub use self::paging::{ListQuery, Page};
pub use self::recipe::{
    CookingStep, DEFAULT_PORTIONS, Ingredient, MAX_SPEED, MAX_TEMPERATURE_CELSIUS, Recipe,
    RecipeValidationError,
};
pub use self::session::{CachedTokenRecord, SessionManager, SessionPorts, SessionToken};
pub use self::step_format::format_step_text;
