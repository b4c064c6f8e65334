//! Opaque upstream identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation error for identifier newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label} identifier must not be blank")]
pub struct IdValidationError {
    label: &'static str,
}

macro_rules! define_upstream_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Result<Self, IdValidationError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(IdValidationError { label: $label });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_upstream_id!(
    /// Identifier of a recipe on the upstream platform.
    RecipeId,
    "recipe"
);

define_upstream_id!(
    /// Identifier of a recipe collection on the upstream platform.
    CollectionId,
    "collection"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        let err = RecipeId::new("  ").expect_err("blank id");
        assert_eq!(err.to_string(), "recipe identifier must not be blank");
    }

    #[test]
    fn ids_are_trimmed() {
        let id = CollectionId::new(" col-1 ").expect("valid id");
        assert_eq!(id.as_str(), "col-1");
        assert_eq!(id.to_string(), "col-1");
    }
}
