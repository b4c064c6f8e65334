//! Recipe collections and the upstream user profile.

use chrono::{DateTime, Utc};

use super::{CollectionId, Recipe, RecipeId};

/// A named group of recipes owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Upstream identifier; `None` until created.
    pub id: Option<CollectionId>,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Member recipe identifiers.
    pub recipe_ids: Vec<RecipeId>,
    /// Member recipes, only populated when requested.
    pub recipes: Option<Vec<Recipe>>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Cover image.
    pub image_url: Option<String>,
    /// Whether the collection is publicly visible.
    pub is_public: bool,
    /// Creation timestamp reported by upstream.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp reported by upstream.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Collection {
    /// Start a new, not yet persisted collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            recipe_ids: Vec::new(),
            recipes: None,
            tags: Vec::new(),
            image_url: None,
            is_public: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Number of member recipes.
    pub fn recipe_count(&self) -> usize {
        self.recipe_ids.len()
    }
}

/// Profile of the signed-in upstream account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUser {
    /// Upstream subject identifier, when known from the token exchange.
    pub id: Option<String>,
    /// Public user name.
    pub username: String,
    /// Profile description.
    pub description: Option<String>,
    /// Profile picture.
    pub picture: Option<String>,
}
