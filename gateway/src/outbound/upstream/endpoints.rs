//! Upstream URL layout.
//!
//! Two hosts are involved: the recipe platform (`base_url`) and the regional
//! account host (`auth_base_url`) that serves login and the user profile.

use url::Url;

const AUTH_HOST_PATTERN: &str = "https://{cc}.tmmobile.vorwerk-digital.com";

/// Errors raised while assembling the URL layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// A configured URL did not parse.
    #[error("invalid {label} url `{value}`: {message}")]
    Invalid {
        /// Which URL was being parsed.
        label: &'static str,
        /// Raw input.
        value: String,
        /// Parser message.
        message: String,
    },
    /// A configured URL cannot carry a path, e.g. `mailto:`.
    #[error("{label} url `{value}` cannot carry a path")]
    NotABase {
        /// Which URL was being parsed.
        label: &'static str,
        /// Raw input.
        value: String,
    },
}

/// Resolved upstream URLs for one language/region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    base_url: Url,
    auth_base_url: Url,
    language: String,
}

impl UpstreamEndpoints {
    /// Build the layout from explicit hosts.
    ///
    /// # Errors
    ///
    /// Fails when either URL does not parse or cannot carry a path.
    pub fn new(
        base_url: &str,
        auth_base_url: &str,
        language: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            base_url: parse_base("base", base_url)?,
            auth_base_url: parse_base("auth", auth_base_url)?,
            language: language.into(),
        })
    }

    /// Account host for a country code.
    ///
    /// `international` maps to `xp` and `co.uk` to `gb`; other codes are used
    /// verbatim.
    pub fn auth_host_for_country(country_code: &str) -> String {
        let code = match country_code.trim() {
            "international" => "xp",
            "co.uk" => "gb",
            other => other,
        };
        AUTH_HOST_PATTERN.replace("{cc}", code)
    }

    /// Language segment used by created-recipe endpoints.
    pub fn language(&self) -> &str {
        self.language.as_str()
    }

    /// `POST {auth}/ciam/auth/token`
    pub fn token(&self) -> Url {
        with_segments(&self.auth_base_url, &["ciam", "auth", "token"])
    }

    /// `POST {auth}/ciam/auth/logout`
    pub fn logout(&self) -> Url {
        with_segments(&self.auth_base_url, &["ciam", "auth", "logout"])
    }

    /// `GET {auth}/community/profile`
    pub fn profile(&self) -> Url {
        with_segments(&self.auth_base_url, &["community", "profile"])
    }

    /// `GET {base}/recipes/{id}`
    pub fn recipe(&self, recipe_id: &str) -> Url {
        with_segments(&self.base_url, &["recipes", recipe_id])
    }

    /// `GET {base}/created-recipes`
    pub fn created_recipes(&self) -> Url {
        with_segments(&self.base_url, &["created-recipes"])
    }

    /// `POST {base}/created-recipes/{lang}`
    pub fn created_recipes_for_language(&self) -> Url {
        with_segments(&self.base_url, &["created-recipes", self.language.as_str()])
    }

    /// `PATCH|DELETE {base}/created-recipes/{lang}/{id}`
    pub fn created_recipe(&self, recipe_id: &str) -> Url {
        with_segments(&self.base_url, &["created-recipes", self.language.as_str(), recipe_id])
    }

    /// `POST {base}/collections`
    pub fn collections(&self) -> Url {
        with_segments(&self.base_url, &["collections"])
    }

    /// `GET {base}/collections/my`
    pub fn my_collections(&self) -> Url {
        with_segments(&self.base_url, &["collections", "my"])
    }

    /// `GET|PUT|DELETE {base}/collections/{id}`, optionally with
    /// `?include=recipes`.
    pub fn collection(&self, collection_id: &str, include_recipes: bool) -> Url {
        let mut url = with_segments(&self.base_url, &["collections", collection_id]);
        if include_recipes {
            url.query_pairs_mut().append_pair("include", "recipes");
        }
        url
    }

    /// `POST {base}/collections/{id}/recipes`
    pub fn collection_recipes(&self, collection_id: &str) -> Url {
        with_segments(&self.base_url, &["collections", collection_id, "recipes"])
    }

    /// `DELETE {base}/collections/{id}/recipes/{recipeId}`
    pub fn collection_recipe(&self, collection_id: &str, recipe_id: &str) -> Url {
        with_segments(
            &self.base_url,
            &["collections", collection_id, "recipes", recipe_id],
        )
    }
}

fn parse_base(label: &'static str, value: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(value.trim()).map_err(|error| EndpointError::Invalid {
        label,
        value: value.to_owned(),
        message: error.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(EndpointError::NotABase {
            label,
            value: value.to_owned(),
        });
    }
    Ok(url)
}

fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // Bases are checked in `parse_base`, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
