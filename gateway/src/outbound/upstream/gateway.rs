//! Upstream gateway façade.
//!
//! Every operation obtains a token from the [`SessionManager`], builds the
//! wire request, dispatches it and maps the answer back into the domain.
//! Reads go through the bounded [`RetryPolicy`]; mutations are sent once.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::dispatch::{AuthStyle, Dispatcher, decode, decode_optional};
use super::dto::{
    CollectionDto, CollectionListDto, CreateRecipeResponseDto, ProfileDto, RecipeDto,
    RecipeListDto,
};
use super::endpoints::UpstreamEndpoints;
use super::mapper;
use super::retry::RetryPolicy;
use crate::domain::ports::{
    HttpMethod, RetrySleeper, SessionVerifier, TokioSleeper, UpstreamRequest, UpstreamTransport,
};
use crate::domain::{
    Collection, CollectionId, ErrorKind, GatewayError, ListQuery, Page, Recipe, RecipeId,
    SessionManager, UpstreamUser,
};

/// Failure of the two-phase recipe creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeCreationError {
    /// Nothing was created upstream.
    #[error(transparent)]
    NotCreated(#[from] GatewayError),
    /// The shell exists upstream under `recipe_id` but populating it failed.
    /// The shell is not rolled back.
    #[error("recipe {recipe_id} was created but populating it failed: {source}")]
    PartiallyCreated {
        /// Identifier of the empty shell left upstream.
        recipe_id: RecipeId,
        /// Failure of the populate phase.
        #[source]
        source: GatewayError,
    },
}

impl RecipeCreationError {
    /// Underlying gateway error.
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::NotCreated(error) | Self::PartiallyCreated { source: error, .. } => error,
        }
    }

    /// Error kind of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        self.gateway_error().kind()
    }

    /// Identifier of a half-created recipe, if one was left upstream.
    pub fn partial_recipe_id(&self) -> Option<&RecipeId> {
        match self {
            Self::NotCreated(_) => None,
            Self::PartiallyCreated { recipe_id, .. } => Some(recipe_id),
        }
    }
}

/// Port bundle required by the gateway.
pub struct GatewayPorts {
    /// Outbound HTTP adapter.
    pub transport: Arc<dyn UpstreamTransport>,
    /// Strategy deciding whether a token is still accepted.
    pub verifier: Arc<dyn SessionVerifier>,
    /// Sleeper used between read retries.
    pub sleeper: Arc<dyn RetrySleeper>,
}

impl GatewayPorts {
    /// Build a port bundle using the tokio sleeper.
    pub fn new(transport: Arc<dyn UpstreamTransport>, verifier: Arc<dyn SessionVerifier>) -> Self {
        Self {
            transport,
            verifier,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the retry sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn RetrySleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

/// Behavioural options for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayOptions {
    /// How tokens are attached to requests.
    pub auth_style: AuthStyle,
    /// Retry budget for idempotent reads.
    pub retry: RetryPolicy,
}

/// Façade over the upstream recipe platform.
#[derive(Clone)]
pub struct UpstreamGateway {
    dispatcher: Dispatcher,
    endpoints: UpstreamEndpoints,
    verifier: Arc<dyn SessionVerifier>,
    sleeper: Arc<dyn RetrySleeper>,
    retry: RetryPolicy,
}

impl UpstreamGateway {
    /// Build a gateway sharing `session` with other components.
    pub fn new(
        session: SessionManager,
        endpoints: UpstreamEndpoints,
        ports: GatewayPorts,
        options: GatewayOptions,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(ports.transport, session, options.auth_style),
            endpoints,
            verifier: ports.verifier,
            sleeper: ports.sleeper,
            retry: options.retry,
        }
    }

    /// Session shared with this gateway.
    pub fn session(&self) -> &SessionManager {
        self.dispatcher.session()
    }

    /// Return whether the current session is accepted upstream.
    ///
    /// Authentication failures while obtaining a token yield `Ok(false)`;
    /// availability failures propagate. A rejected token is discarded.
    pub async fn validate_session(&self, cancel: &CancellationToken) -> Result<bool, GatewayError> {
        let access_token = match self.session().get_valid_token(cancel).await {
            Ok(token) => token,
            Err(error) if error.kind().requires_reauthentication() => {
                warn!(error = %error, "session validation could not obtain a token");
                return Ok(false);
            }
            Err(error) => return Err(error),
        };

        let accepted = self.verifier.verify(&access_token, cancel).await?;
        if !accepted {
            self.session().invalidate(&access_token).await;
        }
        Ok(accepted)
    }

    /// Fetch the profile of the signed-in account.
    pub async fn fetch_user(
        &self,
        cancel: &CancellationToken,
    ) -> Result<UpstreamUser, GatewayError> {
        let profile: ProfileDto = self
            .read(
                cancel,
                || UpstreamRequest::new(HttpMethod::Get, self.endpoints.profile()),
                "profile",
            )
            .await?;
        let subject_id = self.session().subject_id().await;
        Ok(mapper::user_from_profile(profile, subject_id))
    }

    /// Create a recipe in two phases: an empty shell, then the full payload.
    ///
    /// The payload is validated before anything is sent, so a validation
    /// failure never leaves a shell behind.
    ///
    /// # Errors
    ///
    /// [`RecipeCreationError::NotCreated`] when nothing exists upstream and
    /// [`RecipeCreationError::PartiallyCreated`] when only the shell does.
    pub async fn create_recipe(
        &self,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<Recipe, RecipeCreationError> {
        let payload = mapper::update_recipe_payload(recipe)?;
        let shell = mapper::create_recipe_payload(recipe)?;

        let request = UpstreamRequest::new(
            HttpMethod::Post,
            self.endpoints.created_recipes_for_language(),
        )
        .json(shell);
        let body = self.dispatcher.send_authenticated(request, cancel).await?;
        let created: CreateRecipeResponseDto = decode(&body, "recipe shell")?;
        let recipe_id = RecipeId::new(created.recipe_id)
            .map_err(|error| GatewayError::upstream(format!("recipe shell: {error}")))?;
        info!(recipe_id = %recipe_id, "created recipe shell");

        match self.patch_recipe(&recipe_id, payload, recipe, cancel).await {
            Ok(mut populated) => {
                if populated.name.is_empty() {
                    populated.name = created.recipe_name.unwrap_or_else(|| recipe.name.clone());
                }
                Ok(populated)
            }
            Err(source) => {
                warn!(
                    recipe_id = %recipe_id,
                    error = %source,
                    "recipe shell left partially created"
                );
                Err(RecipeCreationError::PartiallyCreated { recipe_id, source })
            }
        }
    }

    /// Replace the content of an existing recipe.
    pub async fn update_recipe(
        &self,
        recipe_id: &RecipeId,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<Recipe, GatewayError> {
        let payload = mapper::update_recipe_payload(recipe)?;
        self.patch_recipe(recipe_id, payload, recipe, cancel).await
    }

    async fn patch_recipe(
        &self,
        recipe_id: &RecipeId,
        payload: serde_json::Value,
        local: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<Recipe, GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Patch,
            self.endpoints.created_recipe(recipe_id.as_str()),
        )
        .json(payload);
        let body = self.dispatcher.send_authenticated(request, cancel).await?;
        let updated = decode_optional::<RecipeDto>(&body, "recipe")?;
        Ok(updated.map_or_else(
            || Recipe {
                id: Some(recipe_id.clone()),
                ..local.clone()
            },
            mapper::recipe_from_dto,
        ))
    }

    /// Fetch one recipe.
    pub async fn get_recipe(
        &self,
        recipe_id: &RecipeId,
        cancel: &CancellationToken,
    ) -> Result<Recipe, GatewayError> {
        let dto: RecipeDto = self
            .read(
                cancel,
                || UpstreamRequest::new(HttpMethod::Get, self.endpoints.recipe(recipe_id.as_str())),
                "recipe",
            )
            .await?;
        Ok(mapper::recipe_from_dto(dto))
    }

    /// List the account's created recipes.
    pub async fn list_recipes(
        &self,
        query: ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Recipe>, GatewayError> {
        let dto: RecipeListDto = self
            .read(
                cancel,
                || UpstreamRequest::new(HttpMethod::Get, self.endpoints.created_recipes()),
                "recipe list",
            )
            .await?;
        let total = dto.total.unwrap_or(dto.recipes.len());
        let recipes = dto.recipes.into_iter().map(mapper::recipe_from_dto).collect();
        Ok(query.apply(recipes, total))
    }

    /// Delete a created recipe.
    pub async fn delete_recipe(
        &self,
        recipe_id: &RecipeId,
        cancel: &CancellationToken,
    ) -> Result<(), GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Delete,
            self.endpoints.created_recipe(recipe_id.as_str()),
        );
        self.dispatcher.send_authenticated(request, cancel).await?;
        info!(recipe_id = %recipe_id, "deleted recipe");
        Ok(())
    }

    /// Create a collection.
    pub async fn create_collection(
        &self,
        collection: &Collection,
        cancel: &CancellationToken,
    ) -> Result<Collection, GatewayError> {
        let request = UpstreamRequest::new(HttpMethod::Post, self.endpoints.collections())
            .json(mapper::create_collection_payload(collection)?);
        let body = self.dispatcher.send_authenticated(request, cancel).await?;
        let dto: CollectionDto = decode(&body, "collection")?;
        Ok(mapper::collection_from_dto(dto))
    }

    /// Replace name, description, tags and visibility of a collection.
    pub async fn update_collection(
        &self,
        collection_id: &CollectionId,
        collection: &Collection,
        cancel: &CancellationToken,
    ) -> Result<Collection, GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Put,
            self.endpoints.collection(collection_id.as_str(), false),
        )
        .json(mapper::update_collection_payload(collection)?);
        let body = self.dispatcher.send_authenticated(request, cancel).await?;
        let updated = decode_optional::<CollectionDto>(&body, "collection")?;
        Ok(updated.map_or_else(
            || Collection {
                id: Some(collection_id.clone()),
                ..collection.clone()
            },
            mapper::collection_from_dto,
        ))
    }

    /// Fetch one collection, optionally with its member recipes.
    pub async fn get_collection(
        &self,
        collection_id: &CollectionId,
        include_recipes: bool,
        cancel: &CancellationToken,
    ) -> Result<Collection, GatewayError> {
        let dto: CollectionDto = self
            .read(
                cancel,
                || {
                    UpstreamRequest::new(
                        HttpMethod::Get,
                        self.endpoints.collection(collection_id.as_str(), include_recipes),
                    )
                },
                "collection",
            )
            .await?;
        Ok(mapper::collection_from_dto(dto))
    }

    /// List the account's collections.
    pub async fn list_collections(
        &self,
        query: ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Collection>, GatewayError> {
        let dto: CollectionListDto = self
            .read(
                cancel,
                || UpstreamRequest::new(HttpMethod::Get, self.endpoints.my_collections()),
                "collection list",
            )
            .await?;
        let total = dto.total.unwrap_or(dto.collections.len());
        let collections = dto
            .collections
            .into_iter()
            .map(mapper::collection_from_dto)
            .collect();
        Ok(query.apply(collections, total))
    }

    /// Delete a collection. Member recipes are untouched.
    pub async fn delete_collection(
        &self,
        collection_id: &CollectionId,
        cancel: &CancellationToken,
    ) -> Result<(), GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Delete,
            self.endpoints.collection(collection_id.as_str(), false),
        );
        self.dispatcher.send_authenticated(request, cancel).await?;
        info!(collection_id = %collection_id, "deleted collection");
        Ok(())
    }

    /// Add a recipe to a collection.
    pub async fn add_recipe_to_collection(
        &self,
        collection_id: &CollectionId,
        recipe_id: &RecipeId,
        cancel: &CancellationToken,
    ) -> Result<(), GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Post,
            self.endpoints.collection_recipes(collection_id.as_str()),
        )
        .json(mapper::add_recipe_payload(recipe_id)?);
        self.dispatcher.send_authenticated(request, cancel).await?;
        Ok(())
    }

    /// Remove a recipe from a collection.
    pub async fn remove_recipe_from_collection(
        &self,
        collection_id: &CollectionId,
        recipe_id: &RecipeId,
        cancel: &CancellationToken,
    ) -> Result<(), GatewayError> {
        let request = UpstreamRequest::new(
            HttpMethod::Delete,
            self.endpoints
                .collection_recipe(collection_id.as_str(), recipe_id.as_str()),
        );
        self.dispatcher.send_authenticated(request, cancel).await?;
        Ok(())
    }

    /// End the session locally and upstream. Never fails.
    pub async fn logout(&self, cancel: &CancellationToken) {
        self.session().logout(cancel).await;
    }

    async fn read<T, B>(
        &self,
        cancel: &CancellationToken,
        build: B,
        what: &str,
    ) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
        B: Fn() -> UpstreamRequest,
    {
        let dispatcher = &self.dispatcher;
        let build = &build;
        self.retry
            .run(self.sleeper.as_ref(), cancel, move || async move {
                let body = dispatcher.send_authenticated(build(), cancel).await?;
                decode(&body, what)
            })
            .await
    }
}
