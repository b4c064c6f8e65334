//! Domain ↔ wire mapping.
//!
//! Outbound, recipe steps are rendered through [`format_step_text`] and
//! times become seconds. Inbound, instruction text is kept verbatim and
//! step order is reassigned by position.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::dto::{
    AddRecipeRequestDto, CollectionDto, CreateCollectionRequestDto, CreateRecipeRequestDto,
    INGREDIENT_TYPE, PORTION_UNIT, ProfileDto, RecipeDto, STEP_TYPE, TypedTextDto,
    UpdateCollectionRequestDto, UpdateRecipeRequestDto, YieldDto,
};
use crate::domain::{
    Collection, CollectionId, CookingStep, DEFAULT_PORTIONS, GatewayError, Ingredient, Recipe,
    RecipeId, UpstreamUser, format_step_text,
};

const SECONDS_PER_MINUTE: u64 = 60;

fn to_json<T: Serialize>(payload: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(payload)
        .map_err(|error| GatewayError::validation(format!("payload is not serialisable: {error}")))
}

/// Phase-one body for recipe creation: `{"recipeName": …}`.
pub(super) fn create_recipe_payload(recipe: &Recipe) -> Result<Value, GatewayError> {
    to_json(&CreateRecipeRequestDto {
        recipe_name: recipe.name.as_str(),
    })
}

/// Full recipe body used by the patch endpoint.
///
/// # Errors
///
/// Returns a validation error when the step list breaks its invariants.
pub(super) fn update_recipe_payload(recipe: &Recipe) -> Result<Value, GatewayError> {
    let steps = recipe
        .ordered_steps()
        .map_err(|error| GatewayError::validation(error.to_string()))?;

    let prep_minutes = u64::from(recipe.preparation_time_minutes);
    let total_minutes = u64::from(recipe.total_time_minutes());
    let dto = UpdateRecipeRequestDto {
        recipe_name: recipe.name.clone(),
        description: recipe.description.clone(),
        ingredients: recipe
            .ingredients
            .iter()
            .map(|ingredient| typed_text(INGREDIENT_TYPE, ingredient.text.clone()))
            .collect(),
        instructions: steps
            .into_iter()
            .map(|step| typed_text(STEP_TYPE, format_step_text(step)))
            .collect(),
        tools: recipe.tools.clone(),
        total_time: total_minutes * SECONDS_PER_MINUTE,
        prep_time: prep_minutes * SECONDS_PER_MINUTE,
        recipe_yield: YieldDto {
            value: recipe.portions,
            unit_text: PORTION_UNIT.to_owned(),
        },
        tags: recipe.tags.clone(),
        image_url: recipe.image_url.clone(),
        notes: recipe.notes.clone(),
        is_public: recipe.is_public,
    };
    to_json(&dto)
}

fn typed_text(kind: &str, text: String) -> TypedTextDto {
    TypedTextDto {
        kind: kind.to_owned(),
        text,
    }
}

/// Map a recipe DTO into the domain, ordering steps by position.
pub(super) fn recipe_from_dto(dto: RecipeDto) -> Recipe {
    let preparation_time_minutes = dto.prep_time.map_or(0, seconds_to_minutes);
    let cooking_time_minutes = match (dto.total_time, dto.prep_time) {
        (Some(total), Some(prep)) => seconds_to_minutes(total.saturating_sub(prep)),
        _ => 0,
    };

    Recipe {
        id: RecipeId::new(dto.recipe_id).ok(),
        name: dto.recipe_name,
        description: dto.description.unwrap_or_default(),
        ingredients: dto
            .ingredients
            .into_iter()
            .map(|ingredient| Ingredient::new(ingredient.text))
            .collect(),
        steps: dto
            .instructions
            .into_iter()
            .zip(1_u32..)
            .map(|(instruction, order)| CookingStep::new(order, instruction.text))
            .collect(),
        preparation_time_minutes,
        cooking_time_minutes,
        portions: dto
            .recipe_yield
            .map_or(DEFAULT_PORTIONS, |recipe_yield| recipe_yield.value),
        tags: dto.tags,
        tools: dto.tools,
        image_url: dto.image_url,
        notes: dto.notes.unwrap_or_default(),
        is_public: dto.is_public,
        created_at: parse_timestamp(dto.created_at.as_deref()),
        updated_at: parse_timestamp(dto.updated_at.as_deref()),
    }
}

fn seconds_to_minutes(seconds: u64) -> u32 {
    u32::try_from(seconds / SECONDS_PER_MINUTE).unwrap_or(u32::MAX)
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// `{"name", "description"}` body for collection creation.
pub(super) fn create_collection_payload(collection: &Collection) -> Result<Value, GatewayError> {
    to_json(&CreateCollectionRequestDto {
        name: collection.name.as_str(),
        description: collection.description.as_str(),
    })
}

/// `{"name", "description", "tags", "isPublic"}` body for collection updates.
pub(super) fn update_collection_payload(collection: &Collection) -> Result<Value, GatewayError> {
    to_json(&UpdateCollectionRequestDto {
        name: collection.name.as_str(),
        description: collection.description.as_str(),
        tags: collection.tags.as_slice(),
        is_public: collection.is_public,
    })
}

/// `{"recipeId"}` body for adding a recipe to a collection.
pub(super) fn add_recipe_payload(recipe_id: &RecipeId) -> Result<Value, GatewayError> {
    to_json(&AddRecipeRequestDto {
        recipe_id: recipe_id.as_str(),
    })
}

/// Map a collection DTO into the domain. Blank member ids are skipped.
pub(super) fn collection_from_dto(dto: CollectionDto) -> Collection {
    Collection {
        id: CollectionId::new(dto.collection_id).ok(),
        name: dto.name,
        description: dto.description.unwrap_or_default(),
        recipe_ids: dto
            .recipe_ids
            .into_iter()
            .filter_map(|raw| RecipeId::new(raw).ok())
            .collect(),
        recipes: dto
            .recipes
            .map(|recipes| recipes.into_iter().map(recipe_from_dto).collect()),
        tags: dto.tags,
        image_url: dto.image_url,
        is_public: dto.is_public,
        created_at: parse_timestamp(dto.created_at.as_deref()),
        updated_at: parse_timestamp(dto.updated_at.as_deref()),
    }
}

/// Map the profile envelope into the domain user.
pub(super) fn user_from_profile(dto: ProfileDto, subject_id: Option<String>) -> UpstreamUser {
    UpstreamUser {
        id: subject_id,
        username: dto.user_info.username,
        description: dto.user_info.description,
        picture: dto.user_info.picture,
    }
}

#[cfg(test)]
mod tests {
    //! Mapping coverage for recipe and collection payloads.
    use super::*;
    use serde_json::json;

    fn sample_recipe() -> Recipe {
        let mut recipe = Recipe::new("Tomatensuppe");
        recipe.description = "Schnell".to_owned();
        recipe.ingredients = vec![Ingredient::new("500 g Tomaten")];
        recipe.preparation_time_minutes = 10;
        recipe.cooking_time_minutes = 20;
        recipe.portions = 2;
        recipe.tools = vec!["TM6".to_owned()];
        let mut second = CookingStep::new(2, "pürieren");
        second.time_seconds = Some(30);
        second.speed = Some(10);
        second.use_turbo = true;
        recipe.steps = vec![second, CookingStep::new(1, "Tomaten waschen")];
        recipe
    }

    #[test]
    fn update_payload_renders_steps_in_order_with_seconds() {
        let payload = update_recipe_payload(&sample_recipe()).expect("valid recipe");
        assert_eq!(payload["recipeName"], "Tomatensuppe");
        assert_eq!(payload["totalTime"], 1_800);
        assert_eq!(payload["prepTime"], 600);
        assert_eq!(payload["yield"], json!({"value": 2, "unitText": "portion"}));
        assert_eq!(
            payload["ingredients"],
            json!([{"type": "INGREDIENT", "text": "500 g Tomaten"}])
        );
        assert_eq!(
            payload["instructions"],
            json!([
                {"type": "STEP", "text": "Tomaten waschen"},
                {"type": "STEP", "text": "<nobr>30 Sek./Turbo</nobr> pürieren"},
            ])
        );
        assert!(payload.get("imageUrl").is_none());
    }

    #[test]
    fn update_payload_rejects_broken_step_order() {
        let mut recipe = sample_recipe();
        recipe.steps[0].order = 5;
        let err = update_recipe_payload(&recipe).expect_err("invalid order");
        assert_eq!(err.kind(), crate::domain::ErrorKind::Validation);
    }

    #[test]
    fn create_payload_only_carries_name() {
        let payload = create_recipe_payload(&sample_recipe()).expect("serialisable");
        assert_eq!(payload, json!({"recipeName": "Tomatensuppe"}));
    }

    #[test]
    fn recipe_read_converts_times_and_assigns_order() {
        let dto: RecipeDto = serde_json::from_value(json!({
            "recipeId": "r-1",
            "recipeName": "Brot",
            "instructions": [
                {"type": "STEP", "text": "<nobr>3 Min./Stufe 4</nobr> kneten"},
                {"type": "STEP", "text": "backen"}
            ],
            "totalTime": 3_600,
            "prepTime": 900,
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .expect("valid dto");

        let recipe = recipe_from_dto(dto);
        assert_eq!(recipe.id.as_ref().map(RecipeId::as_str), Some("r-1"));
        assert_eq!(recipe.preparation_time_minutes, 15);
        assert_eq!(recipe.cooking_time_minutes, 45);
        assert_eq!(recipe.portions, DEFAULT_PORTIONS);
        assert_eq!(recipe.steps[0].order, 1);
        assert_eq!(recipe.steps[0].text, "<nobr>3 Min./Stufe 4</nobr> kneten");
        assert!(!recipe.steps[0].has_parameters());
        assert_eq!(recipe.steps[1].order, 2);
        assert!(recipe.created_at.is_some());
        assert!(recipe.updated_at.is_none());
    }

    #[test]
    fn cooking_time_needs_both_times() {
        let dto: RecipeDto =
            serde_json::from_value(json!({"recipeId": "r", "totalTime": 600})).expect("valid dto");
        let recipe = recipe_from_dto(dto);
        assert_eq!(recipe.cooking_time_minutes, 0);
        assert_eq!(recipe.preparation_time_minutes, 0);
    }

    #[test]
    fn collection_read_skips_blank_members() {
        let dto: CollectionDto = serde_json::from_value(json!({
            "collectionId": "c-1",
            "name": "Suppen",
            "recipeIds": ["r-1", " "],
            "recipes": [{"recipeId": "r-1", "recipeName": "Suppe"}]
        }))
        .expect("valid dto");
        let collection = collection_from_dto(dto);
        assert_eq!(collection.recipe_count(), 1);
        assert_eq!(collection.recipes.map(|recipes| recipes.len()), Some(1));
    }

    #[test]
    fn collection_update_payload_uses_camel_case() {
        let mut collection = Collection::new("Suppen");
        collection.tags = vec!["winter".to_owned()];
        collection.is_public = true;
        let payload = update_collection_payload(&collection).expect("serialisable");
        assert_eq!(
            payload,
            json!({"name": "Suppen", "description": "", "tags": ["winter"], "isPublic": true})
        );
    }
}
