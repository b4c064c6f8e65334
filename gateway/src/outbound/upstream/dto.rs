//! Wire DTOs for the recipe platform and its account host.
//!
//! Requests serialise from these shapes and responses decode into them
//! before [`super::mapper`] turns them into domain entities.

use serde::{Deserialize, Deserializer, Serialize, de};

pub(super) const INGREDIENT_TYPE: &str = "INGREDIENT";
pub(super) const STEP_TYPE: &str = "STEP";
pub(super) const PORTION_UNIT: &str = "portion";

/// Identity fields must be present and non-blank; anything else is not the
/// entity we asked for.
fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Err(de::Error::custom("identifier must not be blank"));
    }
    Ok(raw)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateRecipeRequestDto<'a> {
    pub(super) recipe_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateRecipeResponseDto {
    pub(super) recipe_id: String,
    #[serde(default)]
    pub(super) recipe_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateRecipeRequestDto {
    pub(super) recipe_name: String,
    pub(super) description: String,
    pub(super) ingredients: Vec<TypedTextDto>,
    pub(super) instructions: Vec<TypedTextDto>,
    pub(super) tools: Vec<String>,
    pub(super) total_time: u64,
    pub(super) prep_time: u64,
    #[serde(rename = "yield")]
    pub(super) recipe_yield: YieldDto,
    pub(super) tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) image_url: Option<String>,
    pub(super) notes: String,
    pub(super) is_public: bool,
}

/// `{type, text}` pair used for both ingredients and instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct TypedTextDto {
    #[serde(rename = "type", default)]
    pub(super) kind: String,
    #[serde(default)]
    pub(super) text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct YieldDto {
    pub(super) value: u32,
    #[serde(default)]
    pub(super) unit_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RecipeDto {
    #[serde(deserialize_with = "non_blank")]
    pub(super) recipe_id: String,
    #[serde(default)]
    pub(super) recipe_name: String,
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) ingredients: Vec<TypedTextDto>,
    #[serde(default)]
    pub(super) instructions: Vec<TypedTextDto>,
    #[serde(default)]
    pub(super) tools: Vec<String>,
    pub(super) total_time: Option<u64>,
    pub(super) prep_time: Option<u64>,
    #[serde(rename = "yield")]
    pub(super) recipe_yield: Option<YieldDto>,
    #[serde(default)]
    pub(super) tags: Vec<String>,
    pub(super) image_url: Option<String>,
    pub(super) notes: Option<String>,
    #[serde(default)]
    pub(super) is_public: bool,
    pub(super) created_at: Option<String>,
    pub(super) updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecipeListDto {
    pub(super) recipes: Vec<RecipeDto>,
    pub(super) total: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateCollectionRequestDto<'a> {
    pub(super) name: &'a str,
    pub(super) description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateCollectionRequestDto<'a> {
    pub(super) name: &'a str,
    pub(super) description: &'a str,
    pub(super) tags: &'a [String],
    pub(super) is_public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CollectionDto {
    #[serde(deserialize_with = "non_blank")]
    pub(super) collection_id: String,
    #[serde(default)]
    pub(super) name: String,
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) recipe_ids: Vec<String>,
    pub(super) recipes: Option<Vec<RecipeDto>>,
    #[serde(default)]
    pub(super) tags: Vec<String>,
    pub(super) image_url: Option<String>,
    #[serde(default)]
    pub(super) is_public: bool,
    pub(super) created_at: Option<String>,
    pub(super) updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CollectionListDto {
    pub(super) collections: Vec<CollectionDto>,
    pub(super) total: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddRecipeRequestDto<'a> {
    pub(super) recipe_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileDto {
    pub(super) user_info: UserInfoDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfoDto {
    #[serde(default)]
    pub(super) username: String,
    pub(super) description: Option<String>,
    pub(super) picture: Option<String>,
}

/// OAuth token endpoint response; field names are snake_case on the wire.
#[derive(Deserialize)]
pub(super) struct TokenResponseDto {
    pub(super) access_token: String,
    pub(super) refresh_token: Option<String>,
    #[serde(default)]
    pub(super) token_type: Option<String>,
    pub(super) expires_in: i64,
    pub(super) sub: Option<String>,
}
