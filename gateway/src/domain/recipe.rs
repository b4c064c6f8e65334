//! Recipe aggregate: ingredients and Thermomix cooking steps.

use chrono::{DateTime, Utc};

use super::RecipeId;

/// Default number of portions when upstream omits the yield.
pub const DEFAULT_PORTIONS: u32 = 4;
/// Highest temperature the appliance accepts, in degrees Celsius.
pub const MAX_TEMPERATURE_CELSIUS: u16 = 120;
/// Highest numeric mixing speed.
pub const MAX_SPEED: u8 = 10;

/// One ingredient line including quantity, e.g. `"200 g Mehl"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    /// Free text shown to the cook.
    pub text: String,
}

impl Ingredient {
    /// Build an ingredient from its display text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One preparation step with optional appliance parameters.
///
/// `use_turbo` overrides the rendered speed and `use_varoma` overrides the
/// rendered temperature; see [`crate::domain::format_step_text`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CookingStep {
    /// Free-text instruction.
    pub text: String,
    /// 1-based position within the recipe.
    pub order: u32,
    /// Duration in seconds.
    pub time_seconds: Option<u32>,
    /// Temperature in degrees Celsius, 0 to 120.
    pub temperature: Option<u16>,
    /// Mixing speed, 0 to 10.
    pub speed: Option<u8>,
    /// Render the speed as `Turbo`.
    pub use_turbo: bool,
    /// Append `Linkslauf` to a numeric speed.
    pub use_reverse_rotation: bool,
    /// Render the temperature as `Varoma`.
    pub use_varoma: bool,
}

impl CookingStep {
    /// Build a plain step without appliance parameters.
    pub fn new(order: u32, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            order,
            ..Self::default()
        }
    }

    /// Return whether any of time, temperature or speed is set.
    pub fn has_parameters(&self) -> bool {
        self.time_seconds.is_some() || self.temperature.is_some() || self.speed.is_some()
    }
}

/// Validation failures for recipe step lists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeValidationError {
    /// Step orders are not exactly `1..=n`.
    #[error("step orders must be unique and contiguous from 1; found {found:?}")]
    NonContiguousOrder {
        /// Orders as supplied, sorted ascending.
        found: Vec<u32>,
    },
    /// Temperature outside the appliance range.
    #[error("step {order}: temperature {value} exceeds {MAX_TEMPERATURE_CELSIUS}°C")]
    TemperatureOutOfRange {
        /// Offending step order.
        order: u32,
        /// Supplied temperature.
        value: u16,
    },
    /// Speed outside the appliance range.
    #[error("step {order}: speed {value} exceeds {MAX_SPEED}")]
    SpeedOutOfRange {
        /// Offending step order.
        order: u32,
        /// Supplied speed.
        value: u8,
    },
}

/// Recipe as seen by callers of the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Upstream identifier; `None` until created.
    pub id: Option<RecipeId>,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Ingredient lines in display order.
    pub ingredients: Vec<Ingredient>,
    /// Preparation steps.
    pub steps: Vec<CookingStep>,
    /// Preparation time in minutes.
    pub preparation_time_minutes: u32,
    /// Cooking time in minutes.
    pub cooking_time_minutes: u32,
    /// Number of portions.
    pub portions: u32,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Supported appliances, e.g. `TM6`.
    pub tools: Vec<String>,
    /// Cover image.
    pub image_url: Option<String>,
    /// Additional notes.
    pub notes: String,
    /// Whether the recipe is publicly visible.
    pub is_public: bool,
    /// Creation timestamp reported by upstream.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp reported by upstream.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// Start a new, not yet persisted recipe.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            preparation_time_minutes: 0,
            cooking_time_minutes: 0,
            portions: DEFAULT_PORTIONS,
            tags: Vec::new(),
            tools: Vec::new(),
            image_url: None,
            notes: String::new(),
            is_public: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Total time in minutes.
    pub fn total_time_minutes(&self) -> u32 {
        self.preparation_time_minutes
            .saturating_add(self.cooking_time_minutes)
    }

    /// Return the steps sorted by order after checking their invariants.
    ///
    /// # Errors
    ///
    /// Fails when orders are not exactly `1..=n` or a step parameter is out
    /// of the appliance range.
    pub fn ordered_steps(&self) -> Result<Vec<&CookingStep>, RecipeValidationError> {
        let mut steps: Vec<&CookingStep> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.order);

        let contiguous = steps
            .iter()
            .zip(1_u32..)
            .all(|(step, expected)| step.order == expected);
        if !contiguous {
            return Err(RecipeValidationError::NonContiguousOrder {
                found: steps.iter().map(|step| step.order).collect(),
            });
        }

        for step in &steps {
            if let Some(value) = step.temperature.filter(|t| *t > MAX_TEMPERATURE_CELSIUS) {
                return Err(RecipeValidationError::TemperatureOutOfRange {
                    order: step.order,
                    value,
                });
            }
            if let Some(value) = step.speed.filter(|s| *s > MAX_SPEED) {
                return Err(RecipeValidationError::SpeedOutOfRange {
                    order: step.order,
                    value,
                });
            }
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for step ordering invariants.
    use super::*;
    use rstest::rstest;

    fn recipe_with_orders(orders: &[u32]) -> Recipe {
        let mut recipe = Recipe::new("Suppe");
        recipe.steps = orders
            .iter()
            .map(|order| CookingStep::new(*order, format!("step {order}")))
            .collect();
        recipe
    }

    #[test]
    fn steps_are_returned_sorted() {
        let recipe = recipe_with_orders(&[3, 1, 2]);
        let orders: Vec<u32> = recipe
            .ordered_steps()
            .expect("valid orders")
            .iter()
            .map(|step| step.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[rstest]
    #[case::gap(&[1, 3])]
    #[case::duplicate(&[1, 1, 2])]
    #[case::zero_based(&[0, 1])]
    fn broken_orders_are_rejected(#[case] orders: &[u32]) {
        let err = recipe_with_orders(orders)
            .ordered_steps()
            .expect_err("orders must be rejected");
        assert!(matches!(err, RecipeValidationError::NonContiguousOrder { .. }));
    }

    #[test]
    fn empty_step_list_is_valid() {
        assert!(Recipe::new("Leer").ordered_steps().expect("valid").is_empty());
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut recipe = recipe_with_orders(&[1]);
        recipe.steps[0].temperature = Some(130);
        assert_eq!(
            recipe.ordered_steps().expect_err("too hot"),
            RecipeValidationError::TemperatureOutOfRange {
                order: 1,
                value: 130
            }
        );

        recipe.steps[0].temperature = Some(100);
        recipe.steps[0].speed = Some(11);
        assert_eq!(
            recipe.ordered_steps().expect_err("too fast"),
            RecipeValidationError::SpeedOutOfRange { order: 1, value: 11 }
        );
    }

    #[test]
    fn total_time_adds_preparation_and_cooking() {
        let mut recipe = Recipe::new("Brot");
        recipe.preparation_time_minutes = 15;
        recipe.cooking_time_minutes = 40;
        assert_eq!(recipe.total_time_minutes(), 55);
    }
}
