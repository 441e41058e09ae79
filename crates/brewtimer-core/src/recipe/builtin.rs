use super::{Recipe, RecipeStep};
use crate::error::ValidationError;

impl Recipe {
    /// Hario V60, 15 g coffee to 250 g water.
    pub fn v60() -> Self {
        Self {
            id: "v60".into(),
            name: "Hario V60".into(),
            method: "pour-over".into(),
            coffee_grams: Some(15.0),
            water_grams: Some(250.0),
            temperature_c: Some(94.0),
            grind: Some("medium-fine".into()),
            steps: vec![
                RecipeStep::new("Bloom", 45)
                    .with_water(50.0)
                    .with_description("Wet all the grounds and let them degas"),
                RecipeStep::new("First Pour", 30).with_water(100.0),
                RecipeStep::new("Second Pour", 30).with_water(100.0),
                RecipeStep::new("Drawdown", 60).with_description("Let the bed drain flat"),
            ],
        }
    }

    /// Classic four-minute French press.
    pub fn french_press() -> Self {
        Self {
            id: "french-press".into(),
            name: "French Press".into(),
            method: "immersion".into(),
            coffee_grams: Some(30.0),
            water_grams: Some(500.0),
            temperature_c: Some(96.0),
            grind: Some("coarse".into()),
            steps: vec![
                RecipeStep::new("Pour", 20).with_water(500.0),
                RecipeStep::new("Steep", 220),
                RecipeStep::new("Plunge", 20).with_description("Press slowly and serve"),
            ],
        }
    }

    pub fn builtins() -> Vec<Recipe> {
        vec![Self::v60(), Self::french_press()]
    }

    /// Look up a built-in recipe by id.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownRecipe`] if no built-in matches.
    pub fn builtin(id: &str) -> Result<Recipe, ValidationError> {
        Self::builtins()
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ValidationError::UnknownRecipe(id.to_string()))
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::v60()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid() {
        for recipe in Recipe::builtins() {
            assert!(recipe.validate().is_ok(), "{} failed validation", recipe.id);
        }
    }

    #[test]
    fn builtin_water_matches_metadata() {
        for recipe in Recipe::builtins() {
            let poured: f64 = recipe.steps.iter().filter_map(|s| s.water_amount).sum();
            assert_eq!(Some(poured), recipe.water_grams, "{}", recipe.id);
        }
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(Recipe::builtin("french-press").unwrap().steps.len(), 3);
        assert!(matches!(
            Recipe::builtin("chemex"),
            Err(ValidationError::UnknownRecipe(_))
        ));
    }
}
