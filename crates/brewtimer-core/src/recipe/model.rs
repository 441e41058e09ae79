use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result, ValidationError};

/// One timed phase of a brew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub name: String,
    /// Target duration in seconds. Must be non-zero.
    pub duration_secs: u64,
    /// Water poured during this step, in grams.
    #[serde(default)]
    pub water_amount: Option<f64>,
    #[serde(default)]
    pub description: String,
}

impl RecipeStep {
    pub fn new(name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
            water_amount: None,
            description: String::new(),
        }
    }

    pub fn with_water(mut self, grams: f64) -> Self {
        self.water_amount = Some(grams);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A brewing recipe.
///
/// Everything except `steps` is metadata the timer carries through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub coffee_grams: Option<f64>,
    #[serde(default)]
    pub water_grams: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub grind: Option<String>,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<RecipeStep>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            method: String::new(),
            coffee_grams: None,
            water_grams: None,
            temperature_c: None,
            grind: None,
            steps,
        }
    }

    /// Parse a recipe from TOML text.
    ///
    /// # Errors
    /// Returns [`ConfigError::ParseFailed`] if the text is not a valid recipe.
    /// Step validation is left to [`Recipe::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let recipe: Recipe = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(recipe)
    }

    /// Load a recipe from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Custom(e.to_string()))
    }

    /// Water-to-coffee ratio, when both amounts are known.
    pub fn ratio(&self) -> Option<f64> {
        match (self.coffee_grams, self.water_grams) {
            (Some(coffee), Some(water)) if coffee > 0.0 => Some(water / coffee),
            _ => None,
        }
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_secs).sum()
    }

    /// Check the preconditions the timer relies on.
    ///
    /// # Errors
    /// - [`ValidationError::EmptyCollection`] when the recipe has no steps
    /// - [`ValidationError::InvalidValue`] for a zero duration or a negative
    ///   or non-finite water amount
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "recipe '{}' has no steps",
                self.id
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.duration_secs == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("steps[{i}].duration_secs"),
                    message: "duration must be greater than zero".into(),
                });
            }
            if let Some(water) = step.water_amount {
                if !water.is_finite() || water < 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("steps[{i}].water_amount"),
                        message: format!("expected a non-negative amount, got {water}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AEROPRESS: &str = r#"
id = "aeropress"
name = "AeroPress Inverted"
method = "aeropress"
coffee_grams = 15.0
water_grams = 240.0

[[steps]]
name = "Bloom"
duration_secs = 30
water_amount = 50.0

[[steps]]
name = "Fill"
duration_secs = 60
water_amount = 190.0

[[steps]]
name = "Press"
duration_secs = 30
"#;

    #[test]
    fn parses_toml_recipe() {
        let recipe = Recipe::from_toml_str(AEROPRESS).unwrap();
        assert_eq!(recipe.id, "aeropress");
        assert_eq!(recipe.steps.len(), 3);
        assert_eq!(recipe.steps[2].water_amount, None);
        assert_eq!(recipe.total_duration_secs(), 120);
        assert_eq!(recipe.ratio(), Some(16.0));
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn missing_steps_table_fails_validation() {
        let recipe = Recipe::from_toml_str("id = \"empty\"\nname = \"Empty\"\n").unwrap();
        assert!(matches!(
            recipe.validate(),
            Err(ValidationError::EmptyCollection(_))
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let recipe = Recipe::new("r", "R", vec![RecipeStep::new("Bloom", 0)]);
        match recipe.validate() {
            Err(ValidationError::InvalidValue { field, .. }) => {
                assert_eq!(field, "steps[0].duration_secs")
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn negative_water_is_rejected() {
        let recipe = Recipe::new(
            "r",
            "R",
            vec![RecipeStep::new("Pour", 10).with_water(-5.0)],
        );
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn ratio_needs_both_amounts() {
        let mut recipe = Recipe::new("r", "R", vec![RecipeStep::new("Pour", 10)]);
        assert_eq!(recipe.ratio(), None);
        recipe.coffee_grams = Some(20.0);
        recipe.water_grams = Some(300.0);
        assert_eq!(recipe.ratio(), Some(15.0));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aeropress.toml");
        std::fs::write(&path, AEROPRESS).unwrap();
        let recipe = Recipe::load(&path).unwrap();
        assert_eq!(recipe.name, "AeroPress Inverted");
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = Recipe::load(Path::new("/nonexistent/recipe.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/recipe.toml"));
    }
}
