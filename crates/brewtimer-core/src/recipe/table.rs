use serde::Serialize;

use super::{Recipe, RecipeStep};
use crate::error::{Result, ValidationError};

/// Immutable, validated step list for one brew session.
///
/// Built once from a [`Recipe`]; the engine reads it but never mutates it.
/// Always holds at least one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTable {
    recipe_id: String,
    recipe_name: String,
    steps: Vec<RecipeStep>,
}

impl StepTable {
    /// Build a step table from a recipe.
    ///
    /// # Errors
    /// Fails with a validation error if the recipe has no steps or a step
    /// is malformed.
    pub fn from_recipe(recipe: &Recipe) -> Result<Self> {
        recipe.validate()?;
        Ok(Self {
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            steps: recipe.steps.clone(),
        })
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn recipe_name(&self) -> &str {
        &self.recipe_name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a built table.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index)
    }

    /// Like [`StepTable::get`], but an out-of-range index is an error.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfBounds`] naming this recipe.
    pub fn step(&self, index: usize) -> Result<&RecipeStep, ValidationError> {
        self.steps
            .get(index)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: format!("steps of recipe '{}'", self.recipe_id),
                index,
                len: self.steps.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeStep> {
        self.steps.iter()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn is_last(&self, index: usize) -> bool {
        index == self.last_index()
    }

    /// Duration of the step at `index`, or 0 when out of range.
    pub fn duration_secs(&self, index: usize) -> u64 {
        self.get(index).map(|s| s.duration_secs).unwrap_or(0)
    }

    /// Water expected in the brewer by the end of step `index`.
    ///
    /// `None` when no step up to and including `index` pours water.
    pub fn cumulative_water(&self, index: usize) -> Option<f64> {
        let mut any = false;
        let total: f64 = self
            .steps
            .iter()
            .take(index.saturating_add(1))
            .filter_map(|s| s.water_amount)
            .inspect(|_| any = true)
            .sum();
        any.then_some(total)
    }

    pub fn total_water(&self) -> Option<f64> {
        self.cumulative_water(self.last_index())
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_secs).sum()
    }

    /// Seconds scheduled before step `index` begins.
    pub fn cumulative_secs(&self, index: usize) -> u64 {
        self.steps.iter().take(index).map(|s| s.duration_secs).sum()
    }

    /// 0.0 ..= 100.0 progress across the whole recipe.
    pub fn progress_pct(&self, index: usize, time_left: u64) -> f64 {
        let total = self.total_duration_secs();
        if total == 0 {
            return 0.0;
        }
        let elapsed_in_step = self.duration_secs(index).saturating_sub(time_left);
        let done = self.cumulative_secs(index) + elapsed_in_step;
        (done as f64 / total as f64 * 100.0).min(100.0)
    }
}
