//! Recipe lookup CLI commands.

use std::path::PathBuf;

use brewtimer_core::{format_clock, Recipe, RecipeStore};
use clap::Subcommand;

use crate::view;

#[derive(Subcommand)]
pub enum RecipeAction {
    /// List user and built-in recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one recipe with its steps
    Show {
        /// Recipe id or path to a TOML file
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a recipe file can be brewed
    ///
    /// # TOML Format
    ///
    /// ```text
    /// id = "aeropress"
    /// name = "AeroPress"
    /// coffee_grams = 15.0
    /// water_grams = 240.0
    ///
    /// [[steps]]
    /// name = "Bloom"
    /// duration_secs = 30
    /// water_amount = 40.0
    /// ```
    Validate {
        /// Path to the recipe TOML file
        path: PathBuf,
    },
}

pub fn run(action: RecipeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RecipeAction::List { json } => list_recipes(json),
        RecipeAction::Show { recipe, json } => show_recipe(&recipe, json),
        RecipeAction::Validate { path } => validate_recipe(path),
    }
}

fn list_recipes(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecipeStore::open()?;
    let recipes = store.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    println!("Recipes ({}):", recipes.len());
    for recipe in &recipes {
        println!(
            "  {:<16} {} ({} steps, {})",
            recipe.id,
            recipe.name,
            recipe.steps.len(),
            format_clock(recipe.total_duration_secs())
        );
    }
    Ok(())
}

fn show_recipe(reference: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = RecipeStore::open()?.resolve(reference)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!("{}", view::recipe_detail(&recipe));
    }
    Ok(())
}

fn validate_recipe(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = Recipe::load(&path)?;
    recipe.validate()?;
    println!(
        "ok: {} ({} steps, {})",
        recipe.id,
        recipe.steps.len(),
        format_clock(recipe.total_duration_secs())
    );
    Ok(())
}
