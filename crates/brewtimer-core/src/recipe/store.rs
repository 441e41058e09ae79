//! Read-only lookup of user recipes.
//!
//! User recipes live as one TOML file per recipe under
//! `<data dir>/recipes/<id>.toml`. Authoring them is someone else's job;
//! this only resolves ids and paths to [`Recipe`] values.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::Recipe;
use crate::error::{Result, ValidationError};
use crate::storage::data_dir;

pub struct RecipeStore {
    dir: PathBuf,
}

impl RecipeStore {
    /// Open the store in the default data directory.
    pub fn open() -> Result<Self> {
        Ok(Self::with_dir(data_dir()?.join("recipes")))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every user recipe that parses, followed by the built-ins whose ids
    /// are not shadowed by a user file.
    pub fn list(&self) -> Result<Vec<Recipe>> {
        let mut recipes = Vec::new();
        if self.dir.is_dir() {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
                .collect();
            paths.sort();
            for path in paths {
                match Recipe::load(&path) {
                    Ok(recipe) => recipes.push(recipe),
                    Err(e) => warn!("skipping unreadable recipe {}: {}", path.display(), e),
                }
            }
        }
        for builtin in Recipe::builtins() {
            if !recipes.iter().any(|r| r.id == builtin.id) {
                recipes.push(builtin);
            }
        }
        Ok(recipes)
    }

    /// Resolve a recipe reference: an existing file path, a user recipe id,
    /// or a built-in id, in that order.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownRecipe`] when nothing matches, or the
    /// load error of a matching file.
    pub fn resolve(&self, reference: &str) -> Result<Recipe> {
        let as_path = Path::new(reference);
        if as_path.is_file() {
            return Recipe::load(as_path);
        }
        let user_file = self.dir.join(format!("{reference}.toml"));
        if user_file.is_file() {
            return Recipe::load(&user_file);
        }
        Recipe::builtin(reference).map_err(Into::into)
    }
}
