mod config;
pub mod database;
mod history;

pub use config::{BrewingConfig, Config, HistoryConfig, NotificationsConfig};
pub use database::{BrewRecord, BrewStats, Database};
pub use history::{HistoryWriter, SqliteHistory};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the brewtimer data directory, creating it if needed.
///
/// Resolution order:
/// - `BREWTIMER_DATA_DIR`, used verbatim
/// - `~/.config/brewtimer-dev/` when `BREWTIMER_ENV=dev`
/// - `~/.config/brewtimer/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("BREWTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BREWTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("brewtimer-dev")
            } else {
                base_dir.join("brewtimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
