use std::sync::Mutex;

use tracing::info;

use super::Database;
use crate::error::{CoreError, Result};
use crate::timer::BrewSummary;

/// Receives the final summary of every finished brew, exactly once.
///
/// The session does not retry a failed write; implementations decide
/// whether a failure matters.
pub trait HistoryWriter: Send + Sync {
    fn record(&self, summary: &BrewSummary) -> Result<()>;
}

/// [`HistoryWriter`] backed by the SQLite [`Database`].
pub struct SqliteHistory {
    db: Mutex<Database>,
}

impl SqliteHistory {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Run a read query against the underlying database.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|e| CoreError::Custom(format!("history database lock poisoned: {e}")))?;
        f(&db)
    }
}

impl HistoryWriter for SqliteHistory {
    fn record(&self, summary: &BrewSummary) -> Result<()> {
        let id = self.with_db(|db| db.record_brew(summary))?;
        info!(
            "Saved brew {} ({}) as history entry {}",
            summary.session_id, summary.recipe_id, id
        );
        Ok(())
    }
}
