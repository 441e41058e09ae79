//! SQLite-backed brew history.
//!
//! Stores one row per finished brew session and answers simple
//! aggregate queries for the CLI.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::BrewSummary;

/// A finished brew as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrewRecord {
    pub id: i64,
    #[serde(flatten)]
    pub summary: BrewSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BrewStats {
    pub total_brews: u64,
    pub finished_early: u64,
    pub total_brew_secs: u64,
    pub total_overtime_secs: u64,
    pub today_brews: u64,
    pub favourite_recipe: Option<String>,
}

/// SQLite database for brew history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/brewtimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("brewtimer.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS brews (
                    id              INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id      TEXT NOT NULL UNIQUE,
                    recipe_id       TEXT NOT NULL,
                    recipe_name     TEXT NOT NULL DEFAULT '',
                    completed_steps TEXT NOT NULL DEFAULT '[]',
                    total_steps     INTEGER NOT NULL,
                    elapsed_secs    INTEGER NOT NULL,
                    overtime_secs   INTEGER NOT NULL DEFAULT 0,
                    finished_early  INTEGER NOT NULL DEFAULT 0,
                    started_at      TEXT NOT NULL,
                    finished_at     TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_brews_finished_at ON brews(finished_at);
                CREATE INDEX IF NOT EXISTS idx_brews_recipe_id ON brews(recipe_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a finished brew.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including when the session was
    /// already recorded.
    pub fn record_brew(&self, summary: &BrewSummary) -> Result<i64> {
        let completed = serde_json::to_string(&summary.completed_steps)?;
        self.conn.execute(
            "INSERT INTO brews (session_id, recipe_id, recipe_name, completed_steps, total_steps,
                                elapsed_secs, overtime_secs, finished_early, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                summary.session_id.to_string(),
                summary.recipe_id,
                summary.recipe_name,
                completed,
                summary.total_steps as i64,
                summary.elapsed_secs as i64,
                summary.overtime_secs as i64,
                summary.finished_early,
                summary.started_at.to_rfc3339(),
                summary.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent brews first.
    pub fn list_brews(&self, limit: usize) -> Result<Vec<BrewRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, recipe_id, recipe_name, completed_steps, total_steps,
                    elapsed_secs, overtime_secs, finished_early, started_at, finished_at
             FROM brews
             ORDER BY finished_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, bool>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                id,
                session_id,
                recipe_id,
                recipe_name,
                completed,
                total_steps,
                elapsed_secs,
                overtime_secs,
                finished_early,
                started_at,
                finished_at,
            ) = row?;
            records.push(BrewRecord {
                id,
                summary: BrewSummary {
                    session_id: Uuid::parse_str(&session_id)
                        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                    recipe_id,
                    recipe_name,
                    completed_steps: serde_json::from_str(&completed)?,
                    total_steps: total_steps as usize,
                    elapsed_secs: elapsed_secs as u64,
                    overtime_secs: overtime_secs as u64,
                    finished_early,
                    started_at: parse_timestamp(&started_at)?,
                    finished_at: parse_timestamp(&finished_at)?,
                },
            });
        }
        Ok(records)
    }

    pub fn brew_stats(&self) -> Result<BrewStats> {
        let (total_brews, finished_early, total_brew_secs, total_overtime_secs) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(finished_early), 0),
                        COALESCE(SUM(elapsed_secs), 0), COALESCE(SUM(overtime_secs), 0)
                 FROM brews",
                [],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, u64>(1)?,
                        row.get::<_, u64>(2)?,
                        row.get::<_, u64>(3)?,
                    ))
                },
            )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_brews = self.conn.query_row(
            "SELECT COUNT(*) FROM brews WHERE finished_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| row.get::<_, u64>(0),
        )?;

        let favourite_recipe = match self.conn.query_row(
            "SELECT recipe_id FROM brews
             GROUP BY recipe_id
             ORDER BY COUNT(*) DESC, MAX(finished_at) DESC
             LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(BrewStats {
            total_brews,
            finished_early,
            total_brew_secs,
            total_overtime_secs,
            today_brews,
            favourite_recipe,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")).into())
}
