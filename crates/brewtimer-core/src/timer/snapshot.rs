use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the mutually exclusive lifecycle states the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrewPhase {
    Idle,
    Running,
    Paused,
    /// Last step counted down; waiting for the user to finish.
    Overtime,
    Finished,
}

/// Complete observable state of a brew session at one instant.
///
/// Surfaces render from this and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: BrewPhase,
    pub current_step_index: usize,
    pub step_name: String,
    pub step_duration: u64,
    /// Seconds left in the current step. 0 in overtime.
    pub time_left: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_overtime: bool,
    pub overtime_seconds: u64,
    pub completed_steps: BTreeSet<usize>,
    pub has_started: bool,
    pub is_finished: bool,
    pub total_steps: usize,
    /// Cumulative water expected by the end of the current step.
    pub target_water: Option<f64>,
    /// Every effective tick so far, overtime included.
    pub elapsed_seconds: u64,
    pub progress_pct: f64,
}

impl TimerSnapshot {
    pub fn is_last_step(&self) -> bool {
        self.current_step_index + 1 == self.total_steps
    }

    pub fn current_step_completed(&self) -> bool {
        self.completed_steps.contains(&self.current_step_index)
    }
}

/// Final record of a session, handed to the history writer on finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewSummary {
    pub session_id: Uuid,
    pub recipe_id: String,
    pub recipe_name: String,
    pub completed_steps: Vec<usize>,
    pub total_steps: usize,
    /// Total ticked seconds including overtime.
    pub elapsed_secs: u64,
    pub overtime_secs: u64,
    /// True when the last step never counted down.
    pub finished_early: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Format seconds as `mm:ss`, growing to `h:mm:ss` past an hour.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
