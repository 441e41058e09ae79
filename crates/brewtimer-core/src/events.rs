use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::BrewSummary;

/// Every state change of a brew session produces an Event.
/// Surfaces render snapshots; notifiers and the history writer consume these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BrewStarted {
        recipe_id: String,
        step_index: usize,
        step_name: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A new step began, either by natural countdown or by skipping.
    StepStarted {
        step_index: usize,
        step_name: String,
        duration_secs: u64,
        target_water: Option<f64>,
        at: DateTime<Utc>,
    },
    /// A step's countdown reached zero.
    StepCompleted {
        step_index: usize,
        step_name: String,
        at: DateTime<Utc>,
    },
    /// The last step completed and the session is counting overtime.
    OvertimeEntered {
        step_index: usize,
        at: DateTime<Utc>,
    },
    StepSkipped {
        from_step: usize,
        to_step: usize,
        at: DateTime<Utc>,
    },
    StepJumped {
        from_step: usize,
        to_step: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left: u64,
        overtime_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_left: u64,
        overtime_seconds: u64,
        at: DateTime<Utc>,
    },
    BrewFinished {
        summary: BrewSummary,
        at: DateTime<Utc>,
    },
    BrewReset {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Events meant for the notification dispatcher.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Event::StepStarted { .. } | Event::StepCompleted { .. } | Event::OvertimeEntered { .. }
        )
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::BrewStarted { at, .. }
            | Event::StepStarted { at, .. }
            | Event::StepCompleted { at, .. }
            | Event::OvertimeEntered { at, .. }
            | Event::StepSkipped { at, .. }
            | Event::StepJumped { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::BrewFinished { at, .. }
            | Event::BrewReset { at } => *at,
        }
    }

    /// Short machine-readable name, matching the serde tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BrewStarted { .. } => "BrewStarted",
            Event::StepStarted { .. } => "StepStarted",
            Event::StepCompleted { .. } => "StepCompleted",
            Event::OvertimeEntered { .. } => "OvertimeEntered",
            Event::StepSkipped { .. } => "StepSkipped",
            Event::StepJumped { .. } => "StepJumped",
            Event::TimerPaused { .. } => "TimerPaused",
            Event::TimerResumed { .. } => "TimerResumed",
            Event::BrewFinished { .. } => "BrewFinished",
            Event::BrewReset { .. } => "BrewReset",
        }
    }
}
