//! Brew timer engine.
//!
//! A tick-driven state machine with no internal thread: whoever owns it
//! calls [`BrewTimerEngine::tick`] once per elapsed second. In practice that
//! owner is [`SharedTimer`](crate::session::SharedTimer).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!      step boundary -> next step (Running) | last step (Overtime)
//!           |
//!        Finished
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BrewTimerEngine::from_recipe(&Recipe::v60())?;
//! engine.start();
//! // Once per second:
//! let events = engine.tick(); // StepCompleted / StepStarted / OvertimeEntered
//! ```
//!
//! Commands that make no sense in the current state return an empty event
//! list and change nothing.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::snapshot::{BrewPhase, BrewSummary, TimerSnapshot};
use crate::error::Result;
use crate::events::Event;
use crate::recipe::{Recipe, StepTable};

#[derive(Debug, Clone)]
pub struct BrewTimerEngine {
    steps: StepTable,
    session_id: Uuid,
    current_step_index: usize,
    /// Seconds left in the current step.
    time_left: u64,
    is_running: bool,
    is_paused: bool,
    is_overtime: bool,
    overtime_seconds: u64,
    completed_steps: BTreeSet<usize>,
    has_started: bool,
    elapsed_seconds: u64,
    started_at: Option<DateTime<Utc>>,
    /// Set by the first `finish()`; its presence means Finished.
    summary: Option<BrewSummary>,
}

impl BrewTimerEngine {
    /// Create an idle engine with the first step loaded.
    pub fn new(steps: StepTable) -> Self {
        let time_left = steps.duration_secs(0);
        Self {
            steps,
            session_id: Uuid::new_v4(),
            current_step_index: 0,
            time_left,
            is_running: false,
            is_paused: false,
            is_overtime: false,
            overtime_seconds: 0,
            completed_steps: BTreeSet::new(),
            has_started: false,
            elapsed_seconds: 0,
            started_at: None,
            summary: None,
        }
    }

    /// Validate `recipe` and build an idle engine for it.
    ///
    /// # Errors
    /// Fails if the recipe has no steps or a malformed step.
    pub fn from_recipe(recipe: &Recipe) -> Result<Self> {
        Ok(Self::new(StepTable::from_recipe(recipe)?))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn steps(&self) -> &StepTable {
        &self.steps
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_overtime(&self) -> bool {
        self.is_overtime
    }

    pub fn overtime_seconds(&self) -> u64 {
        self.overtime_seconds
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed_steps
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// The final summary, once finished.
    pub fn summary(&self) -> Option<&BrewSummary> {
        self.summary.as_ref()
    }

    /// True when the driver should be delivering ticks.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused && !self.is_finished()
    }

    pub fn phase(&self) -> BrewPhase {
        if self.is_finished() {
            BrewPhase::Finished
        } else if !self.has_started {
            BrewPhase::Idle
        } else if self.is_paused {
            BrewPhase::Paused
        } else if self.is_overtime {
            BrewPhase::Overtime
        } else {
            BrewPhase::Running
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let index = self.current_step_index;
        TimerSnapshot {
            phase: self.phase(),
            current_step_index: index,
            step_name: self
                .steps
                .get(index)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            step_duration: self.steps.duration_secs(index),
            time_left: self.time_left,
            is_running: self.is_running,
            is_paused: self.is_paused,
            is_overtime: self.is_overtime,
            overtime_seconds: self.overtime_seconds,
            completed_steps: self.completed_steps.clone(),
            has_started: self.has_started,
            is_finished: self.is_finished(),
            total_steps: self.steps.len(),
            target_water: self.steps.cumulative_water(index),
            elapsed_seconds: self.elapsed_seconds,
            progress_pct: self.steps.progress_pct(index, self.time_left),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        if self.has_started {
            debug!("start ignored: session already started");
            return Vec::new();
        }
        let now = Utc::now();
        self.has_started = true;
        self.is_running = true;
        self.is_paused = false;
        self.started_at = Some(now);
        self.time_left = self.steps.duration_secs(self.current_step_index);

        let step_name = self.current_step_name();
        vec![
            Event::BrewStarted {
                recipe_id: self.steps.recipe_id().to_string(),
                step_index: self.current_step_index,
                step_name,
                duration_secs: self.time_left,
                at: now,
            },
            self.step_started_event(),
        ]
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if !self.is_running || self.is_paused || self.is_finished() {
            debug!("pause ignored in phase {:?}", self.phase());
            return Vec::new();
        }
        self.is_paused = true;
        vec![Event::TimerPaused {
            time_left: self.time_left,
            overtime_seconds: self.overtime_seconds,
            at: Utc::now(),
        }]
    }

    pub fn resume(&mut self) -> Vec<Event> {
        if !self.is_running || !self.is_paused || self.is_finished() {
            debug!("resume ignored in phase {:?}", self.phase());
            return Vec::new();
        }
        self.is_paused = false;
        vec![Event::TimerResumed {
            time_left: self.time_left,
            overtime_seconds: self.overtime_seconds,
            at: Utc::now(),
        }]
    }

    pub fn toggle_pause(&mut self) -> Vec<Event> {
        if self.is_paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Advance one second. Call once per elapsed second.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.is_ticking() {
            return Vec::new();
        }
        self.elapsed_seconds += 1;

        if self.is_overtime {
            self.overtime_seconds += 1;
            return Vec::new();
        }
        if self.time_left > 1 {
            self.time_left -= 1;
            return Vec::new();
        }
        self.complete_current_step()
    }

    /// Skip to the next step without completing the current one.
    ///
    /// Ignored on the last step (use [`finish`](Self::finish)) and on a step
    /// that already completed.
    pub fn advance_step(&mut self) -> Vec<Event> {
        let from = self.current_step_index;
        if !self.has_started
            || self.is_finished()
            || self.completed_steps.contains(&from)
            || self.steps.is_last(from)
        {
            debug!("skip ignored at step {from} in phase {:?}", self.phase());
            return Vec::new();
        }
        self.enter_step(from + 1);
        vec![
            Event::StepSkipped {
                from_step: from,
                to_step: from + 1,
                at: Utc::now(),
            },
            self.step_started_event(),
        ]
    }

    /// Move straight to `target`, restarting its countdown.
    ///
    /// Never touches `completed_steps`. Ignored before start, after finish,
    /// in overtime, for the current step and for out-of-range targets.
    pub fn jump_to_step(&mut self, target: usize) -> Vec<Event> {
        let from = self.current_step_index;
        if !self.has_started
            || self.is_finished()
            || self.is_overtime
            || target >= self.steps.len()
            || target == from
        {
            debug!("jump to {target} ignored at step {from} in phase {:?}", self.phase());
            return Vec::new();
        }
        self.enter_step(target);
        vec![
            Event::StepJumped {
                from_step: from,
                to_step: target,
                at: Utc::now(),
            },
            self.step_started_event(),
        ]
    }

    /// End the session. Only the first call after start has any effect.
    pub fn finish(&mut self) -> Vec<Event> {
        if !self.has_started || self.is_finished() {
            debug!("finish ignored in phase {:?}", self.phase());
            return Vec::new();
        }
        let now = Utc::now();
        self.is_running = false;
        self.is_paused = false;

        let summary = BrewSummary {
            session_id: self.session_id,
            recipe_id: self.steps.recipe_id().to_string(),
            recipe_name: self.steps.recipe_name().to_string(),
            completed_steps: self.completed_steps.iter().copied().collect(),
            total_steps: self.steps.len(),
            elapsed_secs: self.elapsed_seconds,
            overtime_secs: self.overtime_seconds,
            finished_early: !self.completed_steps.contains(&self.steps.last_index()),
            started_at: self.started_at.unwrap_or(now),
            finished_at: now,
        };
        self.summary = Some(summary.clone());
        vec![Event::BrewFinished { summary, at: now }]
    }

    /// Back to `Idle` on step 0 with a fresh session id.
    pub fn reset(&mut self) -> Vec<Event> {
        *self = Self::new(self.steps.clone());
        vec![Event::BrewReset { at: Utc::now() }]
    }

    /// Replace the step table and start a new idle session.
    pub fn load_recipe(&mut self, steps: StepTable) -> Vec<Event> {
        *self = Self::new(steps);
        vec![Event::BrewReset { at: Utc::now() }]
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_current_step(&mut self) -> Vec<Event> {
        let index = self.current_step_index;
        self.completed_steps.insert(index);
        let mut events = vec![Event::StepCompleted {
            step_index: index,
            step_name: self.current_step_name(),
            at: Utc::now(),
        }];

        if self.steps.is_last(index) {
            self.is_overtime = true;
            self.overtime_seconds = 0;
            self.time_left = 0;
            events.push(Event::OvertimeEntered {
                step_index: index,
                at: Utc::now(),
            });
        } else {
            self.enter_step(index + 1);
            events.push(self.step_started_event());
        }
        events
    }

    fn enter_step(&mut self, index: usize) {
        self.current_step_index = index;
        self.time_left = self.steps.duration_secs(index);
    }

    fn current_step_name(&self) -> String {
        self.steps
            .get(self.current_step_index)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn step_started_event(&self) -> Event {
        Event::StepStarted {
            step_index: self.current_step_index,
            step_name: self.current_step_name(),
            duration_secs: self.time_left,
            target_water: self.steps.cumulative_water(self.current_step_index),
            at: Utc::now(),
        }
    }
}
