//! Brewing modes: which controls a surface offers over the shared timer.
//!
//! Modes are policy only. Auto, manual and expert all drive the same
//! [`SharedTimer`]; switching between them never touches the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::events::Event;
use crate::session::SharedTimer;
use crate::timer::TimerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrewMode {
    /// Steps advance on their own; only pause/resume and finish are offered.
    Auto,
    /// Auto plus skipping a step before it completes.
    #[default]
    Manual,
    /// Manual plus jumping to any step and finishing early.
    Expert,
}

impl BrewMode {
    pub const ALL: [BrewMode; 3] = [BrewMode::Auto, BrewMode::Manual, BrewMode::Expert];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrewMode::Auto => "auto",
            BrewMode::Manual => "manual",
            BrewMode::Expert => "expert",
        }
    }

    /// Whether this mode offers `control` at all.
    pub fn offers(&self, control: Control) -> bool {
        match control {
            Control::Start | Control::Pause | Control::Resume | Control::FinishAndSave => true,
            Control::SkipStep => matches!(self, BrewMode::Manual | BrewMode::Expert),
            Control::JumpToStep | Control::FinishEarly => matches!(self, BrewMode::Expert),
        }
    }

    /// The controls a surface in this mode shows for `snapshot`.
    pub fn controls(&self, snapshot: &TimerSnapshot) -> Vec<Control> {
        let mut controls: Vec<Control> = visible_controls(snapshot)
            .into_iter()
            .filter(|c| self.offers(*c))
            .collect();

        if *self == BrewMode::Expert && snapshot.has_started && !snapshot.is_finished {
            if !snapshot.is_overtime && snapshot.total_steps > 1 {
                controls.push(Control::JumpToStep);
            }
            if !controls.contains(&Control::FinishAndSave) {
                controls.push(Control::FinishEarly);
            }
        }
        controls
    }
}

impl fmt::Display for BrewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrewMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BrewMode::Auto),
            "manual" => Ok(BrewMode::Manual),
            "expert" => Ok(BrewMode::Expert),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("expected auto, manual or expert, got '{other}'"),
            }),
        }
    }
}

/// A button a surface can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Start,
    Pause,
    Resume,
    SkipStep,
    JumpToStep,
    FinishEarly,
    FinishAndSave,
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::Start => "Start",
            Control::Pause => "Pause",
            Control::Resume => "Resume",
            Control::SkipStep => "Skip step",
            Control::JumpToStep => "Jump to step",
            Control::FinishEarly => "Finish early",
            Control::FinishAndSave => "Finish & Save",
        }
    }
}

/// The base controls table, a pure function of the snapshot.
///
/// | Condition                                         | Control           |
/// |---------------------------------------------------|-------------------|
/// | not started, on step 0                            | Start             |
/// | running                                           | Pause / Resume    |
/// | started, step not completed, not the last step    | Skip step         |
/// | last step, and completed or in overtime           | Finish & Save     |
///
/// A finished session shows nothing.
pub fn visible_controls(snapshot: &TimerSnapshot) -> Vec<Control> {
    let mut controls = Vec::new();
    if snapshot.is_finished {
        return controls;
    }
    if !snapshot.has_started && snapshot.current_step_index == 0 {
        controls.push(Control::Start);
    }
    if snapshot.is_running {
        controls.push(if snapshot.is_paused {
            Control::Resume
        } else {
            Control::Pause
        });
    }
    if snapshot.has_started && !snapshot.current_step_completed() && !snapshot.is_last_step() {
        controls.push(Control::SkipStep);
    }
    if snapshot.is_last_step() && (snapshot.current_step_completed() || snapshot.is_overtime) {
        controls.push(Control::FinishAndSave);
    }
    controls
}

/// A user request coming from a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    TogglePause,
    Skip,
    JumpTo(usize),
    Finish,
}

impl Command {
    /// Controls that, when visible, allow this command.
    fn enabled_by(&self) -> &'static [Control] {
        match self {
            Command::Start => &[Control::Start],
            Command::TogglePause => &[Control::Pause, Control::Resume],
            Command::Skip => &[Control::SkipStep],
            Command::JumpTo(_) => &[Control::JumpToStep],
            Command::Finish => &[Control::FinishAndSave, Control::FinishEarly],
        }
    }
}

/// Mode policy bound to a shared timer.
pub struct BrewingModeController {
    mode: BrewMode,
    timer: SharedTimer,
}

impl BrewingModeController {
    pub fn new(mode: BrewMode, timer: SharedTimer) -> Self {
        Self { mode, timer }
    }

    pub fn mode(&self) -> BrewMode {
        self.mode
    }

    /// Swap the policy. The running engine is left exactly as it is.
    pub fn set_mode(&mut self, mode: BrewMode) {
        debug!("Brewing mode {} -> {}", self.mode, mode);
        self.mode = mode;
    }

    pub fn timer(&self) -> &SharedTimer {
        &self.timer
    }

    pub fn controls(&self) -> Vec<Control> {
        self.mode.controls(&self.timer.snapshot())
    }

    /// Run `command` if one of its controls is currently shown.
    ///
    /// Anything else is ignored and returns no events.
    pub fn perform(&self, command: Command) -> Vec<Event> {
        let visible = self.controls();
        if !command.enabled_by().iter().any(|c| visible.contains(c)) {
            debug!("{:?} not available in {} mode right now", command, self.mode);
            return Vec::new();
        }
        match command {
            Command::Start => self.timer.start(),
            Command::TogglePause => self.timer.toggle_pause(),
            Command::Skip => self.timer.advance_step(),
            Command::JumpTo(target) => self.timer.jump_to_step(target),
            Command::Finish => self.timer.finish(),
        }
    }
}
