mod engine;
mod snapshot;

pub use engine::BrewTimerEngine;
pub use snapshot::{format_clock, BrewPhase, BrewSummary, TimerSnapshot};
