//! # brewtimer Core Library
//!
//! Core logic for guided coffee brewing: a recipe is a list of timed steps,
//! and a single timer walks the user through them. The CLI (and any other
//! front end) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Step table**: immutable, validated steps of one recipe with
//!   cumulative water targets
//! - **Timer engine**: a tick-driven state machine (countdown, pause,
//!   skip, overtime, finish) that never spawns anything itself
//! - **Shared timer**: the one engine of a session plus its one-second
//!   driver task, observed by every surface through a watch channel
//! - **Modes**: auto / manual / expert policy deciding which controls a
//!   surface offers
//! - **Storage**: TOML configuration and SQLite brew history
//!
//! ## Key Components
//!
//! - [`BrewTimerEngine`]: Core timer state machine
//! - [`SharedTimer`]: Session handle shared by all surfaces
//! - [`BrewingModeController`]: Mode policy over a shared timer
//! - [`Database`]: Brew history persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod mode;
pub mod notify;
pub mod recipe;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use mode::{visible_controls, BrewMode, BrewingModeController, Command, Control};
pub use notify::{LogNotifier, NotificationSink};
pub use recipe::{Recipe, RecipeStep, RecipeStore, StepTable};
pub use session::{SharedTimer, TimerView};
pub use storage::{Config, Database, HistoryWriter, SqliteHistory};
pub use timer::{format_clock, BrewPhase, BrewSummary, BrewTimerEngine, TimerSnapshot};
