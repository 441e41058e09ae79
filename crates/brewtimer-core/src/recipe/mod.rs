//! Brewing recipes and the step table derived from them.
//!
//! A [`Recipe`] is passthrough data owned by whoever authored it; the timer
//! only ever sees the validated, immutable [`StepTable`].

mod builtin;
mod model;
mod store;
mod table;

pub use model::{Recipe, RecipeStep};
pub use store::RecipeStore;
pub use table::StepTable;
