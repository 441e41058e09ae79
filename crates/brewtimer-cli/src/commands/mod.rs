pub mod brew;
pub mod config;
pub mod history;
pub mod recipe;
