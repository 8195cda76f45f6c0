//! Terminal display utilities for the CLI.
//!
//! Provides styled tables for recommendation results, progress bars for
//! store builds, and a small colour theme.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner};
pub use tables::{TableBuilder, create_recommendation_table, create_value_list};
pub use theme::{THEME, Theme};
