//! Terminal output helpers.

pub mod progress;
pub mod tables;

pub use progress::JobDisplay;
pub use tables::{format_history_row, history_header, truncate_string};
