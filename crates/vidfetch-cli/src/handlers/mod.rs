//! Command handlers.
//!
//! Handlers are thin: parse CLI-specific input, call into the library crates,
//! format the result for the terminal.

pub mod config;
pub mod get;
pub mod history;
