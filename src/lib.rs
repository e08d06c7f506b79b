//! Terminal monitor for background jobs.
//!
//! [`core`] holds the UI-independent pieces: the job model and status table,
//! the categorization/sort engine with its reload cache, and the job store
//! interface. [`tui`] renders them with ratatui.

pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod tui;
