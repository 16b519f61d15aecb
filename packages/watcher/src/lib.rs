//! Game server activity watcher library.
//!
//! Polls a master server, tracks player activity on servers running a tracked
//! mod and publishes a status board and arrival alerts to configured destinations.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
