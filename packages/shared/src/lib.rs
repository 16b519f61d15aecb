//! Utilities shared by the arena-watch packages.

pub mod logger;
pub mod time;
