//! CLI command implementations.

pub mod achievements;
pub mod profile;
pub mod stats;
pub mod streak;
pub mod task;
