//! Port trait definitions (Hexagonal Architecture)
//!
//! Every persisted document gets its own repository port; no port spans more
//! than one document in a single atomic operation.

pub mod achievement_repository;
pub mod notifier;
pub mod null_notifier;
pub mod profile_repository;
pub mod stats_repository;
pub mod streak_repository;
pub mod task_repository;

pub use achievement_repository::AchievementRepository;
pub use notifier::CompletionNotifier;
pub use null_notifier::NullNotifier;
pub use profile_repository::ProfileRepository;
pub use stats_repository::StatsRepository;
pub use streak_repository::StreakRepository;
pub use task_repository::{TaskFilter, TaskRepository};

/// A document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }
}
