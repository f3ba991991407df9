//! levelup - streaks, progress counters and achievement unlocks
//!
//! The gamification core of a personal task tracker. Completing a task fans
//! out into several independently stored documents (task, streak, stats,
//! achievements), each updated under its own optimistic transaction.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and port traits
//! - **Adapters** (`adapters`): SQLite implementations of the ports
//! - **Service Layer** (`services`): Streak engine, stats aggregator,
//!   achievement engine, completion saga and client reconciler
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use levelup::adapters::sqlite::create_migrated_test_pool;
//! use levelup::domain::ports::NullNotifier;
//! use levelup::services::{CompletionOrchestrator, Repositories, TransactionRunner};
//!
//! let pool = create_migrated_test_pool().await?;
//! let orchestrator = CompletionOrchestrator::new(
//!     Repositories::sqlite(pool),
//!     std::sync::Arc::new(NullNotifier),
//!     TransactionRunner::default(),
//! );
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CompleteTaskRequest, CompletionOutcome, Config, StatsSnapshot, StreakStats, StreakUpdate,
    TaskData, UserId,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CompletionOrchestrator, Repositories, TransactionRunner};
