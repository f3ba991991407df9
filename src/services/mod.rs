pub mod achievement_catalog;
pub mod achievement_engine;
pub mod client_reconciler;
pub mod completion_orchestrator;
pub mod notifier;
pub mod stats_aggregator;
pub mod streak_engine;
pub mod transaction;

pub use achievement_catalog::build_catalog;
pub use achievement_engine::AchievementEngine;
pub use client_reconciler::{
    ClientStateReconciler, LocalTaskCache, MergePolicy, MergePolicyTable, ReconcileReport,
    TaskField, TaskSnapshot, TaskSnapshotPublisher,
};
pub use completion_orchestrator::{CompletionOrchestrator, Repositories};
pub use notifier::BroadcastNotifier;
pub use stats_aggregator::StatsAggregator;
pub use streak_engine::StreakEngine;
pub use transaction::TransactionRunner;
