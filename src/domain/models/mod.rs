pub mod achievement;
pub mod completion;
pub mod config;
pub mod profile;
pub mod stats;
pub mod streak;
pub mod task;

pub use achievement::{
    AchievementCategory, AchievementDefinition, AchievementProgress, EvaluationContext,
    PlayerLevel, Rarity, RequirementPredicate, TimeWindow, Trigger, UnlockedAchievement,
    PLAYER_LEVELS,
};
pub use completion::{
    compose_streak_message, CompleteTaskRequest, CompletionNotification, CompletionOutcome,
    SagaState, SagaStep, StepFailure, TaskData,
};
pub use config::{Config, DatabaseConfig, LoggingConfig, TransactionConfig, UserConfig};
pub use profile::{FocusArea, UserId, UserProfile};
pub use stats::{is_weekend, CompletionDelta, StatsRecord, StatsSnapshot};
pub use streak::{
    milestone_icon, milestone_title, normalize_to_calendar_day, Milestone, StreakRecord,
    StreakStats, StreakStatus, StreakTransition, StreakUpdate, MILESTONE_TIERS,
};
pub use task::{normalize_category, validate_category, TaskRecord, DEFAULT_CATEGORY};
