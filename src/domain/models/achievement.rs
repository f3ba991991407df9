//! Achievement domain model.
//!
//! Achievements are one-time unlocks decided by a typed requirement
//! predicate. Each predicate reacts to exactly one trigger kind.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::stats::StatsSnapshot;

/// Rarity tier of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display grouping of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Streak,
    Tasks,
    Special,
    Category,
}

impl AchievementCategory {
    pub const ALL: [Self; 4] = [Self::Streak, Self::Tasks, Self::Category, Self::Special];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::Tasks => "tasks",
            Self::Special => "special",
            Self::Category => "category",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Streak => "Streak Masters",
            Self::Tasks => "Task Champions",
            Self::Special => "Special Achievements",
            Self::Category => "Category Experts",
        }
    }
}

/// The two events that can drive an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    TaskComplete,
    StreakUpdate,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskComplete => "task_complete",
            Self::StreakUpdate => "streak_update",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-of-day windows for special achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// Local hour < 7.
    EarlyMorning,
    /// Local hour >= 23.
    LateNight,
}

impl TimeWindow {
    pub fn contains_hour(&self, hour: u32) -> bool {
        match self {
            Self::EarlyMorning => hour < 7,
            Self::LateNight => hour >= 23,
        }
    }
}

/// Payload for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub enum EvaluationContext<'a> {
    TaskComplete {
        stats: &'a StatsSnapshot,
        /// Completion instant in the user's local offset.
        completed_at: DateTime<FixedOffset>,
    },
    StreakUpdate {
        streak: u32,
    },
}

impl EvaluationContext<'_> {
    pub fn trigger(&self) -> Trigger {
        match self {
            Self::TaskComplete { .. } => Trigger::TaskComplete,
            Self::StreakUpdate { .. } => Trigger::StreakUpdate,
        }
    }
}

/// Typed unlock rule. One variant per rule kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementPredicate {
    Streak { days: u32 },
    TasksCompleted { count: u64 },
    TimeOfDay { window: TimeWindow },
    WeekendTasks { count: u64 },
    CategoryTasks { category: String, count: u64 },
    CategoryHours { category: String, hours: f64 },
}

impl RequirementPredicate {
    /// The only trigger kind this rule reacts to.
    pub fn trigger(&self) -> Trigger {
        match self {
            Self::Streak { .. } => Trigger::StreakUpdate,
            Self::TasksCompleted { .. }
            | Self::TimeOfDay { .. }
            | Self::WeekendTasks { .. }
            | Self::CategoryTasks { .. }
            | Self::CategoryHours { .. } => Trigger::TaskComplete,
        }
    }

    /// Decide the rule against one evaluation context in constant time.
    pub fn is_satisfied(&self, context: &EvaluationContext<'_>) -> bool {
        match (self, context) {
            (Self::Streak { days }, EvaluationContext::StreakUpdate { streak }) => streak >= days,
            (Self::TasksCompleted { count }, EvaluationContext::TaskComplete { stats, .. }) => {
                stats.tasks_completed >= *count
            }
            (Self::TimeOfDay { window }, EvaluationContext::TaskComplete { completed_at, .. }) => {
                window.contains_hour(completed_at.hour())
            }
            (Self::WeekendTasks { count }, EvaluationContext::TaskComplete { stats, .. }) => {
                stats.weekend_tasks >= *count
            }
            (
                Self::CategoryTasks { category, count },
                EvaluationContext::TaskComplete { stats, .. },
            ) => stats.tasks_in(category) >= *count,
            (
                Self::CategoryHours { category, hours },
                EvaluationContext::TaskComplete { stats, .. },
            ) => stats.hours_in(category) >= *hours,
            (
                Self::Streak { .. },
                EvaluationContext::TaskComplete { .. },
            )
            | (
                Self::TasksCompleted { .. }
                | Self::TimeOfDay { .. }
                | Self::WeekendTasks { .. }
                | Self::CategoryTasks { .. }
                | Self::CategoryHours { .. },
                EvaluationContext::StreakUpdate { .. },
            ) => false,
        }
    }
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub requirement: RequirementPredicate,
    pub points: u32,
    pub rarity: Rarity,
}

/// Persisted proof that a user unlocked an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub earned_at: DateTime<Utc>,
    pub points: u32,
}

impl UnlockedAchievement {
    pub fn from_definition(definition: &AchievementDefinition, earned_at: DateTime<Utc>) -> Self {
        Self {
            achievement_id: definition.id.clone(),
            earned_at,
            points: definition.points,
        }
    }
}

/// Point thresholds for player levels, ascending.
pub const PLAYER_LEVELS: &[(u32, &str)] = &[
    (0, "Novice"),
    (100, "Apprentice"),
    (300, "Journeyman"),
    (600, "Expert"),
    (1000, "Master"),
    (1500, "Grandmaster"),
    (2000, "Legend"),
];

/// Level reached for a point total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLevel {
    pub name: String,
    pub min_points: u32,
    /// Points needed for the next level, `None` at the top.
    pub next_level_at: Option<u32>,
}

impl PlayerLevel {
    pub fn for_points(points: u32) -> Self {
        let idx = PLAYER_LEVELS
            .iter()
            .rposition(|(min, _)| points >= *min)
            .unwrap_or(0);
        let (min_points, name) = PLAYER_LEVELS[idx];
        Self {
            name: name.to_string(),
            min_points,
            next_level_at: PLAYER_LEVELS.get(idx + 1).map(|(min, _)| *min),
        }
    }
}

/// Summary of a user's unlock progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub unlocked: usize,
    pub total: usize,
    pub total_points: u32,
    pub level: PlayerLevel,
}
