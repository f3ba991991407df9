//! Task-completion saga types.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::achievement::AchievementDefinition;
use super::profile::UserId;
use super::streak::StreakUpdate;

/// Optional task data supplied with a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    pub category: Option<String>,
    pub time_spent_seconds: Option<u64>,
}

/// Entry point payload for `complete_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteTaskRequest {
    pub user_id: UserId,
    pub task_id: Uuid,
    pub task_data: TaskData,
    /// Completion instant with the user's local offset.
    pub now: DateTime<FixedOffset>,
}

/// Saga steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    TaskUpdate,
    StreakUpdate,
    StatsUpdate,
    AchievementEvaluation,
    Notification,
}

impl SagaStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskUpdate => "task_update",
            Self::StreakUpdate => "streak_update",
            Self::StatsUpdate => "stats_update",
            Self::AchievementEvaluation => "achievement_evaluation",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Saga progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "step")]
pub enum SagaState {
    Started,
    TaskUpdated,
    StreakUpdated,
    StatsUpdated,
    AchievementsEvaluated,
    Notified,
    Done,
    FailedAt(SagaStep),
}

impl SagaState {
    /// State reached once `step` has run, whether or not it succeeded.
    pub fn after(step: SagaStep) -> Self {
        match step {
            SagaStep::TaskUpdate => Self::TaskUpdated,
            SagaStep::StreakUpdate => Self::StreakUpdated,
            SagaStep::StatsUpdate => Self::StatsUpdated,
            SagaStep::AchievementEvaluation => Self::AchievementsEvaluated,
            SagaStep::Notification => Self::Notified,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FailedAt(_))
    }
}

/// A secondary step that failed and was swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: SagaStep,
    pub error: String,
}

/// Payload handed to the presentation layer after a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionNotification {
    pub user_id: UserId,
    pub task_id: Uuid,
    pub streak_message: String,
    pub unlocked_list: Vec<AchievementDefinition>,
}

/// Compose the toast-style message for a completion.
pub fn compose_streak_message(streak: Option<&StreakUpdate>, unlocked: usize) -> String {
    let mut parts = vec!["Task completed!".to_string()];
    if let Some(update) = streak {
        parts.push(update.message());
        if let Some(title) = &update.milestone {
            parts.push(format!("{title} - {} Day Streak!", update.streak));
        }
    }
    if unlocked > 0 {
        let plural = if unlocked > 1 { "s" } else { "" };
        parts.push(format!("{unlocked} new achievement{plural}!"));
    }
    parts.join(" ")
}

/// Result returned to the caller of `complete_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub success: bool,
    pub streak: Option<u32>,
    pub streak_update: Option<StreakUpdate>,
    pub new_achievements: Vec<AchievementDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub state: SagaState,
    /// The task had already been completed; secondary steps were skipped.
    pub already_completed: bool,
    pub degraded: Vec<StepFailure>,
}

impl CompletionOutcome {
    pub fn failed(step: SagaStep, error: impl Into<String>) -> Self {
        Self {
            success: false,
            streak: None,
            streak_update: None,
            new_achievements: Vec::new(),
            error: Some(error.into()),
            state: SagaState::FailedAt(step),
            already_completed: false,
            degraded: Vec::new(),
        }
    }
}
