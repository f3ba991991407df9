//! Task-completion saga.
//!
//! Runs task update → streak → stats → achievements → notification. Only the
//! task update is load-bearing: once it commits the completion has happened,
//! and every later step is an additive best-effort update that is logged and
//! skipped when it fails.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::adapters::sqlite::{
    SqliteAchievementRepository, SqliteProfileRepository, SqliteStatsRepository,
    SqliteStreakRepository, SqliteTaskRepository,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    compose_streak_message, validate_category, AchievementDefinition, CompleteTaskRequest,
    CompletionNotification, CompletionOutcome, EvaluationContext, SagaState, SagaStep,
    StatsSnapshot, StepFailure, StreakStatus, StreakUpdate, UserId,
};
use crate::domain::ports::{
    AchievementRepository, CompletionNotifier, ProfileRepository, StatsRepository,
    StreakRepository, TaskRepository,
};

use super::achievement_catalog::build_catalog;
use super::achievement_engine::AchievementEngine;
use super::stats_aggregator::StatsAggregator;
use super::streak_engine::StreakEngine;
use super::transaction::TransactionRunner;

/// Every document store the saga touches.
#[derive(Clone)]
pub struct Repositories {
    pub tasks: Arc<dyn TaskRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
            streaks: Arc::new(SqliteStreakRepository::new(pool.clone())),
            stats: Arc::new(SqliteStatsRepository::new(pool.clone())),
            achievements: Arc::new(SqliteAchievementRepository::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool)),
        }
    }
}

type Session = Arc<Mutex<AchievementEngine>>;

/// What the task-update step committed.
struct TaskCommit {
    category: String,
    time_spent_seconds: Option<u64>,
    already_completed: bool,
}

pub struct CompletionOrchestrator {
    repositories: Repositories,
    streaks: StreakEngine,
    stats: StatsAggregator,
    notifier: Arc<dyn CompletionNotifier>,
    runner: TransactionRunner,
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl CompletionOrchestrator {
    pub fn new(
        repositories: Repositories,
        notifier: Arc<dyn CompletionNotifier>,
        runner: TransactionRunner,
    ) -> Self {
        Self {
            streaks: StreakEngine::new(repositories.streaks.clone(), runner.clone()),
            stats: StatsAggregator::new(repositories.stats.clone(), runner.clone()),
            repositories,
            notifier,
            runner,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn streak_engine(&self) -> &StreakEngine {
        &self.streaks
    }

    pub fn stats_aggregator(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    /// The user's achievement engine, loading it on first use.
    ///
    /// The catalog is built from the profile's focus areas at load time.
    pub async fn session(&self, user_id: &UserId) -> DomainResult<Session> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(user_id) {
            return Ok(session.clone());
        }

        let focus_areas = self
            .repositories
            .profiles
            .get(user_id)
            .await?
            .map(|p| p.focus_areas)
            .unwrap_or_default();
        let catalog = build_catalog(&focus_areas);
        let engine = AchievementEngine::load(
            self.repositories.achievements.clone(),
            user_id.clone(),
            catalog,
        )
        .await?;

        let session = Arc::new(Mutex::new(engine));
        sessions.insert(user_id.clone(), session.clone());
        Ok(session)
    }

    /// Drop a user's cached engine so the next use reloads from the store.
    pub async fn end_session(&self, user_id: &UserId) {
        self.sessions.lock().await.remove(user_id);
    }

    /// Complete a task and fan the completion out to every derived document.
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, task_id = %request.task_id)
    )]
    pub async fn complete_task(&self, request: CompleteTaskRequest) -> CompletionOutcome {
        let user_id = &request.user_id;
        let now_utc = request.now.with_timezone(&Utc);
        let mut state = SagaState::Started;
        let mut degraded = Vec::new();

        let commit = match self.update_task(&request, now_utc).await {
            Ok(commit) => commit,
            Err(err) => {
                warn!(error = %err, "task update failed, completion aborted");
                return CompletionOutcome::failed(SagaStep::TaskUpdate, err.to_string());
            }
        };
        advance(&mut state, SagaStep::TaskUpdate);

        if commit.already_completed {
            info!("task was already completed, derived state left untouched");
            let streak = self
                .streaks
                .get_streak_stats(user_id)
                .await
                .ok()
                .map(|s| s.current_streak);
            return CompletionOutcome {
                success: true,
                streak,
                streak_update: None,
                new_achievements: Vec::new(),
                error: None,
                state: SagaState::Done,
                already_completed: true,
                degraded,
            };
        }

        let streak_update = match self.streaks.update_streak(user_id, now_utc).await {
            Ok(update) => Some(update),
            Err(err) => {
                record_failure(&mut degraded, SagaStep::StreakUpdate, &err);
                None
            }
        };
        advance(&mut state, SagaStep::StreakUpdate);

        let minutes = commit.time_spent_seconds.unwrap_or(0) as f64 / 60.0;
        let snapshot = match self
            .stats
            .record_completion(
                user_id,
                &commit.category,
                minutes,
                request.now,
                streak_update.as_ref().map(|u| u.streak),
            )
            .await
        {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                record_failure(&mut degraded, SagaStep::StatsUpdate, &err);
                None
            }
        };
        advance(&mut state, SagaStep::StatsUpdate);

        let new_achievements = match self
            .evaluate_achievements(
                user_id,
                &request,
                snapshot.as_ref(),
                streak_update.as_ref(),
                now_utc,
            )
            .await
        {
            Ok(unlocked) => unlocked,
            Err((unlocked, err)) => {
                record_failure(&mut degraded, SagaStep::AchievementEvaluation, &err);
                unlocked
            }
        };
        advance(&mut state, SagaStep::AchievementEvaluation);

        let notification = CompletionNotification {
            user_id: user_id.clone(),
            task_id: request.task_id,
            streak_message: compose_streak_message(streak_update.as_ref(), new_achievements.len()),
            unlocked_list: new_achievements.clone(),
        };
        if let Err(err) = self.notifier.notify(&notification).await {
            record_failure(&mut degraded, SagaStep::Notification, &err);
        }
        advance(&mut state, SagaStep::Notification);

        state = SagaState::Done;
        info!(
            streak = streak_update.as_ref().map(|u| u.streak),
            unlocked = new_achievements.len(),
            degraded = degraded.len(),
            "task completion recorded"
        );

        CompletionOutcome {
            success: true,
            streak: streak_update.as_ref().map(|u| u.streak),
            streak_update,
            new_achievements,
            error: None,
            state,
            already_completed: false,
            degraded,
        }
    }

    /// Step 1: mark the task complete in its own optimistic transaction.
    async fn update_task(
        &self,
        request: &CompleteTaskRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<TaskCommit> {
        let tasks = &self.repositories.tasks;
        let user_id = &request.user_id;
        let task_id = request.task_id;
        let data = &request.task_data;

        self.runner
            .run("task", || async move {
                let mut task = tasks
                    .get(user_id, task_id)
                    .await?
                    .ok_or(DomainError::TaskNotFound(task_id))?;

                if task.completed {
                    return Ok(TaskCommit {
                        category: task.category,
                        time_spent_seconds: task.time_spent_seconds,
                        already_completed: true,
                    });
                }

                let raw = data.category.as_deref().unwrap_or(task.category.as_str());
                let category = validate_category(Some(raw))?;
                task.mark_completed(now, category.clone(), data.time_spent_seconds);
                tasks.update(user_id, &task).await?;

                Ok(TaskCommit {
                    category,
                    time_spent_seconds: task.time_spent_seconds,
                    already_completed: false,
                })
            })
            .await
    }

    /// Steps 4 and 5a: evaluate both triggers, then persist the union.
    ///
    /// On a persistence failure the evaluated unlocks are still returned
    /// alongside the error; they stay unlocked for the session.
    async fn evaluate_achievements(
        &self,
        user_id: &UserId,
        request: &CompleteTaskRequest,
        snapshot: Option<&StatsSnapshot>,
        streak_update: Option<&StreakUpdate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AchievementDefinition>, (Vec<AchievementDefinition>, DomainError)> {
        let session = self.session(user_id).await.map_err(|e| (Vec::new(), e))?;
        let mut engine = session.lock().await;

        let mut unlocked = Vec::new();
        if let Some(stats) = snapshot {
            unlocked.extend(engine.evaluate(&EvaluationContext::TaskComplete {
                stats,
                completed_at: request.now,
            }));
        }
        if let Some(update) = streak_update.filter(|u| u.status == StreakStatus::Extended) {
            let context = EvaluationContext::StreakUpdate {
                streak: update.streak,
            };
            unlocked.extend(engine.evaluate(&context));
        }

        match engine.persist_unlocks(&unlocked, now).await {
            Ok(()) => Ok(unlocked),
            Err(err) => Err((unlocked, err)),
        }
    }
}

fn advance(state: &mut SagaState, step: SagaStep) {
    *state = SagaState::after(step);
    debug!(step = %step, "saga step finished");
}

fn record_failure(degraded: &mut Vec<StepFailure>, step: SagaStep, err: &DomainError) {
    warn!(step = %step, error = %err, "saga step failed, continuing");
    degraded.push(StepFailure {
        step,
        error: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{FocusArea, TaskData, TaskRecord, UserProfile};
    use crate::domain::ports::NullNotifier;
    use chrono::{FixedOffset, TimeZone};

    async fn setup() -> (CompletionOrchestrator, Repositories) {
        let pool = create_migrated_test_pool().await.unwrap();
        let repos = Repositories::sqlite(pool);
        let orchestrator = CompletionOrchestrator::new(
            repos.clone(),
            Arc::new(NullNotifier::new()),
            TransactionRunner::new(5, 1, 5),
        );
        (orchestrator, repos)
    }

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, day, hour, minute, 0)
            .unwrap()
    }

    async fn add_task(repos: &Repositories, user: &UserId, category: &str) -> TaskRecord {
        let task = TaskRecord::new("Practice", category);
        repos.tasks.create(user, &task).await.unwrap();
        task
    }

    fn request(
        user: &UserId,
        task: &TaskRecord,
        now: DateTime<FixedOffset>,
    ) -> CompleteTaskRequest {
        CompleteTaskRequest {
            user_id: user.clone(),
            task_id: task.id,
            task_data: TaskData::default(),
            now,
        }
    }

    #[tokio::test]
    async fn test_first_completion_runs_every_step() {
        let (orchestrator, repos) = setup().await;
        let user = UserId::new("u1");
        let task = add_task(&repos, &user, "general").await;

        let outcome = orchestrator.complete_task(request(&user, &task, local(8, 12, 0))).await;

        assert!(outcome.success);
        assert_eq!(outcome.state, SagaState::Done);
        assert_eq!(outcome.streak, Some(1));
        assert!(outcome.degraded.is_empty());
        let ids: Vec<&str> = outcome.new_achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_task"]);

        let stored = repos.tasks.get(&user, task.id).await.unwrap().unwrap();
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn test_missing_task_fails_at_task_update() {
        let (orchestrator, repos) = setup().await;
        let user = UserId::new("u1");
        let ghost = TaskRecord::new("Ghost", "general");

        let outcome = orchestrator.complete_task(request(&user, &ghost, local(8, 12, 0))).await;

        assert!(!outcome.success);
        assert_eq!(outcome.state, SagaState::FailedAt(SagaStep::TaskUpdate));
        assert!(outcome.error.is_some());
        assert!(repos.streaks.load(&user).await.unwrap().is_none());
        assert!(repos.stats.load(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_category_is_a_hard_failure() {
        let (orchestrator, repos) = setup().await;
        let user = UserId::new("u1");
        let task = add_task(&repos, &user, "general").await;
        let mut req = request(&user, &task, local(8, 12, 0));
        req.task_data.category = Some("bad/category".to_string());

        let outcome = orchestrator.complete_task(req).await;
        assert_eq!(outcome.state, SagaState::FailedAt(SagaStep::TaskUpdate));
        assert!(!repos.tasks.get(&user, task.id).await.unwrap().unwrap().completed);
    }

    #[tokio::test]
    async fn test_recompleting_a_task_does_not_double_count() {
        let (orchestrator, repos) = setup().await;
        let user = UserId::new("u1");
        let task = add_task(&repos, &user, "general").await;

        orchestrator.complete_task(request(&user, &task, local(8, 12, 0))).await;
        let again = orchestrator.complete_task(request(&user, &task, local(8, 13, 0))).await;

        assert!(again.success);
        assert!(again.already_completed);
        assert_eq!(again.streak, Some(1));
        let stats = repos.stats.load(&user).await.unwrap().unwrap().value;
        assert_eq!(stats.tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_category_is_normalized_and_minutes_recorded() {
        let (orchestrator, repos) = setup().await;
        let user = UserId::new("u1");
        let profile = UserProfile::new(user.clone(), "Ada", FocusArea::from_names(["Rust"]));
        repos.profiles.upsert(&profile).await.unwrap();
        let task = add_task(&repos, &user, "general").await;

        let mut req = request(&user, &task, local(8, 12, 0));
        req.task_data = TaskData {
            category: Some("  Deep   Work ".to_string()),
            time_spent_seconds: Some(5400),
        };
        orchestrator.complete_task(req).await;

        let stored = repos.tasks.get(&user, task.id).await.unwrap().unwrap();
        assert_eq!(stored.category, "deep_work");
        let stats = repos.stats.load(&user).await.unwrap().unwrap().value;
        assert_eq!(stats.tasks_in("deep_work"), 1);
        assert!((stats.hours_in("deep_work") - 1.5).abs() < 1e-9);
    }
}
