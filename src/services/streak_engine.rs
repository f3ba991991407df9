//! Streak engine: the transactional side of the streak state machine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{StreakRecord, StreakStats, StreakStatus, StreakUpdate, UserId};
use crate::domain::ports::StreakRepository;

use super::transaction::TransactionRunner;

pub struct StreakEngine {
    repository: Arc<dyn StreakRepository>,
    runner: TransactionRunner,
}

impl StreakEngine {
    pub fn new(repository: Arc<dyn StreakRepository>, runner: TransactionRunner) -> Self {
        Self { repository, runner }
    }

    /// Record activity at `now` against the user's streak.
    ///
    /// The day comparison re-runs against a fresh read on every conflict, so
    /// two completions on the same UTC day can only ever count once.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn update_streak(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<StreakUpdate> {
        let repository = &self.repository;

        let transition = self
            .runner
            .run("streak", || async move {
                let current = repository.load(user_id).await?;
                let (record, version) = match current {
                    Some(doc) => (doc.value, Some(doc.version)),
                    None => (StreakRecord::default(), None),
                };

                let transition = record.transition(now);
                if let Some(next) = &transition.next {
                    repository.store(user_id, next, version).await?;
                }
                Ok(transition)
            })
            .await?;

        if transition.is_clock_skew() {
            warn!(
                day_diff = transition.day_diff,
                "completion is dated before the last study day, streak reset"
            );
        }

        let update = transition.update;
        match update.status {
            StreakStatus::Extended => {
                info!(streak = update.streak, "streak extended");
                if let Some(title) = &update.milestone {
                    info!(streak = update.streak, milestone = %title, "streak milestone reached");
                }
            }
            StreakStatus::Reset => info!("new streak started"),
            StreakStatus::Unchanged => {}
        }

        Ok(update)
    }

    /// Read-only view of the user's streak; all zeros when none exists yet.
    pub async fn get_streak_stats(&self, user_id: &UserId) -> DomainResult<StreakStats> {
        let record = self
            .repository
            .load(user_id)
            .await?
            .map(|doc| doc.value)
            .unwrap_or_default();
        Ok(StreakStats::from(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteStreakRepository};
    use chrono::{Duration, TimeZone};

    async fn setup_engine() -> StreakEngine {
        let pool = create_migrated_test_pool().await.unwrap();
        StreakEngine::new(
            Arc::new(SqliteStreakRepository::new(pool)),
            TransactionRunner::new(5, 1, 5),
        )
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_completion_starts_streak() {
        let engine = setup_engine().await;
        let user = UserId::new("u1");

        let update = engine.update_streak(&user, day(1, 9)).await.unwrap();
        assert_eq!(update.status, StreakStatus::Reset);
        assert_eq!(update.streak, 1);

        let stats = engine.get_streak_stats(&user).await.unwrap();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 1);
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.last_study_day, Some(day(1, 9)));
    }

    #[tokio::test]
    async fn test_same_day_does_not_write() {
        let engine = setup_engine().await;
        let user = UserId::new("u1");
        engine.update_streak(&user, day(1, 9)).await.unwrap();

        let update = engine.update_streak(&user, day(1, 22)).await.unwrap();
        assert_eq!(update.status, StreakStatus::Unchanged);

        let stats = engine.get_streak_stats(&user).await.unwrap();
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.last_study_day, Some(day(1, 9)));
    }

    #[tokio::test]
    async fn test_week_of_completions_awards_milestone_once() {
        let engine = setup_engine().await;
        let user = UserId::new("u1");
        let start = day(1, 8);

        let mut last = None;
        for offset in 0..7 {
            last = Some(engine.update_streak(&user, start + Duration::days(offset)).await.unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.status, StreakStatus::Extended);
        assert_eq!(last.streak, 7);
        assert_eq!(last.milestone.as_deref(), Some("Week Warrior"));

        let stats = engine.get_streak_stats(&user).await.unwrap();
        assert_eq!(stats.milestones.len(), 1);
        assert_eq!(stats.milestones[0].days, 7);
    }

    #[tokio::test]
    async fn test_gap_resets_but_keeps_best() {
        let engine = setup_engine().await;
        let user = UserId::new("u1");
        for d in 1..=3 {
            engine.update_streak(&user, day(d, 10)).await.unwrap();
        }

        let update = engine.update_streak(&user, day(6, 10)).await.unwrap();
        assert_eq!(update.status, StreakStatus::Reset);

        let stats = engine.get_streak_stats(&user).await.unwrap();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.total_days, 4);
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_stats() {
        let engine = setup_engine().await;
        let stats = engine.get_streak_stats(&UserId::new("nobody")).await.unwrap();
        assert_eq!(stats, StreakStats::default());
    }
}
