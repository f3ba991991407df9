//! Stats aggregator: folds completions into the per-user counters document.

use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use tracing::{debug, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CompletionDelta, StatsRecord, StatsSnapshot, UserId};
use crate::domain::ports::StatsRepository;

use super::transaction::TransactionRunner;

pub struct StatsAggregator {
    repository: Arc<dyn StatsRepository>,
    runner: TransactionRunner,
}

impl StatsAggregator {
    pub fn new(repository: Arc<dyn StatsRepository>, runner: TransactionRunner) -> Self {
        Self { repository, runner }
    }

    /// Apply one completion and return the counters as committed.
    ///
    /// `streak_value` of `None` keeps the previous streak mirror.
    #[instrument(skip(self, completed_at), fields(user_id = %user_id))]
    pub async fn record_completion<Tz>(
        &self,
        user_id: &UserId,
        category: &str,
        time_spent_minutes: f64,
        completed_at: DateTime<Tz>,
        streak_value: Option<u32>,
    ) -> DomainResult<StatsSnapshot>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let delta = CompletionDelta {
            category: category.to_string(),
            time_spent_minutes,
            completed_at,
            streak_value,
        };
        let repository = &self.repository;
        let delta = &delta;

        let snapshot = self
            .runner
            .run("stats", || async move {
                let current = repository.load(user_id).await?;
                let (mut record, version) = match current {
                    Some(doc) => (doc.value, Some(doc.version)),
                    None => (StatsRecord::default(), None),
                };

                record.apply(delta);
                repository.store(user_id, &record, version).await?;
                Ok(record)
            })
            .await?;

        debug!(
            tasks_completed = snapshot.tasks_completed,
            weekend_tasks = snapshot.weekend_tasks,
            "stats recorded"
        );
        Ok(snapshot)
    }

    pub async fn get_stats(&self, user_id: &UserId) -> DomainResult<StatsSnapshot> {
        Ok(self
            .repository
            .load(user_id)
            .await?
            .map(|doc| doc.value)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteStatsRepository};
    use chrono::FixedOffset;

    async fn setup_aggregator_with(runner: TransactionRunner) -> StatsAggregator {
        let pool = create_migrated_test_pool().await.unwrap();
        StatsAggregator::new(Arc::new(SqliteStatsRepository::new(pool)), runner)
    }

    async fn setup_aggregator() -> StatsAggregator {
        setup_aggregator_with(TransactionRunner::new(5, 1, 5)).await
    }

    fn local(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_record_returns_committed_snapshot() {
        let aggregator = setup_aggregator().await;
        let user = UserId::new("u1");

        // 2024-03-06 is a Wednesday, 2024-03-09 a Saturday
        aggregator
            .record_completion(&user, "focus_1", 30.0, local(6, 10), Some(1))
            .await
            .unwrap();
        let snapshot = aggregator
            .record_completion(&user, "focus_1", 90.0, local(9, 10), Some(2))
            .await
            .unwrap();

        assert_eq!(snapshot.tasks_completed, 2);
        assert_eq!(snapshot.tasks_in("focus_1"), 2);
        assert!((snapshot.hours_in("focus_1") - 2.0).abs() < 1e-9);
        assert_eq!(snapshot.weekend_tasks, 1);
        assert_eq!(snapshot.streak_mirror, 2);
        assert_eq!(aggregator.get_stats(&user).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_missing_streak_keeps_mirror() {
        let aggregator = setup_aggregator().await;
        let user = UserId::new("u1");
        aggregator
            .record_completion(&user, "general", 0.0, local(6, 10), Some(4))
            .await
            .unwrap();

        let snapshot = aggregator
            .record_completion(&user, "general", 0.0, local(6, 11), None)
            .await
            .unwrap();
        assert_eq!(snapshot.streak_mirror, 4);
        assert!(snapshot.is_consistent());
    }

    #[tokio::test]
    async fn test_concurrent_completions_are_additive() {
        let aggregator = Arc::new(setup_aggregator_with(TransactionRunner::new(100, 1, 20)).await);
        let user = UserId::new("u1");

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let aggregator = aggregator.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                let category = if i % 2 == 0 { "focus_1" } else { "focus_2" };
                aggregator
                    .record_completion(&user, category, 60.0, local(6, 10), Some(1))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stats = aggregator.get_stats(&user).await.unwrap();
        assert_eq!(stats.tasks_completed, 8);
        assert_eq!(stats.tasks_in("focus_1"), 4);
        assert_eq!(stats.tasks_in("focus_2"), 4);
        assert!(stats.is_consistent());
    }
}
