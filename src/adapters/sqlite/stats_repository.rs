//! SQLite implementation of the StatsRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{StatsRecord, UserId};
use crate::domain::ports::{StatsRepository, Versioned};

use super::parse_json_or_default;

#[derive(Clone)]
pub struct SqliteStatsRepository {
    pool: SqlitePool,
}

impl SqliteStatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn load(&self, user_id: &UserId) -> DomainResult<Option<Versioned<StatsRecord>>> {
        let row: Option<StatsRow> = sqlx::query_as("SELECT * FROM user_stats WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Versioned::<StatsRecord>::try_from).transpose()
    }

    async fn store(
        &self,
        user_id: &UserId,
        record: &StatsRecord,
        expected_version: Option<u64>,
    ) -> DomainResult<u64> {
        let by_category_json = serde_json::to_string(&record.tasks_by_category)?;
        let hours_json = serde_json::to_string(&record.hours_by_category)?;

        let result = match expected_version {
            None => {
                sqlx::query(
                    r#"INSERT OR IGNORE INTO user_stats (user_id, tasks_completed, tasks_by_category,
                       hours_by_category, weekend_tasks, streak_mirror, version)
                       VALUES (?, ?, ?, ?, ?, ?, 1)"#,
                )
                .bind(user_id.as_str())
                .bind(record.tasks_completed as i64)
                .bind(&by_category_json)
                .bind(&hours_json)
                .bind(record.weekend_tasks as i64)
                .bind(i64::from(record.streak_mirror))
                .execute(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"UPDATE user_stats SET tasks_completed = ?, tasks_by_category = ?,
                       hours_by_category = ?, weekend_tasks = ?, streak_mirror = ?,
                       version = version + 1
                       WHERE user_id = ? AND version = ?"#,
                )
                .bind(record.tasks_completed as i64)
                .bind(&by_category_json)
                .bind(&hours_json)
                .bind(record.weekend_tasks as i64)
                .bind(i64::from(record.streak_mirror))
                .bind(user_id.as_str())
                .bind(version as i64)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DomainError::ConcurrencyConflict {
                entity: "stats".to_string(),
                id: user_id.to_string(),
            });
        }

        Ok(expected_version.map_or(1, |v| v + 1))
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    tasks_completed: i64,
    tasks_by_category: Option<String>,
    hours_by_category: Option<String>,
    weekend_tasks: i64,
    streak_mirror: i64,
    version: i64,
}

impl TryFrom<StatsRow> for Versioned<StatsRecord> {
    type Error = DomainError;

    fn try_from(row: StatsRow) -> Result<Self, Self::Error> {
        let record = StatsRecord {
            tasks_completed: row.tasks_completed as u64,
            tasks_by_category: parse_json_or_default(row.tasks_by_category)?,
            hours_by_category: parse_json_or_default(row.hours_by_category)?,
            weekend_tasks: row.weekend_tasks as u64,
            streak_mirror: row.streak_mirror as u32,
        };
        Ok(Versioned::new(record, row.version as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteStatsRepository {
        SqliteStatsRepository::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_round_trip_maps() {
        let repo = setup_test_repo().await;
        let user = UserId::new("u1");
        let mut record = StatsRecord {
            tasks_completed: 3,
            weekend_tasks: 1,
            streak_mirror: 2,
            ..Default::default()
        };
        record.tasks_by_category.insert("focus_1".to_string(), 2);
        record.tasks_by_category.insert("general".to_string(), 1);
        record.hours_by_category.insert("focus_1".to_string(), 1.25);

        repo.store(&user, &record, None).await.unwrap();
        let loaded = repo.load(&user).await.unwrap().unwrap();
        assert_eq!(loaded.value, record);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_conflicting_writer_is_rejected() {
        let repo = setup_test_repo().await;
        let user = UserId::new("u1");
        repo.store(&user, &StatsRecord::default(), None).await.unwrap();

        let a = repo.load(&user).await.unwrap().unwrap();
        let b = repo.load(&user).await.unwrap().unwrap();

        repo.store(&user, &a.value, Some(a.version)).await.unwrap();
        assert!(repo.store(&user, &b.value, Some(b.version)).await.unwrap_err().is_conflict());
    }
}
