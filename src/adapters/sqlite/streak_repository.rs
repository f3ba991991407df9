//! SQLite implementation of the StreakRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Milestone, StreakRecord, UserId};
use crate::domain::ports::{StreakRepository, Versioned};

use super::{parse_json_or_default, parse_optional_datetime};

#[derive(Clone)]
pub struct SqliteStreakRepository {
    pool: SqlitePool,
}

impl SqliteStreakRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreakRepository for SqliteStreakRepository {
    async fn load(&self, user_id: &UserId) -> DomainResult<Option<Versioned<StreakRecord>>> {
        let row: Option<StreakRow> = sqlx::query_as("SELECT * FROM streaks WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Versioned::<StreakRecord>::try_from).transpose()
    }

    async fn store(
        &self,
        user_id: &UserId,
        record: &StreakRecord,
        expected_version: Option<u64>,
    ) -> DomainResult<u64> {
        let milestones_json = serde_json::to_string(&record.milestones)?;
        let last_study_day = record.last_study_day.map(|t| t.to_rfc3339());

        let result = match expected_version {
            None => {
                sqlx::query(
                    r#"INSERT OR IGNORE INTO streaks (user_id, current_streak, best_streak,
                       total_days, last_study_day, milestones, version)
                       VALUES (?, ?, ?, ?, ?, ?, 1)"#,
                )
                .bind(user_id.as_str())
                .bind(i64::from(record.current))
                .bind(i64::from(record.best_streak))
                .bind(i64::from(record.total_days))
                .bind(&last_study_day)
                .bind(&milestones_json)
                .execute(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"UPDATE streaks SET current_streak = ?, best_streak = ?, total_days = ?,
                       last_study_day = ?, milestones = ?, version = version + 1
                       WHERE user_id = ? AND version = ?"#,
                )
                .bind(i64::from(record.current))
                .bind(i64::from(record.best_streak))
                .bind(i64::from(record.total_days))
                .bind(&last_study_day)
                .bind(&milestones_json)
                .bind(user_id.as_str())
                .bind(version as i64)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DomainError::ConcurrencyConflict {
                entity: "streak".to_string(),
                id: user_id.to_string(),
            });
        }

        Ok(expected_version.map_or(1, |v| v + 1))
    }
}

#[derive(sqlx::FromRow)]
struct StreakRow {
    #[allow(dead_code)]
    user_id: String,
    current_streak: i64,
    best_streak: i64,
    total_days: i64,
    last_study_day: Option<String>,
    milestones: Option<String>,
    version: i64,
}

impl TryFrom<StreakRow> for Versioned<StreakRecord> {
    type Error = DomainError;

    fn try_from(row: StreakRow) -> Result<Self, Self::Error> {
        let milestones: Vec<Milestone> = parse_json_or_default(row.milestones)?;
        let record = StreakRecord {
            current: row.current_streak as u32,
            best_streak: row.best_streak as u32,
            total_days: row.total_days as u32,
            last_study_day: parse_optional_datetime(row.last_study_day)?,
            milestones,
        };
        Ok(Versioned::new(record, row.version as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use chrono::{TimeZone, Utc};

    async fn setup_test_repo() -> SqliteStreakRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteStreakRepository::new(pool)
    }

    fn sample() -> StreakRecord {
        let day = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        StreakRecord {
            current: 7,
            best_streak: 10,
            total_days: 31,
            last_study_day: Some(day),
            milestones: vec![Milestone {
                days: 7,
                achieved_at: day,
                title: "Week Warrior".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_missing_record_loads_none() {
        let repo = setup_test_repo().await;
        assert!(repo.load(&UserId::new("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_then_update_bumps_version() {
        let repo = setup_test_repo().await;
        let user = UserId::new("u1");
        let mut record = sample();

        let v1 = repo.store(&user, &record, None).await.unwrap();
        assert_eq!(v1, 1);

        let loaded = repo.load(&user).await.unwrap().unwrap();
        assert_eq!(loaded.value, record);
        assert_eq!(loaded.version, 1);

        record.current = 8;
        let v2 = repo.store(&user, &record, Some(1)).await.unwrap();
        assert_eq!(v2, 2);
        assert_eq!(repo.load(&user).await.unwrap().unwrap().value.current, 8);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let repo = setup_test_repo().await;
        let user = UserId::new("u1");
        let record = sample();
        repo.store(&user, &record, None).await.unwrap();
        repo.store(&user, &record, Some(1)).await.unwrap();

        let err = repo.store(&user, &record, Some(1)).await.unwrap_err();
        assert!(err.is_conflict());

        let err = repo.store(&user, &record, None).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
