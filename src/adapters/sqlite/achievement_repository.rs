//! SQLite implementation of the AchievementRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{UnlockedAchievement, UserId};
use crate::domain::ports::AchievementRepository;

use super::parse_datetime;

#[derive(Clone)]
pub struct SqliteAchievementRepository {
    pool: SqlitePool,
}

impl SqliteAchievementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementRepository for SqliteAchievementRepository {
    async fn list_unlocked(&self, user_id: &UserId) -> DomainResult<Vec<UnlockedAchievement>> {
        let rows: Vec<UnlockRow> = sqlx::query_as(
            "SELECT achievement_id, earned_at, points FROM unlocked_achievements
             WHERE user_id = ? ORDER BY earned_at, achievement_id",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UnlockedAchievement::try_from).collect()
    }

    async fn insert_batch(
        &self,
        user_id: &UserId,
        unlocks: &[UnlockedAchievement],
    ) -> DomainResult<()> {
        if unlocks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for unlock in unlocks {
            sqlx::query(
                "INSERT OR IGNORE INTO unlocked_achievements (user_id, achievement_id, earned_at, points)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id.as_str())
            .bind(&unlock.achievement_id)
            .bind(unlock.earned_at.to_rfc3339())
            .bind(i64::from(unlock.points))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UnlockRow {
    achievement_id: String,
    earned_at: String,
    points: i64,
}

impl TryFrom<UnlockRow> for UnlockedAchievement {
    type Error = DomainError;

    fn try_from(row: UnlockRow) -> Result<Self, Self::Error> {
        Ok(UnlockedAchievement {
            achievement_id: row.achievement_id,
            earned_at: parse_datetime(&row.earned_at)?,
            points: row.points as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use chrono::{Duration, TimeZone, Utc};

    fn unlock(id: &str, points: u32) -> UnlockedAchievement {
        UnlockedAchievement {
            achievement_id: id.to_string(),
            earned_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            points,
        }
    }

    #[tokio::test]
    async fn test_batch_insert_and_list() {
        let repo = SqliteAchievementRepository::new(create_migrated_test_pool().await.unwrap());
        let user = UserId::new("u1");

        repo.insert_batch(&user, &[unlock("first_task", 10), unlock("first_week", 50)])
            .await
            .unwrap();

        let listed = repo.list_unlocked(&user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].achievement_id, "first_task");
        assert!(repo.list_unlocked(&UserId::new("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_unlock_keeps_first_timestamp() {
        let repo = SqliteAchievementRepository::new(create_migrated_test_pool().await.unwrap());
        let user = UserId::new("u1");
        let first = unlock("first_task", 10);
        repo.insert_batch(&user, &[first.clone()]).await.unwrap();

        let mut later = first.clone();
        later.earned_at += Duration::days(3);
        repo.insert_batch(&user, &[later]).await.unwrap();

        let listed = repo.list_unlocked(&user).await.unwrap();
        assert_eq!(listed, vec![first]);
    }
}
