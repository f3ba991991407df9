//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FocusArea, UserId, UserProfile};
use crate::domain::ports::ProfileRepository;

use super::{parse_datetime, parse_json_or_default};

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn get(&self, user_id: &UserId) -> DomainResult<Option<UserProfile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = ?")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn upsert(&self, profile: &UserProfile) -> DomainResult<()> {
        let focus_json = serde_json::to_string(&profile.focus_areas)?;

        sqlx::query(
            r#"INSERT INTO user_profiles (user_id, display_name, focus_areas, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   display_name = excluded.display_name,
                   focus_areas = excluded.focus_areas,
                   updated_at = excluded.updated_at"#,
        )
        .bind(profile.user_id.as_str())
        .bind(&profile.display_name)
        .bind(&focus_json)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    display_name: String,
    focus_areas: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let focus_areas: Vec<FocusArea> = parse_json_or_default(row.focus_areas)?;
        Ok(UserProfile {
            user_id: UserId(row.user_id),
            display_name: row.display_name,
            focus_areas,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
