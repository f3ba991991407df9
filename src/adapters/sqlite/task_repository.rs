//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskRecord, UserId};
use crate::domain::ports::{TaskFilter, TaskRepository};

use super::{parse_datetime, parse_optional_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, user_id: &UserId, id: Uuid) -> DomainResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM tasks WHERE user_id = ? AND id = ?")
            .bind(user_id.as_str())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, user_id: &UserId, task: &TaskRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO tasks (user_id, id, title, completed, completed_at, category,
               time_spent_seconds, total_time_logged, created_at, updated_at, version)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user_id.as_str())
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(task.completed)
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .bind(&task.category)
        .bind(task.time_spent_seconds.map(|s| s as i64))
        .bind(task.total_time_logged as i64)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .bind(task.version as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: &UserId, id: Uuid) -> DomainResult<Option<TaskRecord>> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE user_id = ? AND id = ?")
                .bind(user_id.as_str())
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TaskRecord::try_from).transpose()
    }

    async fn update(&self, user_id: &UserId, task: &TaskRecord) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"UPDATE tasks SET title = ?, completed = ?, completed_at = ?, category = ?,
               time_spent_seconds = ?, total_time_logged = ?, updated_at = ?,
               version = version + 1
               WHERE user_id = ? AND id = ? AND version = ?"#,
        )
        .bind(&task.title)
        .bind(task.completed)
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .bind(&task.category)
        .bind(task.time_spent_seconds.map(|s| s as i64))
        .bind(task.total_time_logged as i64)
        .bind(task.updated_at.to_rfc3339())
        .bind(user_id.as_str())
        .bind(task.id.to_string())
        .bind(task.version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if self.exists(user_id, task.id).await? {
                return Err(DomainError::ConcurrencyConflict {
                    entity: "task".to_string(),
                    id: task.id.to_string(),
                });
            }
            return Err(DomainError::TaskNotFound(task.id));
        }

        Ok(task.version + 1)
    }

    async fn list(&self, user_id: &UserId, filter: TaskFilter) -> DomainResult<Vec<TaskRecord>> {
        let mut query = String::from("SELECT * FROM tasks WHERE user_id = ?");

        if filter.completed.is_some() {
            query.push_str(" AND completed = ?");
        }
        if filter.category.is_some() {
            query.push_str(" AND category = ?");
        }
        query.push_str(" ORDER BY created_at DESC");
        if filter.limit.is_some() {
            query.push_str(" LIMIT ?");
        }

        let mut q = sqlx::query_as::<_, TaskRow>(&query).bind(user_id.as_str());
        if let Some(completed) = filter.completed {
            q = q.bind(completed);
        }
        if let Some(category) = &filter.category {
            q = q.bind(category);
        }
        if let Some(limit) = filter.limit {
            q = q.bind(limit);
        }

        let rows: Vec<TaskRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TaskRecord::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    completed: bool,
    completed_at: Option<String>,
    category: String,
    time_spent_seconds: Option<i64>,
    total_time_logged: i64,
    created_at: String,
    updated_at: String,
    version: i64,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(TaskRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            completed: row.completed,
            completed_at: parse_optional_datetime(row.completed_at)?,
            category: row.category,
            time_spent_seconds: row.time_spent_seconds.map(|s| s as u64),
            total_time_logged: row.total_time_logged as u64,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            version: row.version as u64,
        })
    }
}
