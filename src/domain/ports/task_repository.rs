//! Task repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskRecord, UserId};

/// Filters for listing a user's tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// Repository port for task persistence operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn create(&self, user_id: &UserId, task: &TaskRecord) -> DomainResult<()>;

    /// Get a task by ID
    async fn get(&self, user_id: &UserId, id: Uuid) -> DomainResult<Option<TaskRecord>>;

    /// Update a task if its stored version still equals `task.version`.
    ///
    /// Returns the new version.
    async fn update(&self, user_id: &UserId, task: &TaskRecord) -> DomainResult<u64>;

    /// List tasks with optional filters
    async fn list(&self, user_id: &UserId, filter: TaskFilter) -> DomainResult<Vec<TaskRecord>>;
}
