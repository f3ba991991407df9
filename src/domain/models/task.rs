//! Task record as seen by the gamification core.
//!
//! Task CRUD lives elsewhere; the core only marks tasks complete and mirrors
//! them on the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Category used when a task carries none.
pub const DEFAULT_CATEGORY: &str = "general";

const MAX_CATEGORY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub category: String,
    pub time_spent_seconds: Option<u64>,
    /// Seconds logged by focus sessions, accumulated optimistically on clients.
    pub total_time_logged: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl TaskRecord {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            completed_at: None,
            category: category.into(),
            time_spent_seconds: None,
            total_time_logged: 0,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Mark the task complete at `now`.
    pub fn mark_completed(
        &mut self,
        now: DateTime<Utc>,
        category: String,
        time_spent_seconds: Option<u64>,
    ) {
        self.completed = true;
        self.completed_at = Some(now);
        self.category = category;
        if let Some(secs) = time_spent_seconds {
            self.time_spent_seconds = Some(secs);
        }
        self.updated_at = now;
    }
}

/// Lowercase a category and turn whitespace runs into underscores.
///
/// Blank input falls back to [`DEFAULT_CATEGORY`].
pub fn normalize_category(raw: &str) -> String {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    if normalized.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        normalized
    }
}

/// Normalize and validate a category id.
pub fn validate_category(raw: Option<&str>) -> DomainResult<String> {
    let category = normalize_category(raw.unwrap_or_default());
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(DomainError::ValidationFailed(format!(
            "category exceeds {MAX_CATEGORY_LEN} characters"
        )));
    }
    if let Some(bad) = category
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '&' | '.')))
    {
        return Err(DomainError::ValidationFailed(format!(
            "category contains invalid character {bad:?}"
        )));
    }
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("Machine  Learning"), "machine_learning");
        assert_eq!(normalize_category("  Full Stack\tDev "), "full_stack_dev");
        assert_eq!(normalize_category(""), DEFAULT_CATEGORY);
        assert_eq!(normalize_category("   "), DEFAULT_CATEGORY);
        assert_eq!(normalize_category("focus_1"), "focus_1");
    }

    #[test]
    fn test_validate_category_rejects_garbage() {
        assert!(validate_category(Some("a/b")).is_err());
        assert!(validate_category(Some(&"x".repeat(65))).is_err());
        assert_eq!(validate_category(None).unwrap(), "general");
        assert_eq!(validate_category(Some("NVIDIA & AI")).unwrap(), "nvidia_&_ai");
    }

    #[test]
    fn test_mark_completed_keeps_time_when_absent() {
        let mut task = TaskRecord::new("Read chapter", "general");
        task.time_spent_seconds = Some(60);
        let now = Utc::now();
        task.mark_completed(now, "reading".to_string(), None);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));
        assert_eq!(task.time_spent_seconds, Some(60));
        assert_eq!(task.category, "reading");
    }
}
