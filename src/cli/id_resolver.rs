//! Short ID prefix resolution for task commands.
//!
//! Accepts any unique prefix of a task UUID, similar to git short hashes.

use anyhow::{bail, Result};
use uuid::Uuid;

use crate::domain::models::{TaskRecord, UserId};
use crate::domain::ports::{TaskFilter, TaskRepository};

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!("Invalid ID prefix '{prefix}': must contain only hex characters and dashes");
    }
    Ok(())
}

/// Pick the single task whose id starts with `prefix`.
pub fn match_prefix(tasks: &[TaskRecord], prefix: &str) -> Result<Uuid> {
    validate_prefix(prefix)?;
    let needle = prefix.to_lowercase();
    let matches: Vec<Uuid> = tasks
        .iter()
        .map(|t| t.id)
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => bail!("No task found matching '{prefix}'"),
        [id] => Ok(*id),
        many => bail!(
            "Ambiguous task prefix '{prefix}' matches {} tasks; use more characters",
            many.len()
        ),
    }
}

/// Resolve a task ID or prefix for a user.
pub async fn resolve_task_id(
    tasks: &dyn TaskRepository,
    user_id: &UserId,
    prefix: &str,
) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(prefix) {
        return Ok(id);
    }
    let all = tasks.list(user_id, TaskFilter::default()).await?;
    match_prefix(&all, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_id(id: &str) -> TaskRecord {
        let mut task = TaskRecord::new("t", "general");
        task.id = Uuid::parse_str(id).unwrap();
        task
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let tasks = vec![
            task_with_id("aaaa1111-0000-0000-0000-000000000000"),
            task_with_id("bbbb2222-0000-0000-0000-000000000000"),
        ];
        let id = match_prefix(&tasks, "AAAA").unwrap();
        assert_eq!(id, tasks[0].id);
    }

    #[test]
    fn test_ambiguous_and_missing_prefixes() {
        let tasks = vec![
            task_with_id("aaaa1111-0000-0000-0000-000000000000"),
            task_with_id("aaaa2222-0000-0000-0000-000000000000"),
        ];
        assert!(match_prefix(&tasks, "aaaa").is_err());
        assert!(match_prefix(&tasks, "cccc").is_err());
        assert!(match_prefix(&tasks, "xyz").is_err());
    }
}
