//! User profile and focus areas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::normalize_category;

/// Opaque user key shared by every per-user document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-chosen area of focus; its id doubles as a task category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    pub id: String,
    pub name: String,
}

impl FocusArea {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Category id this area maps to in tasks and stats.
    pub fn category_id(&self) -> String {
        normalize_category(&self.id)
    }

    /// Build focus areas from display names, numbering them `focus_1..`.
    ///
    /// Blank names are skipped without consuming a number.
    pub fn from_names<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .enumerate()
            .map(|(i, name)| Self::new(format!("focus_{}", i + 1), name))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub focus_areas: Vec<FocusArea>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        focus_areas: Vec<FocusArea>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            display_name: display_name.into(),
            focus_areas,
            created_at: now,
            updated_at: now,
        }
    }
}
