//! Denormalized per-user progress counters.
//!
//! These mirror facts derivable from the task collection so achievement
//! rules can be checked with constant-time field reads.

use chrono::{DateTime, Datelike, TimeZone, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-user counters document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsRecord {
    pub tasks_completed: u64,
    pub tasks_by_category: BTreeMap<String, u64>,
    pub hours_by_category: BTreeMap<String, f64>,
    pub weekend_tasks: u64,
    pub streak_mirror: u32,
}

/// The post-commit counters handed to the achievement engine.
pub type StatsSnapshot = StatsRecord;

/// A single completion to fold into the counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionDelta<Tz: TimeZone> {
    pub category: String,
    pub time_spent_minutes: f64,
    /// Completion instant in the user's local offset; weekday is read locally.
    pub completed_at: DateTime<Tz>,
    /// Latest streak value, or `None` to keep the previous mirror.
    pub streak_value: Option<u32>,
}

/// Whether a timestamp falls on Saturday or Sunday in its own offset.
pub fn is_weekend<Tz: TimeZone>(at: &DateTime<Tz>) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

impl StatsRecord {
    /// Fold one completion into the counters.
    pub fn apply<Tz: TimeZone>(&mut self, delta: &CompletionDelta<Tz>) {
        self.tasks_completed = self.tasks_completed.saturating_add(1);
        *self
            .tasks_by_category
            .entry(delta.category.clone())
            .or_insert(0) += 1;

        let hours = (delta.time_spent_minutes.max(0.0)) / 60.0;
        *self
            .hours_by_category
            .entry(delta.category.clone())
            .or_insert(0.0) += hours;

        if is_weekend(&delta.completed_at) {
            self.weekend_tasks = self.weekend_tasks.saturating_add(1);
        }

        if let Some(streak) = delta.streak_value {
            self.streak_mirror = streak;
        }
    }

    pub fn tasks_in(&self, category: &str) -> u64 {
        self.tasks_by_category.get(category).copied().unwrap_or(0)
    }

    pub fn hours_in(&self, category: &str) -> f64 {
        self.hours_by_category.get(category).copied().unwrap_or(0.0)
    }

    /// Whether the total equals the sum of the per-category counts.
    pub fn is_consistent(&self) -> bool {
        self.tasks_by_category.values().sum::<u64>() == self.tasks_completed
    }
}
