//! Streak domain model.
//!
//! A streak counts consecutive UTC calendar days that contain at least one
//! qualifying completion. The day-boundary state machine lives here as a pure
//! function so the transactional engine can re-run it on every retry.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Day counts that award a milestone, with their title and icon.
///
/// Matching is exact: a streak that jumps past a day count never awards it.
pub const MILESTONE_TIERS: &[(u32, &str, &str)] = &[
    (7, "Week Warrior", "🔥"),
    (14, "Fortnight Fighter", "⚡"),
    (30, "Monthly Master", "🌟"),
    (60, "Dedication Diamond", "💫"),
    (90, "Quarterly King", "👑"),
];

/// Deterministic UTC day index for a timestamp, independent of the local
/// timezone the timestamp was captured in.
pub fn normalize_to_calendar_day<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> i64 {
    timestamp.timestamp().div_euclid(SECONDS_PER_DAY)
}

/// Milestone title for an exact streak length, if there is one.
pub fn milestone_title(days: u32) -> Option<&'static str> {
    MILESTONE_TIERS
        .iter()
        .find(|(d, _, _)| *d == days)
        .map(|(_, title, _)| *title)
}

/// Milestone icon for an exact streak length, if there is one.
pub fn milestone_icon(days: u32) -> Option<&'static str> {
    MILESTONE_TIERS
        .iter()
        .find(|(d, _, _)| *d == days)
        .map(|(_, _, icon)| *icon)
}

/// A milestone reached while extending a streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub days: u32,
    pub achieved_at: DateTime<Utc>,
    pub title: String,
}

/// Per-user streak document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current: u32,
    pub best_streak: u32,
    pub total_days: u32,
    pub last_study_day: Option<DateTime<Utc>>,
    pub milestones: Vec<Milestone>,
}

/// Outcome kind of a streak update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    /// Same calendar day as the last recorded study day; nothing written.
    Unchanged,
    /// Consecutive day; the streak grew by one.
    Extended,
    /// First ever update, a gap of more than a day, or clock skew.
    Reset,
}

impl StreakStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Extended => "extended",
            Self::Reset => "reset",
        }
    }
}

impl std::fmt::Display for StreakStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result returned to callers of `update_streak`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub status: StreakStatus,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
}

impl StreakUpdate {
    /// Short human message describing the update.
    pub fn message(&self) -> String {
        match self.status {
            StreakStatus::Unchanged => "Already logged today".to_string(),
            StreakStatus::Extended => format!("Streak extended to {} days!", self.streak),
            StreakStatus::Reset => "New streak started!".to_string(),
        }
    }
}

/// Read-only view of a streak record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_days: u32,
    pub milestones: Vec<Milestone>,
    pub last_study_day: Option<DateTime<Utc>>,
}

impl From<&StreakRecord> for StreakStats {
    fn from(record: &StreakRecord) -> Self {
        Self {
            current_streak: record.current,
            best_streak: record.best_streak,
            total_days: record.total_days,
            milestones: record.milestones.clone(),
            last_study_day: record.last_study_day,
        }
    }
}

/// What the transition function decided for a given record and instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StreakTransition {
    pub update: StreakUpdate,
    /// The record to write back, `None` when nothing changes.
    pub next: Option<StreakRecord>,
    /// Signed day difference between `now` and the last study day.
    pub day_diff: Option<i64>,
}

impl StreakTransition {
    /// Whether the last study day lies in the future relative to `now`.
    pub fn is_clock_skew(&self) -> bool {
        self.day_diff.is_some_and(|d| d < 0)
    }
}

impl StreakRecord {
    /// Compute the day-boundary transition for a completion at `now`.
    ///
    /// Pure: the caller decides whether to persist `next`.
    pub fn transition(&self, now: DateTime<Utc>) -> StreakTransition {
        let day_diff = self
            .last_study_day
            .map(|last| normalize_to_calendar_day(&now) - normalize_to_calendar_day(&last));

        if day_diff == Some(0) {
            return StreakTransition {
                update: StreakUpdate {
                    status: StreakStatus::Unchanged,
                    streak: self.current,
                    milestone: None,
                },
                next: None,
                day_diff,
            };
        }

        let mut next = self.clone();
        next.total_days = next.total_days.saturating_add(1);
        next.last_study_day = Some(now);

        if day_diff == Some(1) {
            next.current = next.current.saturating_add(1);
            next.best_streak = next.best_streak.max(next.current);

            let milestone = milestone_title(next.current).map(str::to_string);
            if let Some(title) = &milestone {
                if !next.milestones.iter().any(|m| m.days == next.current) {
                    next.milestones.push(Milestone {
                        days: next.current,
                        achieved_at: now,
                        title: title.clone(),
                    });
                }
            }

            return StreakTransition {
                update: StreakUpdate {
                    status: StreakStatus::Extended,
                    streak: next.current,
                    milestone,
                },
                next: Some(next),
                day_diff,
            };
        }

        next.current = 1;
        next.best_streak = next.best_streak.max(1);
        StreakTransition {
            update: StreakUpdate {
                status: StreakStatus::Reset,
                streak: 1,
                milestone: None,
            },
            next: Some(next),
            day_diff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_calendar_day_ignores_local_offset() {
        let utc = at(2024, 3, 10, 1);
        let tokyo = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        let la = utc.with_timezone(&FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(normalize_to_calendar_day(&utc), normalize_to_calendar_day(&tokyo));
        assert_eq!(normalize_to_calendar_day(&utc), normalize_to_calendar_day(&la));
    }

    #[test]
    fn test_calendar_day_before_epoch() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(normalize_to_calendar_day(&t), -1);
    }

    #[test]
    fn test_first_update_resets_to_one() {
        let t = StreakRecord::default().transition(at(2024, 1, 1, 9));
        assert_eq!(t.update.status, StreakStatus::Reset);
        assert_eq!(t.update.streak, 1);
        let next = t.next.unwrap();
        assert_eq!(next.current, 1);
        assert_eq!(next.best_streak, 1);
        assert_eq!(next.total_days, 1);
        assert!(t.day_diff.is_none());
    }

    #[test]
    fn test_same_day_is_unchanged() {
        let record = StreakRecord {
            current: 3,
            best_streak: 5,
            total_days: 10,
            last_study_day: Some(at(2024, 1, 1, 1)),
            milestones: vec![],
        };
        let t = record.transition(at(2024, 1, 1, 23));
        assert_eq!(t.update.status, StreakStatus::Unchanged);
        assert_eq!(t.update.streak, 3);
        assert!(t.next.is_none());
    }

    #[test]
    fn test_extension_hits_week_milestone() {
        let record = StreakRecord {
            current: 6,
            best_streak: 6,
            total_days: 6,
            last_study_day: Some(at(2024, 1, 1, 20)),
            milestones: vec![],
        };
        let now = at(2024, 1, 2, 8);
        let t = record.transition(now);
        assert_eq!(t.update.status, StreakStatus::Extended);
        assert_eq!(t.update.streak, 7);
        assert_eq!(t.update.milestone.as_deref(), Some("Week Warrior"));
        let next = t.next.unwrap();
        assert_eq!(next.best_streak, 7);
        assert_eq!(next.milestones.len(), 1);
        assert_eq!(next.milestones[0].achieved_at, now);
    }

    #[test]
    fn test_milestone_not_appended_twice() {
        let earlier = at(2023, 6, 1, 8);
        let record = StreakRecord {
            current: 6,
            best_streak: 20,
            total_days: 40,
            last_study_day: Some(at(2024, 1, 1, 20)),
            milestones: vec![Milestone {
                days: 7,
                achieved_at: earlier,
                title: "Week Warrior".to_string(),
            }],
        };
        let next = record.transition(at(2024, 1, 2, 8)).next.unwrap();
        assert_eq!(next.milestones.len(), 1);
        assert_eq!(next.milestones[0].achieved_at, earlier);
    }

    #[test]
    fn test_gap_resets_but_keeps_best() {
        let record = StreakRecord {
            current: 5,
            best_streak: 9,
            total_days: 12,
            last_study_day: Some(at(2024, 1, 1, 12)),
            milestones: vec![],
        };
        let t = record.transition(at(2024, 1, 1, 12) + Duration::days(3));
        assert_eq!(t.update.status, StreakStatus::Reset);
        assert_eq!(t.update.streak, 1);
        let next = t.next.unwrap();
        assert_eq!(next.best_streak, 9);
        assert_eq!(next.total_days, 13);
    }

    #[test]
    fn test_future_last_day_is_clock_skew_reset() {
        let record = StreakRecord {
            current: 4,
            best_streak: 4,
            total_days: 4,
            last_study_day: Some(at(2024, 1, 5, 12)),
            milestones: vec![],
        };
        let t = record.transition(at(2024, 1, 3, 12));
        assert!(t.is_clock_skew());
        assert_eq!(t.update.status, StreakStatus::Reset);
        assert_eq!(t.next.unwrap().current, 1);
    }

    #[test]
    fn test_milestone_skipped_is_never_awarded() {
        let record = StreakRecord {
            current: 8,
            best_streak: 8,
            total_days: 8,
            last_study_day: Some(at(2024, 1, 1, 12)),
            milestones: vec![],
        };
        let t = record.transition(at(2024, 1, 2, 12));
        assert_eq!(t.update.streak, 9);
        assert!(t.update.milestone.is_none());
    }

    #[test]
    fn test_messages() {
        let update = StreakUpdate {
            status: StreakStatus::Extended,
            streak: 4,
            milestone: None,
        };
        assert_eq!(update.message(), "Streak extended to 4 days!");
        assert_eq!(milestone_icon(90), Some("👑"));
        assert_eq!(milestone_title(8), None);
    }
}
