//! Achievement catalog: the static list plus a per-focus-area ladder.
//!
//! The catalog is a pure function of the focus areas. Ids of the dynamic
//! entries derive only from the focus-area id and the tier, so unlock
//! records stay meaningful whenever the catalog is rebuilt.

use crate::domain::models::{
    AchievementCategory, AchievementDefinition, FocusArea, Rarity, RequirementPredicate, TimeWindow,
};

const DEFAULT_ICON: &str = "🎯";

/// Keyword → icon lookup for focus-area names, first match wins.
const ICON_KEYWORDS: &[(&[&str], &str)] = &[
    (&["code", "coding", "programming", "stack", "dev", "software"], "💻"),
    (&["ml", "machine", "learning", "ai", "nvidia"], "🤖"),
    (&["design", "art", "drawing"], "🎨"),
    (&["math", "mathematics", "calculus", "statistics"], "📐"),
    (&["read", "reading", "book", "books"], "📚"),
    (&["fitness", "gym", "workout", "running"], "💪"),
    (&["music", "guitar", "piano"], "🎵"),
    (&["language", "languages", "spanish", "french", "japanese"], "🗣️"),
    (&["write", "writing", "blog"], "✍️"),
];

struct Tier {
    suffix: &'static str,
    title: &'static str,
    threshold: u32,
    points: u32,
    rarity: Rarity,
}

const fn tier(
    suffix: &'static str,
    title: &'static str,
    threshold: u32,
    points: u32,
    rarity: Rarity,
) -> Tier {
    Tier {
        suffix,
        title,
        threshold,
        points,
        rarity,
    }
}

const TASK_TIERS: [Tier; 3] = [
    tier("tasks_10", "Starter", 10, 25, Rarity::Common),
    tier("tasks_25", "Regular", 25, 75, Rarity::Uncommon),
    tier("tasks_50", "Expert", 50, 150, Rarity::Rare),
];

const HOUR_TIERS: [Tier; 3] = [
    tier("hours_25", "Devotee", 25, 100, Rarity::Uncommon),
    tier("hours_50", "Specialist", 50, 200, Rarity::Rare),
    tier("hours_100", "Master", 100, 400, Rarity::Legendary),
];

/// Icon for a focus area name by case-insensitive whole-word match.
pub fn icon_for(name: &str) -> &'static str {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    ICON_KEYWORDS
        .iter()
        .find(|(keywords, _)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map_or(DEFAULT_ICON, |(_, icon)| *icon)
}

#[allow(clippy::too_many_arguments)]
fn definition(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    category: AchievementCategory,
    requirement: RequirementPredicate,
    points: u32,
    rarity: Rarity,
) -> AchievementDefinition {
    AchievementDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        category,
        requirement,
        points,
        rarity,
    }
}

/// Entries every user gets.
pub fn static_achievements() -> Vec<AchievementDefinition> {
    use AchievementCategory::{Special, Streak, Tasks};
    use RequirementPredicate as R;

    vec![
        definition(
            "first_week",
            "Week Warrior",
            "Complete a 7-day streak",
            "🔥",
            Streak,
            R::Streak { days: 7 },
            50,
            Rarity::Common,
        ),
        definition(
            "consistency_king",
            "Consistency King",
            "Maintain a 30-day streak",
            "👑",
            Streak,
            R::Streak { days: 30 },
            200,
            Rarity::Rare,
        ),
        definition(
            "unstoppable",
            "Unstoppable Force",
            "Achieve a 100-day streak",
            "💫",
            Streak,
            R::Streak { days: 100 },
            500,
            Rarity::Legendary,
        ),
        definition(
            "first_task",
            "Getting Started",
            "Complete your first task",
            "🎯",
            Tasks,
            R::TasksCompleted { count: 1 },
            10,
            Rarity::Common,
        ),
        definition(
            "task_master",
            "Task Master",
            "Complete 50 tasks",
            "⚡",
            Tasks,
            R::TasksCompleted { count: 50 },
            100,
            Rarity::Uncommon,
        ),
        definition(
            "centurion",
            "Centurion",
            "Complete 100 tasks",
            "💯",
            Tasks,
            R::TasksCompleted { count: 100 },
            250,
            Rarity::Rare,
        ),
        definition(
            "early_bird",
            "Early Bird",
            "Complete a task before 7 AM",
            "🌅",
            Special,
            R::TimeOfDay {
                window: TimeWindow::EarlyMorning,
            },
            30,
            Rarity::Uncommon,
        ),
        definition(
            "night_owl",
            "Night Owl",
            "Complete a task after 11 PM",
            "🦉",
            Special,
            R::TimeOfDay {
                window: TimeWindow::LateNight,
            },
            30,
            Rarity::Uncommon,
        ),
        definition(
            "weekend_warrior",
            "Weekend Warrior",
            "Complete 10 tasks on weekends",
            "🏖️",
            Special,
            R::WeekendTasks { count: 10 },
            50,
            Rarity::Uncommon,
        ),
    ]
}

/// Task and hour ladders for one focus area.
pub fn focus_area_achievements(area: &FocusArea) -> Vec<AchievementDefinition> {
    let category = area.category_id();
    let icon = icon_for(&area.name);

    let tasks = TASK_TIERS.iter().map(|tier| AchievementDefinition {
        id: format!("{category}_{}", tier.suffix),
        name: format!("{} {}", area.name, tier.title),
        description: format!("Complete {} {} tasks", tier.threshold, area.name),
        icon: icon.to_string(),
        category: AchievementCategory::Category,
        requirement: RequirementPredicate::CategoryTasks {
            category: category.clone(),
            count: u64::from(tier.threshold),
        },
        points: tier.points,
        rarity: tier.rarity,
    });

    let hours = HOUR_TIERS.iter().map(|tier| AchievementDefinition {
        id: format!("{category}_{}", tier.suffix),
        name: format!("{} {}", area.name, tier.title),
        description: format!("Log {} hours in {}", tier.threshold, area.name),
        icon: icon.to_string(),
        category: AchievementCategory::Category,
        requirement: RequirementPredicate::CategoryHours {
            category: category.clone(),
            hours: f64::from(tier.threshold),
        },
        points: tier.points,
        rarity: tier.rarity,
    });

    tasks.chain(hours).collect()
}

/// Full catalog for a user's focus areas.
///
/// Duplicate focus-area ids contribute their ladder once.
pub fn build_catalog(focus_areas: &[FocusArea]) -> Vec<AchievementDefinition> {
    let mut catalog = static_achievements();
    let mut seen = std::collections::HashSet::new();
    for area in focus_areas {
        if seen.insert(area.category_id()) {
            catalog.extend(focus_area_achievements(area));
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas() -> Vec<FocusArea> {
        FocusArea::from_names(["Full-Stack Development", "Machine Learning", "Pottery"])
    }

    #[test]
    fn test_static_entries_present() {
        let catalog = build_catalog(&[]);
        let ids: Vec<&str> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "first_week", "consistency_king", "unstoppable", "first_task", "task_master",
                "centurion", "early_bird", "night_owl", "weekend_warrior",
            ]
        );
    }

    #[test]
    fn test_dynamic_ladder_ids() {
        let catalog = build_catalog(&areas());
        assert_eq!(catalog.len(), 9 + 3 * 6);
        for suffix in ["tasks_10", "tasks_25", "tasks_50", "hours_25", "hours_50", "hours_100"] {
            let id = format!("focus_2_{suffix}");
            assert!(catalog.iter().any(|a| a.id == id), "missing {id}");
        }
    }

    #[test]
    fn test_catalog_is_referentially_stable() {
        let a: Vec<String> = build_catalog(&areas()).into_iter().map(|d| d.id).collect();
        let b: Vec<String> = build_catalog(&areas()).into_iter().map(|d| d.id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_requirements_share_category_id() {
        let catalog = build_catalog(&areas());
        let entry = catalog.iter().find(|a| a.id == "focus_1_hours_50").unwrap();
        assert_eq!(
            entry.requirement,
            RequirementPredicate::CategoryHours {
                category: "focus_1".to_string(),
                hours: 50.0,
            }
        );
        assert_eq!(entry.rarity, Rarity::Rare);
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(icon_for("Full-Stack Development"), "💻");
        assert_eq!(icon_for("MACHINE LEARNING"), "🤖");
        assert_eq!(icon_for("Reading"), "📚");
        assert_eq!(icon_for("Pottery"), DEFAULT_ICON);
        // whole words only: "email" must not match "ml"
        assert_eq!(icon_for("Email triage"), DEFAULT_ICON);
    }

    #[test]
    fn test_duplicate_focus_ids_added_once() {
        let dup = vec![FocusArea::new("focus_1", "Rust"), FocusArea::new("focus_1", "Rust again")];
        assert_eq!(build_catalog(&dup).len(), 9 + 6);
    }
}
