//! Achievements CLI command.

use anyhow::Result;
use std::collections::HashMap;

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::table::list_table;
use crate::domain::models::{AchievementCategory, AchievementProgress};

#[derive(Debug, serde::Serialize)]
pub struct AchievementRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub points: u32,
    pub rarity: String,
    pub unlocked: bool,
    pub earned_at: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AchievementsOutput {
    pub progress: AchievementProgress,
    pub achievements: Vec<AchievementRow>,
}

impl CommandOutput for AchievementsOutput {
    fn to_human(&self) -> String {
        let progress = &self.progress;
        let next = progress
            .level
            .next_level_at
            .map_or_else(String::new, |at| format!(", next level at {at}"));
        let mut lines = vec![format!(
            "Level: {} ({} pts{next})\nUnlocked {}/{}",
            progress.level.name, progress.total_points, progress.unlocked, progress.total
        )];

        for category in AchievementCategory::ALL {
            let rows: Vec<&AchievementRow> = self
                .achievements
                .iter()
                .filter(|a| a.category == category)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let mut table = list_table(&["", "name", "points", "rarity", "earned"]);
            for row in rows {
                table.add_row(vec![
                    if row.unlocked { row.icon.clone() } else { "🔒".to_string() },
                    row.name.clone(),
                    row.points.to_string(),
                    row.rarity.clone(),
                    row.earned_at.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            lines.push(format!("\n{}:\n{table}", category.display_name()));
        }

        lines.join("\n")
    }
}

pub async fn execute(ctx: &CliContext, all: bool, json_mode: bool) -> Result<()> {
    let earned: HashMap<String, String> = ctx
        .repositories()
        .achievements
        .list_unlocked(&ctx.user_id)
        .await?
        .into_iter()
        .map(|u| (u.achievement_id, u.earned_at.format("%Y-%m-%d").to_string()))
        .collect();

    let session = ctx.orchestrator.session(&ctx.user_id).await?;
    let engine = session.lock().await;

    let achievements = engine
        .catalog()
        .iter()
        .filter(|a| all || engine.is_unlocked(&a.id))
        .map(|a| AchievementRow {
            id: a.id.clone(),
            name: a.name.clone(),
            description: a.description.clone(),
            icon: a.icon.clone(),
            category: a.category,
            points: a.points,
            rarity: a.rarity.as_str().to_string(),
            unlocked: engine.is_unlocked(&a.id),
            earned_at: earned.get(&a.id).cloned(),
        })
        .collect();

    let result = AchievementsOutput {
        progress: engine.progress(),
        achievements,
    };
    output(&result, json_mode);
    Ok(())
}
