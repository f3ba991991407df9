//! Streak CLI command.

use anyhow::Result;

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::table::{detail_table, list_table};
use crate::domain::models::{milestone_icon, StreakStats};

#[derive(Debug, serde::Serialize)]
pub struct StreakOutput {
    #[serde(flatten)]
    pub stats: StreakStats,
}

impl CommandOutput for StreakOutput {
    fn to_human(&self) -> String {
        let stats = &self.stats;
        let last = stats
            .last_study_day
            .map_or_else(|| "never".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let summary = detail_table(&[
            ("Current streak", format!("{} day(s)", stats.current_streak)),
            ("Best streak", format!("{} day(s)", stats.best_streak)),
            ("Days studied", stats.total_days.to_string()),
            ("Last study day", last),
        ]);

        if stats.milestones.is_empty() {
            return summary.to_string();
        }

        let mut milestones = list_table(&["", "milestone", "days", "reached"]);
        for milestone in &stats.milestones {
            milestones.add_row(vec![
                milestone_icon(milestone.days).unwrap_or("").to_string(),
                milestone.title.clone(),
                milestone.days.to_string(),
                milestone.achieved_at.format("%Y-%m-%d").to_string(),
            ]);
        }
        format!("{summary}\n\nMilestones:\n{milestones}")
    }
}

pub async fn execute(ctx: &CliContext, json_mode: bool) -> Result<()> {
    let stats = ctx
        .orchestrator
        .streak_engine()
        .get_streak_stats(&ctx.user_id)
        .await?;
    output(&StreakOutput { stats }, json_mode);
    Ok(())
}
