//! Stats CLI command.

use anyhow::Result;

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::table::{detail_table, list_table};
use crate::domain::models::StatsSnapshot;

#[derive(Debug, serde::Serialize)]
pub struct StatsOutput {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let stats = &self.stats;
        let summary = detail_table(&[
            ("Tasks completed", stats.tasks_completed.to_string()),
            ("Weekend tasks", stats.weekend_tasks.to_string()),
            ("Streak", stats.streak_mirror.to_string()),
        ]);
        if stats.tasks_by_category.is_empty() {
            return summary.to_string();
        }

        let mut categories = list_table(&["category", "tasks", "hours"]);
        for (category, count) in &stats.tasks_by_category {
            categories.add_row(vec![
                category.clone(),
                count.to_string(),
                format!("{:.1}", stats.hours_in(category)),
            ]);
        }
        format!("{summary}\n\nBy category:\n{categories}")
    }
}

pub async fn execute(ctx: &CliContext, json_mode: bool) -> Result<()> {
    let stats = ctx
        .orchestrator
        .stats_aggregator()
        .get_stats(&ctx.user_id)
        .await?;
    output(&StatsOutput { stats }, json_mode);
    Ok(())
}
