//! Task CLI commands.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::cli::id_resolver::resolve_task_id;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{
    validate_category, AchievementDefinition, CompleteTaskRequest, CompletionOutcome, StepFailure,
    TaskData, TaskRecord,
};
use crate::domain::ports::TaskFilter;

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a new task
    Add {
        /// Task title
        title: String,
        /// Category (defaults to "general")
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List tasks
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        done: bool,
        /// Only open tasks
        #[arg(long)]
        pending: bool,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum number of tasks to display
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// Complete a task and update streak, stats and achievements
    Complete {
        /// Task ID or unique prefix
        id: String,
        /// Override the task's category
        #[arg(short, long)]
        category: Option<String>,
        /// Minutes spent on the task
        #[arg(short, long)]
        minutes: Option<u64>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct TaskOutput {
    pub id: String,
    pub title: String,
    pub category: String,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub time_spent_seconds: Option<u64>,
}

impl From<&TaskRecord> for TaskOutput {
    fn from(task: &TaskRecord) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            category: task.category.clone(),
            completed: task.completed,
            completed_at: task.completed_at.map(|t| t.to_rfc3339()),
            time_spent_seconds: task.time_spent_seconds,
        }
    }
}

impl CommandOutput for TaskOutput {
    fn to_human(&self) -> String {
        format!("Added task {} ({}) in '{}'", self.title, &self.id[..8], self.category)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct TaskListOutput {
    pub tasks: Vec<TaskOutput>,
    pub total: usize,
}

impl CommandOutput for TaskListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "title", "category", "done", "minutes"]);
        for task in &self.tasks {
            table.add_row(vec![
                task.id[..8].to_string(),
                truncate(&task.title, 40),
                task.category.clone(),
                if task.completed { "yes" } else { "-" }.to_string(),
                task.time_spent_seconds
                    .map_or_else(|| "-".to_string(), |s| (s / 60).to_string()),
            ]);
        }
        render_list("task", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct CompletionOutput {
    pub task_id: String,
    #[serde(flatten)]
    pub outcome: CompletionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandOutput for CompletionOutput {
    fn to_human(&self) -> String {
        let outcome = &self.outcome;
        if !outcome.success {
            return format!(
                "Could not complete task {}: {}",
                &self.task_id[..8],
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        if outcome.already_completed {
            return "Task was already completed.".to_string();
        }

        let mut lines = vec![self
            .message
            .clone()
            .unwrap_or_else(|| "Task completed!".to_string())];
        if let Some(streak) = outcome.streak {
            lines.push(format!("Current streak: {streak} day(s)"));
        }
        for achievement in &outcome.new_achievements {
            lines.push(unlock_line(achievement));
        }
        for failure in &outcome.degraded {
            lines.push(degraded_line(failure));
        }
        lines.join("\n")
    }
}

fn unlock_line(achievement: &AchievementDefinition) -> String {
    format!(
        "  {} {} (+{} pts, {})",
        achievement.icon,
        achievement.name,
        achievement.points,
        achievement.rarity.as_str()
    )
}

fn degraded_line(failure: &StepFailure) -> String {
    format!("  warning: {} skipped: {}", failure.step, failure.error)
}

pub async fn execute(args: TaskArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let tasks = &ctx.repositories().tasks;

    match args.command {
        TaskCommands::Add { title, category } => {
            let category = validate_category(category.as_deref())?;
            let task = TaskRecord::new(title, category);
            tasks
                .create(&ctx.user_id, &task)
                .await
                .context("Failed to add task")?;
            output(&TaskOutput::from(&task), json_mode);
        }
        TaskCommands::List {
            done,
            pending,
            category,
            limit,
        } => {
            let completed = match (done, pending) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let category = category
                .map(|c| validate_category(Some(c.as_str())))
                .transpose()?;
            let filter = TaskFilter {
                completed,
                category,
                limit: Some(limit),
            };
            let found = tasks.list(&ctx.user_id, filter).await?;
            let result = TaskListOutput {
                total: found.len(),
                tasks: found.iter().map(TaskOutput::from).collect(),
            };
            output(&result, json_mode);
        }
        TaskCommands::Complete {
            id,
            category,
            minutes,
        } => {
            let task_id = resolve_task_id(tasks.as_ref(), &ctx.user_id, &id).await?;
            let mut notifications = ctx.notifier.subscribe();

            let outcome = ctx
                .orchestrator
                .complete_task(CompleteTaskRequest {
                    user_id: ctx.user_id.clone(),
                    task_id,
                    task_data: TaskData {
                        category,
                        time_spent_seconds: minutes.map(|m| m.saturating_mul(60)),
                    },
                    now: Local::now().fixed_offset(),
                })
                .await;

            let message = notifications.try_recv().ok().map(|n| n.streak_message);
            let success = outcome.success;
            output(
                &CompletionOutput {
                    task_id: task_id.to_string(),
                    outcome,
                    message,
                },
                json_mode,
            );
            if !success {
                anyhow::bail!("Task completion failed");
            }
        }
    }

    Ok(())
}
