//! Profile CLI commands.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput};
use crate::cli::table::{detail_table, list_table};
use crate::domain::models::{FocusArea, UserProfile};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show the current profile
    Show,
    /// Create or update the profile
    Set {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Focus areas (comma-separated names); replaces the current list
        #[arg(short, long, value_delimiter = ',')]
        focus: Option<Vec<String>>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileOutput {
    pub user_id: String,
    pub display_name: String,
    pub focus_areas: Vec<FocusArea>,
    pub exists: bool,
}

impl ProfileOutput {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            display_name: profile.display_name.clone(),
            focus_areas: profile.focus_areas.clone(),
            exists: true,
        }
    }
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        if !self.exists {
            return format!(
                "No profile for '{}'. Create one with 'levelup profile set --name <NAME> --focus <AREAS>'.",
                self.user_id
            );
        }

        let header = detail_table(&[
            ("User", self.user_id.clone()),
            ("Name", self.display_name.clone()),
        ]);
        if self.focus_areas.is_empty() {
            return format!("{header}\nNo focus areas.");
        }

        let mut areas = list_table(&["id", "name", "category"]);
        for area in &self.focus_areas {
            areas.add_row(vec![area.id.clone(), area.name.clone(), area.category_id()]);
        }
        format!("{header}\n\nFocus areas:\n{areas}")
    }
}

pub async fn execute(args: ProfileArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let profiles = &ctx.repositories().profiles;

    match args.command {
        ProfileCommands::Show => {
            let result = match profiles.get(&ctx.user_id).await? {
                Some(profile) => ProfileOutput::from_profile(&profile),
                None => ProfileOutput {
                    user_id: ctx.user_id.to_string(),
                    display_name: String::new(),
                    focus_areas: Vec::new(),
                    exists: false,
                },
            };
            output(&result, json_mode);
        }
        ProfileCommands::Set { name, focus } => {
            let mut profile = profiles
                .get(&ctx.user_id)
                .await?
                .unwrap_or_else(|| {
                    UserProfile::new(ctx.user_id.clone(), ctx.user_id.as_str(), Vec::new())
                });

            if let Some(name) = name {
                profile.display_name = name;
            }
            if let Some(names) = focus {
                profile.focus_areas = FocusArea::from_names(names);
            }
            profile.updated_at = Utc::now();

            profiles.upsert(&profile).await?;
            // The catalog depends on focus areas; rebuild it on next use
            ctx.orchestrator.end_session(&ctx.user_id).await;

            output(&ProfileOutput::from_profile(&profile), json_mode);
        }
    }

    Ok(())
}
