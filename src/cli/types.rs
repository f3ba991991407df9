//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::profile::ProfileArgs;
use super::commands::task::TaskArgs;

#[derive(Parser, Debug)]
#[command(name = "levelup")]
#[command(about = "Streaks, progress counters and achievements for your tasks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// User to act as (defaults to user.default_id from config)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Load configuration from this file instead of .levelup/
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or update the user profile
    Profile(ProfileArgs),

    /// Task management commands
    Task(TaskArgs),

    /// Show the current study streak
    Streak,

    /// Show progress counters
    Stats,

    /// Show achievements and player level
    Achievements {
        /// Include locked achievements
        #[arg(short, long)]
        all: bool,
    },
}
