//! levelup CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use levelup::cli::commands::{achievements, profile, stats, streak, task};
use levelup::cli::{handle_error, Cli, CliContext, Commands};
use levelup::domain::models::Config;
use levelup::infrastructure::config::ConfigLoader;
use levelup::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => ConfigLoader::load().context("Failed to load configuration"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))
        .context("Failed to initialize logging")?;

    let ctx = CliContext::from_config(&config, cli.user).await?;
    tracing::debug!(user_id = %ctx.user_id, database = %config.database.path, "levelup starting");

    match cli.command {
        Commands::Profile(args) => profile::execute(args, &ctx, cli.json).await,
        Commands::Task(args) => task::execute(args, &ctx, cli.json).await,
        Commands::Streak => streak::execute(&ctx, cli.json).await,
        Commands::Stats => stats::execute(&ctx, cli.json).await,
        Commands::Achievements { all } => achievements::execute(&ctx, all, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}
