//! Shared state for CLI commands.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::sqlite::initialize_from_config;
use crate::domain::models::{Config, UserId};
use crate::services::{BroadcastNotifier, CompletionOrchestrator, Repositories, TransactionRunner};

/// Everything a command needs: the acting user, the wired-up services and
/// the notifier the completion saga publishes to.
pub struct CliContext {
    pub user_id: UserId,
    pub orchestrator: CompletionOrchestrator,
    pub notifier: Arc<BroadcastNotifier>,
}

impl CliContext {
    /// Open the database named in `config` and wire services over it.
    pub async fn from_config(config: &Config, user: Option<String>) -> Result<Self> {
        let pool = initialize_from_config(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let user_id = UserId::new(user.unwrap_or_else(|| config.user.default_id.clone()));
        let notifier = Arc::new(BroadcastNotifier::default());
        let orchestrator = CompletionOrchestrator::new(
            Repositories::sqlite(pool),
            notifier.clone(),
            TransactionRunner::from(&config.transactions),
        );

        Ok(Self {
            user_id,
            orchestrator,
            notifier,
        })
    }

    pub fn repositories(&self) -> &Repositories {
        self.orchestrator.repositories()
    }
}
