//! Achievement engine: per-session unlock state and rule evaluation.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AchievementDefinition, AchievementProgress, EvaluationContext, PlayerLevel, UnlockedAchievement,
    UserId,
};
use crate::domain::ports::AchievementRepository;

/// Unlock state for one user, loaded once per session.
///
/// The in-memory set is authoritative for "already unlocked" during the
/// session. It may run ahead of the store when a batched write fails; the
/// next session reloads from the store.
pub struct AchievementEngine {
    repository: Arc<dyn AchievementRepository>,
    user_id: UserId,
    catalog: Vec<AchievementDefinition>,
    /// Unlocked id → points awarded.
    unlocked: BTreeMap<String, u32>,
}

impl AchievementEngine {
    #[instrument(skip(repository, catalog), fields(user_id = %user_id))]
    pub async fn load(
        repository: Arc<dyn AchievementRepository>,
        user_id: UserId,
        catalog: Vec<AchievementDefinition>,
    ) -> DomainResult<Self> {
        let unlocked = repository
            .list_unlocked(&user_id)
            .await?
            .into_iter()
            .map(|u| (u.achievement_id, u.points))
            .collect::<BTreeMap<_, _>>();

        debug!(unlocked = unlocked.len(), catalog = catalog.len(), "achievement state loaded");
        Ok(Self {
            repository,
            user_id,
            catalog,
            unlocked,
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn catalog(&self) -> &[AchievementDefinition] {
        &self.catalog
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked.contains_key(achievement_id)
    }

    /// Locked catalog entries whose rule holds for `context`.
    ///
    /// Each match is marked unlocked as soon as it is found, so neither a
    /// repeated id in the catalog nor a second call with the same context
    /// yields it again.
    pub fn evaluate(&mut self, context: &EvaluationContext<'_>) -> Vec<AchievementDefinition> {
        let trigger = context.trigger();
        let mut matched = Vec::new();
        for def in &self.catalog {
            if def.requirement.trigger() != trigger || !def.requirement.is_satisfied(context) {
                continue;
            }
            if let Entry::Vacant(slot) = self.unlocked.entry(def.id.clone()) {
                slot.insert(def.points);
                matched.push(def.clone());
            }
        }

        if !matched.is_empty() {
            debug!(%trigger, count = matched.len(), "achievements matched");
        }
        matched
    }

    /// Write a batch of unlocks in one all-or-nothing operation.
    ///
    /// The in-memory set is left as is when the write fails.
    pub async fn persist_unlocks(
        &self,
        batch: &[AchievementDefinition],
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let records: Vec<UnlockedAchievement> = batch
            .iter()
            .map(|def| UnlockedAchievement::from_definition(def, now))
            .collect();

        match self.repository.insert_batch(&self.user_id, &records).await {
            Ok(()) => {
                for def in batch {
                    info!(
                        user_id = %self.user_id,
                        achievement = %def.id,
                        points = def.points,
                        rarity = %def.rarity,
                        "achievement unlocked"
                    );
                }
                Ok(())
            }
            Err(err) => {
                warn!(
                    user_id = %self.user_id,
                    count = batch.len(),
                    error = %err,
                    "failed to persist unlocks"
                );
                Err(err)
            }
        }
    }

    /// Evaluate then persist, returning what was newly unlocked.
    pub async fn check_achievements(
        &mut self,
        context: &EvaluationContext<'_>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<AchievementDefinition>> {
        let unlocked = self.evaluate(context);
        self.persist_unlocks(&unlocked, now).await?;
        Ok(unlocked)
    }

    /// Counts, points and level for the current session state.
    pub fn progress(&self) -> AchievementProgress {
        let total_points = self.unlocked.values().sum();
        AchievementProgress {
            unlocked: self.unlocked.len(),
            total: self.catalog.len(),
            total_points,
            level: PlayerLevel::for_points(total_points),
        }
    }
}
