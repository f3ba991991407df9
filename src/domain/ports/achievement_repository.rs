//! Unlocked-achievement repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{UnlockedAchievement, UserId};

/// Storage for unlock records. Existence of a record is the unlock.
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// All unlock records for a user.
    async fn list_unlocked(&self, user_id: &UserId) -> DomainResult<Vec<UnlockedAchievement>>;

    /// Write every record in one all-or-nothing batch.
    ///
    /// Records whose id already exists are left untouched.
    async fn insert_batch(
        &self,
        user_id: &UserId,
        unlocks: &[UnlockedAchievement],
    ) -> DomainResult<()>;
}
