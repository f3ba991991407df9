//! Stats repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{StatsRecord, UserId};

use super::Versioned;

/// Versioned storage for the per-user denormalized counters.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Read the counters document and its version.
    async fn load(&self, user_id: &UserId) -> DomainResult<Option<Versioned<StatsRecord>>>;

    /// Compare-and-swap write; see [`super::StreakRepository::store`].
    async fn store(
        &self,
        user_id: &UserId,
        record: &StatsRecord,
        expected_version: Option<u64>,
    ) -> DomainResult<u64>;
}
