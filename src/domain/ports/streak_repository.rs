//! Streak repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{StreakRecord, UserId};

use super::Versioned;

/// Versioned storage for the single per-user streak document.
#[async_trait]
pub trait StreakRepository: Send + Sync {
    /// Read the streak document and its version.
    async fn load(&self, user_id: &UserId) -> DomainResult<Option<Versioned<StreakRecord>>>;

    /// Write the document if its version is still `expected_version`.
    ///
    /// `None` means the document must not exist yet. Returns the new version,
    /// or `ConcurrencyConflict` when another writer got there first.
    async fn store(
        &self,
        user_id: &UserId,
        record: &StreakRecord,
        expected_version: Option<u64>,
    ) -> DomainResult<u64>;
}
