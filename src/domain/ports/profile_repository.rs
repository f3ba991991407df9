//! User profile repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{UserId, UserProfile};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, user_id: &UserId) -> DomainResult<Option<UserProfile>>;

    /// Create or replace the profile.
    async fn upsert(&self, profile: &UserProfile) -> DomainResult<()>;
}
