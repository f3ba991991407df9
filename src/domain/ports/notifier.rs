//! Completion notifier port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CompletionNotification;

/// Hands completion results to whatever presents them.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, notification: &CompletionNotification) -> DomainResult<()>;
}
