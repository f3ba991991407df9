//! Null notifier implementation.
//!
//! Used when nothing presents completion results but the type system
//! requires a CompletionNotifier implementation.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CompletionNotification;
use super::CompletionNotifier;

/// A notifier that drops every notification.
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionNotifier for NullNotifier {
    async fn notify(&self, _notification: &CompletionNotification) -> DomainResult<()> {
        Ok(())
    }
}
