//! Broadcast-backed completion notifier.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::CompletionNotification;
use crate::domain::ports::CompletionNotifier;

const DEFAULT_CAPACITY: usize = 64;

/// Fans completion notifications out to every live subscriber.
///
/// Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<CompletionNotification>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CompletionNotification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl CompletionNotifier for BroadcastNotifier {
    async fn notify(&self, notification: &CompletionNotification) -> DomainResult<()> {
        let delivered = self.sender.send(notification.clone()).unwrap_or(0);
        debug!(
            user_id = %notification.user_id,
            unlocked = notification.unlocked_list.len(),
            delivered,
            "completion notification published"
        );
        Ok(())
    }
}
