//! Per-project fanout of newly inserted messages.
//!
//! A broadcast channel per project bridges the message write path to any
//! number of live subscribers. Delivery is best-effort: a lagged subscriber
//! drops the oldest events, and consumers deduplicate on message id, so the
//! durable record stays the messages table.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::models::Message;

const CHANNEL_CAPACITY: usize = 100;

/// Hub of per-project broadcast channels.
#[derive(Clone, Default)]
pub struct MessageHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Message>>>>,
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a newly inserted message to the project's subscribers.
    /// A send error means every receiver has disconnected; the channel is
    /// evicted so the map doesn't accumulate dead entries.
    pub async fn publish(&self, message: Message) {
        let project_id = message.project_id.clone();
        let mut channels = self.channels.lock().await;
        if let Some(tx) = channels.get(&project_id) {
            if tx.send(message).is_err() {
                channels.remove(&project_id);
            }
        }
    }

    /// Subscribe to new messages for a project.
    pub async fn subscribe(&self, project_id: &str) -> broadcast::Receiver<Message> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drop a project's channel, disconnecting any live subscribers.
    /// Called when the project itself is deleted.
    pub async fn remove(&self, project_id: &str) {
        self.channels.lock().await.remove(project_id);
    }

    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.lock().await.len()
    }
}
