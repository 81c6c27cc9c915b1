//! In-process notification bus.
//!
//! A verb's `send(type, payload)` reaches every session bound to the
//! entity it ran as. Rather than
//! maintaining a per-entity subscriber map, every gateway connection
//! subscribes to the same broadcast channel and filters on `target`; at
//! the connection counts this system targets, a filtered broadcast is far
//! simpler than per-entity channel bookkeeping and costs nothing a single
//! `==` comparison per event can't absorb.

#![deny(unsafe_code)]

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;
use wov_core::EntityId;

/// Default broadcast channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A notification emitted by a verb's `send` opcode, addressed to every
/// session bound to `target`.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The entity whose sessions should receive this notification. `sudo`'s
    /// `forward` rewrite addresses the *original caller* instead of the
    /// impersonated target.
    pub target: EntityId,
    /// The outbound JSON-RPC notification method name, e.g. `"message"`,
    /// `"update"`, `"forward"`.
    pub method: String,
    /// The notification params.
    pub params: serde_json::Value,
}

/// The event bus: one instance shared by the whole server.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<Notification>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification. Returns the number of live subscribers at
    /// publish time (not the number that matched `target` — filtering
    /// happens receiver-side).
    pub fn publish(&self, notification: Notification) -> usize {
        let notification = Arc::new(notification);
        self.sender.send(notification).unwrap_or(0)
    }

    /// Subscribe to the full, unfiltered notification stream.
    #[must_use]
    pub fn subscribe(&self) -> NotificationReceiver {
        NotificationReceiver { receiver: self.sender.subscribe() }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

/// A subscriber's view of the notification stream.
pub struct NotificationReceiver {
    receiver: broadcast::Receiver<Arc<Notification>>,
}

impl NotificationReceiver {
    /// Receive the next notification addressed to `bound_entity`, skipping
    /// (and logging) any the receiver lagged past.
    pub async fn recv_for(&mut self, bound_entity: EntityId) -> Option<Arc<Notification>> {
        loop {
            match self.receiver.recv().await {
                Ok(n) if n.target == bound_entity => return Some(n),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "notification receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
