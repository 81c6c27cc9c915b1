//! Outbound notification fanout: forwards every [`wov_events::Notification`]
//! addressed to a session's bound entity onto its jsonrpsee subscription.

use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage};
use tracing::warn;
use wov_core::SessionId;

use super::RpcImpl;
use crate::rpc::{session_not_found, OutboundNotification};

impl RpcImpl {
    pub(super) async fn subscribe_events_impl(&self, pending: PendingSubscriptionSink, session_id: SessionId) -> SubscriptionResult {
        let bound_entity = self.bound_entity(session_id).await.ok_or_else(|| jsonrpsee::core::StringError::from(session_not_found(session_id).message().to_string()))?;

        let mut receiver = self.events.subscribe();
        let sink = pending.accept().await?;
        let sessions = self.sessions.clone();

        tokio::spawn(async move {
            while let Some(notification) = receiver.recv_for(bound_entity).await {
                let view = OutboundNotification::from(notification.as_ref());
                match SubscriptionMessage::from_json(&view) {
                    Ok(msg) => {
                        if sink.send(msg).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => warn!(error = %e, "failed to serialize outbound notification"),
                }
            }
            // Subscription has ended (client dropped the WebSocket or the
            // bus closed): the session's lifetime is tied to this
            // subscription, since jsonrpsee's ordinary methods carry no
            // disconnect hook of their own.
            sessions.write().await.remove(&session_id);
        });

        Ok(())
    }
}
