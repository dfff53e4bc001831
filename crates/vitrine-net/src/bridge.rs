//! Realtime event bridge: a listener registry in front of the socket task.
//!
//! Views attach a listener for the event kinds they care about when they
//! mount and detach it when they unmount. Detaching is tied to dropping the
//! [`Subscription`], so a listener can never outlive its owner.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use vitrine_shared::protocol::EventKind;

use crate::socket::SocketNotification;

struct Listener {
    id: u64,
    kinds: HashSet<EventKind>,
    tx: mpsc::UnboundedSender<SocketNotification>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Shared listener registry. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct EventBridge {
    registry: Arc<Mutex<Registry>>,
}

/// A live listener. Dropping it detaches the listener from the bridge.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<SocketNotification>,
    registry: Weak<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn kind_of(notification: &SocketNotification) -> EventKind {
    match notification {
        SocketNotification::Connected | SocketNotification::Disconnected { .. } => {
            EventKind::Connection
        }
        SocketNotification::Event(event) => event.kind(),
    }
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for `kinds`.
    pub fn subscribe(&self, kinds: &[EventKind]) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.registry);

        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Listener {
            id,
            kinds: kinds.iter().copied().collect(),
            tx,
        });

        debug!(listener = id, kinds = ?kinds, "Listener attached");

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `notification` to every interested listener.
    ///
    /// Returns the number of listeners it reached. Listeners whose
    /// subscription is gone are pruned.
    pub fn dispatch(&self, notification: &SocketNotification) -> usize {
        let kind = kind_of(notification);
        let mut registry = lock(&self.registry);

        let mut delivered = 0;
        registry.listeners.retain(|listener| {
            if !listener.kinds.contains(&kind) {
                return !listener.tx.is_closed();
            }
            match listener.tx.send(notification.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        trace!(kind = ?kind, delivered, "Notification dispatched");
        delivered
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

impl Subscription {
    /// Next notification, or `None` once the bridge is gone.
    pub async fn recv(&mut self) -> Option<SocketNotification> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SocketNotification> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|l| l.id != self.id);
            debug!(listener = self.id, "Listener detached");
        }
    }
}

/// Forward every socket notification into the bridge until the socket
/// task's channel closes.
pub async fn pump(bridge: EventBridge, mut notif_rx: mpsc::Receiver<SocketNotification>) {
    while let Some(notification) = notif_rx.recv().await {
        bridge.dispatch(&notification);
    }
    debug!("Socket notification pump ended");
}

#[cfg(test)]
mod tests {
    use vitrine_shared::protocol::{SocketEvent, TypingPayload};
    use vitrine_shared::types::{ConversationId, UserId};

    use super::*;

    fn typing() -> SocketNotification {
        SocketNotification::Event(SocketEvent::UserTyping(TypingPayload {
            conversation_id: ConversationId::new("c1"),
            user_id: UserId::new("u2"),
        }))
    }

    #[test]
    fn dispatch_respects_kinds() {
        let bridge = EventBridge::new();
        let mut typing_sub = bridge.subscribe(&[EventKind::Typing]);
        let mut conn_sub = bridge.subscribe(&[EventKind::Connection]);

        assert_eq!(bridge.dispatch(&typing()), 1);
        assert_eq!(bridge.dispatch(&SocketNotification::Connected), 1);

        assert_eq!(typing_sub.try_recv(), Some(typing()));
        assert_eq!(typing_sub.try_recv(), None);
        assert_eq!(conn_sub.try_recv(), Some(SocketNotification::Connected));
    }

    #[test]
    fn dropping_subscription_detaches() {
        let bridge = EventBridge::new();
        let sub = bridge.subscribe(&[EventKind::Typing]);
        let _other = bridge.subscribe(&[EventKind::Message]);
        assert_eq!(bridge.listener_count(), 2);

        drop(sub);
        assert_eq!(bridge.listener_count(), 1);
        assert_eq!(bridge.dispatch(&typing()), 0);
    }

    #[test]
    fn subscription_outliving_bridge_is_harmless() {
        let bridge = EventBridge::new();
        let mut sub = bridge.subscribe(&[EventKind::Typing]);
        drop(bridge);
        assert_eq!(sub.try_recv(), None);
        drop(sub);
    }

    #[tokio::test]
    async fn pump_forwards_until_channel_closes() {
        let bridge = EventBridge::new();
        let mut sub = bridge.subscribe(&[EventKind::Typing, EventKind::Connection]);
        let (tx, rx) = mpsc::channel(8);

        let pumping = tokio::spawn(pump(bridge.clone(), rx));
        tx.send(SocketNotification::Connected).await.unwrap();
        tx.send(typing()).await.unwrap();
        drop(tx);
        pumping.await.unwrap();

        assert_eq!(sub.recv().await, Some(SocketNotification::Connected));
        assert_eq!(sub.recv().await, Some(typing()));
    }
}
