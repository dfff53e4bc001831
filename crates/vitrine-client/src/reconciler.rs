//! Keeps the badge counters in step with the backend.
//!
//! The reconciler is the only writer of the [`BadgeStore`]. It turns screen
//! actions (focus, open a conversation, mark read) and socket events into
//! fetches, live increments and optimistic commands, and re-syncs from the
//! backend after every reconnect.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use vitrine_net::{SocketHandle, SocketNotification, Subscription};
use vitrine_shared::protocol::{ClientEvent, EventKind, SocketEvent};
use vitrine_shared::types::{ConversationId, NotificationId, ShopId, UserId};

use crate::badges::{Admission, BadgeKind, BadgeStore};
use crate::error::Result;
use crate::ledger::{CommandId, FetchOutcome};
use crate::source::UnreadSource;
use crate::typing::TypingTracker;

/// Event kinds the reconciler consumes from the bridge.
pub const RECONCILER_EVENTS: &[EventKind] = &[
    EventKind::Connection,
    EventKind::Message,
    EventKind::MessagesRead,
    EventKind::Typing,
    EventKind::Notification,
    EventKind::Order,
];

/// Result of an optimistic mark-read command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The backend accepted it; the zeroed count stands.
    Committed,
    /// The backend call failed; the previous count is back.
    RolledBack,
}

pub struct Reconciler<S> {
    source: Arc<S>,
    badges: BadgeStore,
    typing: Arc<Mutex<TypingTracker>>,
    /// Set for shop sessions: selects the seller inbox and enables the
    /// pending-orders badge.
    shop: Option<ShopId>,
    socket: Option<SocketHandle>,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            badges: self.badges.clone(),
            typing: Arc::clone(&self.typing),
            shop: self.shop.clone(),
            socket: self.socket.clone(),
        }
    }
}

fn lock(typing: &Mutex<TypingTracker>) -> MutexGuard<'_, TypingTracker> {
    match typing.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<S: UnreadSource> Reconciler<S> {
    pub fn new(source: Arc<S>, badges: BadgeStore, shop: Option<ShopId>) -> Self {
        let typing = TypingTracker::new(badges.me());
        Self {
            source,
            badges,
            typing: Arc::new(Mutex::new(typing)),
            shop,
            socket: None,
        }
    }

    /// Emit join/leave events for opened conversations through `socket`.
    pub fn with_socket(mut self, socket: SocketHandle) -> Self {
        self.socket = Some(socket);
        self
    }

    pub fn with_typing_timeout(self, timeout: Duration) -> Self {
        *lock(&self.typing) = TypingTracker::with_timeout(self.badges.me(), timeout);
        self
    }

    pub fn badges(&self) -> &BadgeStore {
        &self.badges
    }

    pub fn typing_in(&self, conversation: &ConversationId) -> Vec<UserId> {
        lock(&self.typing).typing_in(conversation, Instant::now())
    }

    // -----------------------------------------------------------------------
    // Fetches
    // -----------------------------------------------------------------------

    pub async fn refresh_messages(&self) -> Result<FetchOutcome> {
        let ticket = self.badges.begin_fetch(BadgeKind::Messages);
        let conversations = self.source.fetch_conversations(self.shop.as_ref()).await?;
        let outcome = self.badges.apply_conversations(ticket, &conversations);
        debug!(
            seq = ticket.seq(),
            conversations = conversations.len(),
            outcome = ?outcome,
            "Conversations fetched"
        );
        Ok(outcome)
    }

    pub async fn refresh_notifications(&self) -> Result<FetchOutcome> {
        let ticket = self.badges.begin_fetch(BadgeKind::Notifications);
        let notifications = self.source.fetch_notifications().await?;
        let outcome = self.badges.apply_notifications(ticket, &notifications);
        debug!(
            seq = ticket.seq(),
            notifications = notifications.len(),
            outcome = ?outcome,
            "Notifications fetched"
        );
        Ok(outcome)
    }

    /// `None` for sessions without a shop.
    pub async fn refresh_orders(&self) -> Result<Option<FetchOutcome>> {
        let Some(shop) = &self.shop else {
            return Ok(None);
        };
        let ticket = self.badges.begin_fetch(BadgeKind::Orders);
        let orders = self.source.fetch_pending_orders(shop).await?;
        let outcome = self.badges.apply_pending_orders(ticket, &orders);
        debug!(seq = ticket.seq(), orders = orders.len(), outcome = ?outcome, "Pending orders fetched");
        Ok(Some(outcome))
    }

    /// Re-fetch every badge concurrently. Failures are logged and the
    /// previous counts stay on screen.
    pub async fn refresh_all(&self) {
        let (messages, notifications, orders) = futures::join!(
            self.refresh_messages(),
            self.refresh_notifications(),
            self.refresh_orders(),
        );

        if let Err(e) = messages {
            warn!(error = %e, "Failed to refresh conversations");
        }
        if let Err(e) = notifications {
            warn!(error = %e, "Failed to refresh notifications");
        }
        if let Err(e) = orders {
            warn!(error = %e, "Failed to refresh pending orders");
        }
    }

    // -----------------------------------------------------------------------
    // Socket events
    // -----------------------------------------------------------------------

    pub async fn handle_event(&self, event: &SocketEvent) {
        match event {
            SocketEvent::NewMessage { message, alias } => {
                lock(&self.typing).stop(&message.conversation_id, &message.sender);

                let admission = self.badges.on_message(message);
                trace!(message = %message.id, alias = ?alias, admission = ?admission, "New message");
                if admission == Admission::ActiveConversation {
                    self.mark_conversation_read(&message.conversation_id).await;
                }
            }

            SocketEvent::MessagesRead(read) => {
                debug!(conversation = ?read.conversation_id, "Messages read elsewhere, re-fetching");
                if let Err(e) = self.refresh_messages().await {
                    warn!(error = %e, "Failed to refresh conversations after read event");
                }
            }

            SocketEvent::UserTyping(typing) => {
                let now = Instant::now();
                let mut tracker = lock(&self.typing);
                tracker.prune(now);
                tracker.start(typing.conversation_id.clone(), typing.user_id.clone(), now);
            }

            SocketEvent::UserStoppedTyping(typing) => {
                let mut tracker = lock(&self.typing);
                tracker.prune(Instant::now());
                tracker.stop(&typing.conversation_id, &typing.user_id);
            }

            SocketEvent::NotificationNew(notification) => {
                let admission = self.badges.on_notification(notification);
                trace!(notification = %notification.id, admission = ?admission, "New notification");
            }

            SocketEvent::NewOrder(alert) => match &self.shop {
                Some(shop) if alert.shop_id.as_ref().map_or(true, |s| s == shop) => {
                    let admission = self.badges.on_order(alert);
                    info!(order = %alert.order_id, admission = ?admission, "New order");
                }
                _ => debug!(order = %alert.order_id, "Ignoring order alert for another shop"),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Screen actions
    // -----------------------------------------------------------------------

    /// A chat view came on screen: join the room and clear its count.
    pub async fn open_conversation(&self, conversation: &ConversationId) -> CommandOutcome {
        let previous = self
            .badges
            .set_active_conversation(Some(conversation.clone()));
        if let Some(previous) = previous.filter(|p| p != conversation) {
            self.emit(ClientEvent::LeaveConversation(previous)).await;
        }
        self.emit(ClientEvent::JoinConversation(conversation.clone()))
            .await;
        self.mark_conversation_read(conversation).await
    }

    pub async fn close_conversation(&self, conversation: &ConversationId) {
        if self.badges.active_conversation().as_ref() == Some(conversation) {
            self.badges.set_active_conversation(None);
        }
        self.emit(ClientEvent::LeaveConversation(conversation.clone()))
            .await;
    }

    pub async fn mark_conversation_read(&self, conversation: &ConversationId) -> CommandOutcome {
        let command = self.badges.begin_mark_conversation_read(conversation);
        let result = self.source.mark_conversation_read(conversation).await;
        self.settle(BadgeKind::Messages, command, result.map_err(Into::into))
    }

    pub async fn mark_notification_read(&self, notification: &NotificationId) -> CommandOutcome {
        let command = self.badges.begin_mark_notification_read(notification);
        let result = self.source.mark_notification_read(notification).await;
        self.settle(BadgeKind::Notifications, command, result.map_err(Into::into))
    }

    pub async fn mark_all_notifications_read(&self) -> CommandOutcome {
        let command = self.badges.begin_mark_all_notifications_read();
        let result = self.source.mark_all_notifications_read().await;
        self.settle(BadgeKind::Notifications, command, result.map_err(Into::into))
    }

    fn settle(&self, kind: BadgeKind, command: CommandId, result: Result<()>) -> CommandOutcome {
        match result {
            Ok(()) => {
                self.badges.commit(kind, command);
                debug!(%command, kind = ?kind, "Mark-read committed");
                CommandOutcome::Committed
            }
            Err(e) => {
                let restored = self.badges.rollback(kind, command);
                warn!(%command, kind = ?kind, restored = ?restored, error = %e, "Mark-read failed, rolled back");
                CommandOutcome::RolledBack
            }
        }
    }

    async fn emit(&self, event: ClientEvent) {
        let Some(socket) = &self.socket else {
            return;
        };
        if let Err(e) = socket.emit(event).await {
            warn!(error = %e, "Failed to hand event to socket task");
        }
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Consume bridge notifications until the bridge goes away.
    pub async fn run(self, mut subscription: Subscription) {
        while let Some(notification) = subscription.recv().await {
            match notification {
                SocketNotification::Connected => {
                    info!("Realtime connected, re-syncing badges");
                    if let Some(active) = self.badges.active_conversation() {
                        self.emit(ClientEvent::JoinConversation(active)).await;
                    }
                    self.refresh_all().await;
                }
                SocketNotification::Disconnected { reason } => {
                    debug!(reason = %reason, "Realtime disconnected");
                    lock(&self.typing).clear();
                }
                SocketNotification::Event(event) => self.handle_event(&event).await,
            }
        }
        debug!("Reconciler loop ended");
    }
}
