//! The single owner of every badge counter.
//!
//! [`BadgeStore`] keeps one [`CounterLedger`] per badge behind a single lock
//! and publishes a [`BadgeSnapshot`] on a watch channel whenever a total
//! changes. Views read the snapshot; only the reconciler mutates the store.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use vitrine_shared::models::{Conversation, Message, Notification, Order, OrderAlert};
use vitrine_shared::types::{ConversationId, NotificationId, OrderId, UserId};

use crate::ledger::{CommandId, CounterLedger, FetchOutcome, FetchTicket, LedgerMode, Scope};
use crate::unread::unread_by_conversation;

/// Source of "now" for fetch tickets, event admission and commands.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKind {
    Messages,
    Notifications,
    Orders,
}

/// Totals shown on the badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BadgeSnapshot {
    pub messages: u32,
    pub notifications: u32,
    pub orders: u32,
}

/// What happened to a live event offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Counted,
    /// Sent by the signed-in user.
    OwnMessage,
    /// Arrived in the conversation currently on screen.
    ActiveConversation,
    /// The notification was already read when it arrived.
    AlreadyRead,
    /// Seen before, or covered by the last fetch.
    Duplicate,
}

struct BadgeState {
    me: UserId,
    active_conversation: Option<ConversationId>,
    messages: CounterLedger<ConversationId>,
    notifications: CounterLedger<NotificationId>,
    orders: CounterLedger<OrderId>,
}

impl BadgeState {
    fn new(me: UserId) -> Self {
        Self {
            me,
            active_conversation: None,
            messages: CounterLedger::new(LedgerMode::Tally),
            notifications: CounterLedger::new(LedgerMode::Flag),
            orders: CounterLedger::new(LedgerMode::Flag),
        }
    }

    fn snapshot(&self) -> BadgeSnapshot {
        BadgeSnapshot {
            messages: self.messages.total(),
            notifications: self.notifications.total(),
            orders: self.orders.total(),
        }
    }
}

#[derive(Clone)]
pub struct BadgeStore {
    state: Arc<Mutex<BadgeState>>,
    tx: Arc<watch::Sender<BadgeSnapshot>>,
    clock: Clock,
}

fn lock(state: &Mutex<BadgeState>) -> MutexGuard<'_, BadgeState> {
    match state.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn admitted(counted: bool) -> Admission {
    if counted {
        Admission::Counted
    } else {
        Admission::Duplicate
    }
}

impl BadgeStore {
    pub fn new(me: UserId) -> Self {
        Self::with_clock(me, Arc::new(Utc::now))
    }

    pub fn with_clock(me: UserId, clock: Clock) -> Self {
        let (tx, _rx) = watch::channel(BadgeSnapshot::default());
        Self {
            state: Arc::new(Mutex::new(BadgeState::new(me))),
            tx: Arc::new(tx),
            clock,
        }
    }

    /// Run `f` on the state and publish the new totals if they changed.
    fn update<R>(&self, f: impl FnOnce(&mut BadgeState, DateTime<Utc>) -> R) -> R {
        let now = (self.clock)();
        let mut state = lock(&self.state);
        let result = f(&mut state, now);

        let snapshot = state.snapshot();
        let changed = self.tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        if changed {
            debug!(
                messages = snapshot.messages,
                notifications = snapshot.notifications,
                orders = snapshot.orders,
                "Badge totals changed"
            );
        }
        result
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn subscribe(&self) -> watch::Receiver<BadgeSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> BadgeSnapshot {
        *self.tx.borrow()
    }

    pub fn me(&self) -> UserId {
        lock(&self.state).me.clone()
    }

    pub fn conversation_unread(&self, conversation: &ConversationId) -> u32 {
        lock(&self.state).messages.count(conversation)
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        lock(&self.state).active_conversation.clone()
    }

    // -----------------------------------------------------------------------
    // Fetches
    // -----------------------------------------------------------------------

    pub fn begin_fetch(&self, kind: BadgeKind) -> FetchTicket {
        let now = (self.clock)();
        let mut state = lock(&self.state);
        match kind {
            BadgeKind::Messages => state.messages.begin_fetch(now),
            BadgeKind::Notifications => state.notifications.begin_fetch(now),
            BadgeKind::Orders => state.orders.begin_fetch(now),
        }
    }

    pub fn apply_conversations(
        &self,
        ticket: FetchTicket,
        conversations: &[Conversation],
    ) -> FetchOutcome {
        self.update(|state, _| {
            let me = state.me.clone();
            state
                .messages
                .apply_fetch(ticket, unread_by_conversation(conversations, &me))
        })
    }

    pub fn apply_notifications(
        &self,
        ticket: FetchTicket,
        notifications: &[Notification],
    ) -> FetchOutcome {
        self.update(|state, _| {
            state.notifications.apply_fetch(
                ticket,
                notifications
                    .iter()
                    .map(|n| (n.id.clone(), u32::from(!n.is_read))),
            )
        })
    }

    /// Every order in the list is pending and counts once.
    pub fn apply_pending_orders(&self, ticket: FetchTicket, orders: &[Order]) -> FetchOutcome {
        self.update(|state, _| {
            state
                .orders
                .apply_fetch(ticket, orders.iter().map(|o| (o.id.clone(), 1)))
        })
    }

    // -----------------------------------------------------------------------
    // Live events
    // -----------------------------------------------------------------------

    pub fn on_message(&self, message: &Message) -> Admission {
        self.update(|state, now| {
            if message.is_from(&state.me) {
                return Admission::OwnMessage;
            }
            if state.active_conversation.as_ref() == Some(&message.conversation_id) {
                return Admission::ActiveConversation;
            }
            let counted = state.messages.record_event(
                message.conversation_id.clone(),
                message.id.as_str(),
                now,
            );
            trace!(message = %message.id, counted, "Message event offered");
            admitted(counted)
        })
    }

    pub fn on_notification(&self, notification: &Notification) -> Admission {
        if notification.is_read {
            return Admission::AlreadyRead;
        }
        self.update(|state, now| {
            admitted(state.notifications.record_event(
                notification.id.clone(),
                notification.id.as_str(),
                now,
            ))
        })
    }

    pub fn on_order(&self, alert: &OrderAlert) -> Admission {
        self.update(|state, now| {
            admitted(
                state
                    .orders
                    .record_event(alert.order_id.clone(), alert.order_id.as_str(), now),
            )
        })
    }

    /// Set the conversation on screen. Returns the previous one.
    pub fn set_active_conversation(
        &self,
        conversation: Option<ConversationId>,
    ) -> Option<ConversationId> {
        let mut state = lock(&self.state);
        std::mem::replace(&mut state.active_conversation, conversation)
    }

    // -----------------------------------------------------------------------
    // Optimistic commands
    // -----------------------------------------------------------------------

    pub fn begin_mark_conversation_read(&self, conversation: &ConversationId) -> CommandId {
        self.update(|state, now| {
            state
                .messages
                .begin_command(Scope::Key(conversation.clone()), now)
        })
    }

    pub fn begin_mark_notification_read(&self, notification: &NotificationId) -> CommandId {
        self.update(|state, now| {
            state
                .notifications
                .begin_command(Scope::Key(notification.clone()), now)
        })
    }

    pub fn begin_mark_all_notifications_read(&self) -> CommandId {
        self.update(|state, now| state.notifications.begin_command(Scope::All, now))
    }

    /// Confirm a command. Returns its pre-image if it was still pending.
    pub fn commit(&self, kind: BadgeKind, command: CommandId) -> Option<u32> {
        self.update(|state, _| match kind {
            BadgeKind::Messages => state.messages.commit(command),
            BadgeKind::Notifications => state.notifications.commit(command),
            BadgeKind::Orders => state.orders.commit(command),
        })
    }

    /// Undo a command. Returns its pre-image if it was still pending.
    pub fn rollback(&self, kind: BadgeKind, command: CommandId) -> Option<u32> {
        self.update(|state, _| match kind {
            BadgeKind::Messages => state.messages.rollback(command),
            BadgeKind::Notifications => state.notifications.rollback(command),
            BadgeKind::Orders => state.orders.rollback(command),
        })
    }

    /// Drop every counter and switch to another account.
    pub fn reset(&self, me: UserId) {
        self.update(|state, _| {
            state.me = me;
            state.active_conversation = None;
            state.messages.reset();
            state.notifications.reset();
            state.orders.reset();
        })
    }
}
