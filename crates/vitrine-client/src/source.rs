//! The slice of the gateway the reconciler depends on.

use async_trait::async_trait;

use vitrine_net::{ApiClient, NetError};
use vitrine_shared::models::{Conversation, Notification, Order};
use vitrine_shared::types::{ConversationId, NotificationId, ShopId};

/// Remote reads and mark-read mutations behind the badge counters.
#[async_trait]
pub trait UnreadSource: Send + Sync + 'static {
    /// The signed-in user's conversations, or the shop inbox when `shop` is set.
    async fn fetch_conversations(
        &self,
        shop: Option<&ShopId>,
    ) -> Result<Vec<Conversation>, NetError>;

    async fn mark_conversation_read(&self, conversation: &ConversationId)
        -> Result<(), NetError>;

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, NetError>;

    async fn mark_notification_read(&self, notification: &NotificationId)
        -> Result<(), NetError>;

    async fn mark_all_notifications_read(&self) -> Result<(), NetError>;

    async fn fetch_pending_orders(&self, shop: &ShopId) -> Result<Vec<Order>, NetError>;
}

#[async_trait]
impl UnreadSource for ApiClient {
    async fn fetch_conversations(
        &self,
        shop: Option<&ShopId>,
    ) -> Result<Vec<Conversation>, NetError> {
        match shop {
            Some(shop) => self.shop_conversations(shop).await,
            None => self.conversations().await,
        }
    }

    async fn mark_conversation_read(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), NetError> {
        ApiClient::mark_conversation_read(self, conversation).await
    }

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, NetError> {
        self.notifications().await
    }

    async fn mark_notification_read(
        &self,
        notification: &NotificationId,
    ) -> Result<(), NetError> {
        ApiClient::mark_notification_read(self, notification).await
    }

    async fn mark_all_notifications_read(&self) -> Result<(), NetError> {
        ApiClient::mark_all_notifications_read(self).await
    }

    async fn fetch_pending_orders(&self, shop: &ShopId) -> Result<Vec<Order>, NetError> {
        self.pending_orders(shop).await
    }
}
