use serde::Serialize;

use vitrine_shared::models::{Conversation, Message, NewMessage};
use vitrine_shared::types::{ConversationId, ShopId};

use crate::error::Result;
use crate::http::ApiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartConversation<'a> {
    shop_id: &'a ShopId,
}

impl ApiClient {
    /// Conversations of the signed-in user, with server-side unread counts.
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        self.get("/chat/conversations").await
    }

    /// Conversations addressed to a shop (seller inbox).
    pub async fn shop_conversations(&self, shop: &ShopId) -> Result<Vec<Conversation>> {
        self.get(&format!("/chat/shop/{shop}")).await
    }

    /// Open (or fetch the existing) conversation with a shop.
    pub async fn start_conversation(&self, shop: &ShopId) -> Result<Conversation> {
        self.post("/chat/conversations", &StartConversation { shop_id: shop })
            .await
    }

    pub async fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        self.get(&format!("/chat/conversations/{conversation}/messages"))
            .await
    }

    pub async fn send_message(
        &self,
        conversation: &ConversationId,
        message: &NewMessage,
    ) -> Result<Message> {
        self.post(
            &format!("/chat/conversations/{conversation}/messages"),
            message,
        )
        .await
    }

    /// Reset the signed-in user's unread count for a conversation.
    pub async fn mark_conversation_read(&self, conversation: &ConversationId) -> Result<()> {
        self.put_discard(&format!("/chat/conversations/{conversation}/read"))
            .await
    }
}
