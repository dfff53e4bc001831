//! Wire models exchanged with the backend over REST and the realtime socket.
//!
//! Field names follow the backend's camelCase JSON and its `_id` primary keys.
//! Optional collections default to empty so partially populated documents
//! still decode.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CommentId, ConversationId, FriendRequestId, MessageId, NotificationId, OrderId, PostId,
    ProductId, ShopId, UserId, UserType,
};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A shopper/shop conversation with per-participant unread counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id", alias = "id")]
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub shop: Option<ShopId>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    /// Participant id -> messages that participant has not read yet.
    #[serde(default)]
    pub unread_count: HashMap<UserId, u32>,
}

impl Conversation {
    /// Unread count for `user`, treating a missing entry as zero.
    pub fn unread_for(&self, user: &UserId) -> u32 {
        self.unread_count.get(user).copied().unwrap_or(0)
    }

    /// The first participant that is not `me`.
    pub fn counterpart(&self, me: &UserId) -> Option<&UserId> {
        self.participants.iter().find(|p| *p != me)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub sender: UserId,
    #[serde(default)]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A single chat message. Messages are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_mention: Option<ProductMention>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_shop_reply: bool,
}

impl Message {
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender == user
    }
}

/// A product referenced inline in a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductMention {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Body of `POST /chat/conversations/:id/messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_mention: Option<ProductMention>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccept,
    Message,
    Like,
    Comment,
    OrderStatus,
    OrderUpdate,
    NewOrder,
    ReturnRequest,
    ReturnUpdate,
    ShopReply,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSender {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A server-created notification. The client only ever flips `is_read`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub sender: Option<NotificationSender>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Orders (seller dashboard)
// ---------------------------------------------------------------------------

/// Payload of the `new_order` socket event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderAlert {
    pub order_id: OrderId,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default)]
    pub customer: Option<UserId>,
    #[serde(default)]
    pub total: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopDashboard {
    pub total_products: u32,
    pub total_orders: u32,
    pub pending_orders: u32,
    pub revenue: f64,
    pub unread_messages: u32,
}

// ---------------------------------------------------------------------------
// Accounts, shops and products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShopProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
}

/// Partial update for `PUT /shops/:id`; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    #[serde(default)]
    pub shop: Option<ShopId>,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Asset used by the virtual try-on view.
    #[serde(default)]
    pub try_on_model: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
}

/// Successful login / registration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub shop: Option<ShopProfile>,
}

impl AuthResponse {
    /// Role of the session: explicit `userType` first, then the profile's.
    pub fn resolved_user_type(&self) -> UserType {
        self.user_type
            .or(self.user.user_type)
            .unwrap_or(if self.shop.is_some() {
                UserType::Shop
            } else {
                UserType::User
            })
    }
}

// ---------------------------------------------------------------------------
// Social
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: PostId,
    pub author: UserId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub likes: Vec<UserId>,
    #[serde(default)]
    pub comments_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", alias = "id")]
    pub id: CommentId,
    pub author: UserId,
    #[serde(default)]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: FriendRequestId,
    pub from: UserId,
    pub to: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_missing_unread_entry_is_zero() {
        let conv: Conversation = serde_json::from_str(
            r#"{"_id":"c1","participants":["u1",{"_id":"s1","name":"Shop"}],"unreadCount":{"u1":2}}"#,
        )
        .unwrap();
        assert_eq!(conv.unread_for(&UserId::new("u1")), 2);
        assert_eq!(conv.unread_for(&UserId::new("s1")), 0);
        assert_eq!(conv.counterpart(&UserId::new("u1")), Some(&UserId::new("s1")));
    }

    #[test]
    fn message_with_populated_sender_and_mention() {
        let msg: Message = serde_json::from_str(
            r#"{
                "_id": "m1",
                "conversationId": "c1",
                "sender": {"_id": "u7", "name": "Lea"},
                "text": "is this in stock?",
                "productMention": {"productId": "p1", "name": "Denim jacket", "price": 59.9},
                "createdAt": "2026-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(msg.is_from(&UserId::new("u7")));
        assert!(!msg.is_shop_reply);
        assert_eq!(msg.product_mention.unwrap().price, Some(59.9));
    }

    #[test]
    fn unknown_notification_type_decodes() {
        let n: Notification = serde_json::from_str(
            r#"{"_id":"n1","type":"flash_sale","text":"hi","createdAt":"2026-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Unknown);
        assert!(!n.is_read);
    }

    #[test]
    fn notification_kinds_use_snake_case() {
        let n: Notification = serde_json::from_str(
            r#"{"_id":"n2","type":"return_request","isRead":true,"createdAt":"2026-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(n.kind, NotificationKind::ReturnRequest);
        assert!(n.is_read);
    }

    #[test]
    fn auth_response_user_type_fallbacks() {
        let mut resp: AuthResponse = serde_json::from_str(
            r#"{"token":"t","user":{"_id":"u1","name":"Ana"}}"#,
        )
        .unwrap();
        assert_eq!(resp.resolved_user_type(), UserType::User);

        resp.shop = Some(ShopProfile {
            id: ShopId::new("s1"),
            name: "Atelier".into(),
            owner: None,
            description: None,
            logo: None,
            is_approved: true,
        });
        assert_eq!(resp.resolved_user_type(), UserType::Shop);

        resp.user_type = Some(UserType::Admin);
        assert_eq!(resp.resolved_user_type(), UserType::Admin);
    }
}
