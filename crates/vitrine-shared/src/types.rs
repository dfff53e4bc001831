use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Declares a string-backed identifier issued by the backend.
///
/// On the wire an id is either a bare string or a populated object carrying
/// `_id` (or `id`); both decode to the same newtype.
macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RefId::deserialize(deserializer).map(|r| Self(r.into_string()))
            }
        }
    };
}

backend_id!(
    /// A user account (shopper, shop owner or admin).
    UserId
);
backend_id!(ShopId);
backend_id!(ProductId);
backend_id!(ConversationId);
backend_id!(MessageId);
backend_id!(NotificationId);
backend_id!(OrderId);
backend_id!(PostId);
backend_id!(CommentId);
backend_id!(FriendRequestId);

/// Either a bare id string or a populated document carrying its id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefId {
    Bare(String),
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
    },
}

impl RefId {
    fn into_string(self) -> String {
        match self {
            RefId::Bare(s) => s,
            RefId::Populated { id } => id,
        }
    }
}

/// Account role, persisted as `userType`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Shop,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::User => "user",
            UserType::Shop => "shop",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserType::User),
            "shop" => Some(UserType::Shop),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
