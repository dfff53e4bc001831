//! Records persisted in the local database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use vitrine_shared::models::{ShopProfile, UserProfile};
use vitrine_shared::types::UserType;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in session, spread over the `authToken`, `user`, `userType`,
/// `shop` and `sessionTimestamp` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub auth_token: String,
    pub user: UserProfile,
    pub user_type: UserType,
    /// Present only for shop accounts.
    pub shop: Option<ShopProfile>,
    /// When the session was established.
    pub session_timestamp: DateTime<Utc>,
}

impl StoredSession {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.session_timestamp
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// User-editable client settings, stored as one JSON row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Overrides the configured REST base URL when set.
    pub api_base_url: Option<String>,
    /// Overrides the configured socket URL when set.
    pub socket_url: Option<String>,
    pub notifications_enabled: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            socket_url: None,
            notifications_enabled: true,
        }
    }
}
