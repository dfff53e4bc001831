/// Application name
pub const APP_NAME: &str = "Vitrine";

/// Default REST API base URL (local development backend)
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Default realtime socket URL
pub const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:5000/socket";

/// Sessions older than this are discarded on restore (7 days)
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Typing indicators expire after this long without a refresh
pub const DEFAULT_TYPING_TIMEOUT_SECS: u64 = 5;

/// Socket reconnect backoff bounds
pub const DEFAULT_RECONNECT_INITIAL_SECS: u64 = 1;
pub const DEFAULT_RECONNECT_MAX_SECS: u64 = 30;

/// On-device storage keys for session bookkeeping
pub const KEY_AUTH_TOKEN: &str = "authToken";
pub const KEY_USER: &str = "user";
pub const KEY_USER_TYPE: &str = "userType";
pub const KEY_SHOP: &str = "shop";
pub const KEY_SESSION_TIMESTAMP: &str = "sessionTimestamp";

/// Every key written by a login; cleared together on logout.
pub const SESSION_KEYS: [&str; 5] = [
    KEY_AUTH_TOKEN,
    KEY_USER,
    KEY_USER_TYPE,
    KEY_SHOP,
    KEY_SESSION_TIMESTAMP,
];

/// Inbound socket event names
pub const EVENT_NEW_MESSAGE: &str = "new_message";
pub const EVENT_MESSAGE_NEW: &str = "message:new";
pub const EVENT_MESSAGES_READ: &str = "messages_read";
pub const EVENT_USER_TYPING: &str = "user_typing";
pub const EVENT_USER_STOPPED_TYPING: &str = "user_stopped_typing";
pub const EVENT_NOTIFICATION_NEW: &str = "notification:new";
pub const EVENT_NEW_ORDER: &str = "new_order";

/// Outbound socket event names
pub const EVENT_JOIN_CONVERSATION: &str = "join_conversation";
pub const EVENT_LEAVE_CONVERSATION: &str = "leave_conversation";
pub const EVENT_TYPING: &str = "typing";
pub const EVENT_STOP_TYPING: &str = "stop_typing";
