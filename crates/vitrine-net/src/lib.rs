// Remote data gateway (REST over reqwest) and realtime event bridge
// (JSON frames over tokio-tungstenite).

pub mod bridge;
pub mod error;
pub mod http;
pub mod services;
pub mod socket;

pub use bridge::{pump, EventBridge, Subscription};
pub use error::NetError;
pub use http::ApiClient;
pub use services::auth::{Registration, ShopRegistration};
pub use services::post::NewPost;
pub use services::shop::ProductQuery;
pub use socket::{spawn_socket, SocketConfig, SocketHandle, SocketNotification};
