use vitrine_shared::models::{FriendRequest, UserProfile};
use vitrine_shared::types::{FriendRequestId, UserId};

use crate::error::Result;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn friends(&self) -> Result<Vec<UserProfile>> {
        self.get("/friends").await
    }

    /// Incoming requests still pending.
    pub async fn friend_requests(&self) -> Result<Vec<FriendRequest>> {
        self.get("/friends/requests").await
    }

    pub async fn send_friend_request(&self, user: &UserId) -> Result<FriendRequest> {
        self.post_empty(&format!("/friends/request/{user}")).await
    }

    pub async fn accept_friend_request(&self, request: &FriendRequestId) -> Result<FriendRequest> {
        self.put_empty(&format!("/friends/accept/{request}")).await
    }
}
