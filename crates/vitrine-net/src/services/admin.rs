use serde::Serialize;

use vitrine_shared::models::ShopProfile;
use vitrine_shared::types::ShopId;

use crate::error::Result;
use crate::http::ApiClient;

#[derive(Serialize)]
struct Rejection<'a> {
    reason: &'a str,
}

impl ApiClient {
    /// Shops awaiting moderation.
    pub async fn pending_shops(&self) -> Result<Vec<ShopProfile>> {
        self.get("/admin/shops/pending").await
    }

    pub async fn approve_shop(&self, shop: &ShopId) -> Result<ShopProfile> {
        self.put_empty(&format!("/admin/shops/{shop}/approve")).await
    }

    pub async fn reject_shop(&self, shop: &ShopId, reason: &str) -> Result<ShopProfile> {
        self.put(&format!("/admin/shops/{shop}/reject"), &Rejection { reason })
            .await
    }
}
