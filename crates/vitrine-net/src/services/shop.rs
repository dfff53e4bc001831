use serde::Serialize;

use vitrine_shared::models::{Order, Product, ShopDashboard, ShopProfile, ShopUpdate};
use vitrine_shared::types::{ProductId, ShopId};

use crate::error::Result;
use crate::http::ApiClient;

/// Product browsing filters; unset fields are omitted from the query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Serialize)]
struct StatusFilter {
    status: &'static str,
}

impl ApiClient {
    pub async fn get_shop(&self, shop: &ShopId) -> Result<ShopProfile> {
        self.get(&format!("/shops/{shop}")).await
    }

    pub async fn shop_products(&self, shop: &ShopId) -> Result<Vec<Product>> {
        self.get(&format!("/shops/{shop}/products")).await
    }

    pub async fn update_shop(&self, shop: &ShopId, update: &ShopUpdate) -> Result<ShopProfile> {
        self.put(&format!("/shops/{shop}"), update).await
    }

    pub async fn shop_dashboard(&self, shop: &ShopId) -> Result<ShopDashboard> {
        self.get(&format!("/shops/{shop}/dashboard")).await
    }

    /// Orders the seller has not processed yet; drives the dashboard badge.
    pub async fn pending_orders(&self, shop: &ShopId) -> Result<Vec<Order>> {
        self.get_with_query(
            &format!("/shops/{shop}/orders"),
            &StatusFilter { status: "pending" },
        )
        .await
    }

    pub async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.get_with_query("/products", query).await
    }

    pub async fn get_product(&self, product: &ProductId) -> Result<Product> {
        self.get(&format!("/products/{product}")).await
    }
}
