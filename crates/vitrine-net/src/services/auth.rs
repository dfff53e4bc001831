use serde::Serialize;

use vitrine_shared::models::{AuthResponse, UserProfile};

use crate::error::Result;
use crate::http::ApiClient;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub shop_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiClient {
    /// Authenticate. The caller is responsible for storing the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        self.post("/auth/login", &Credentials { email, password })
            .await
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        self.post("/auth/register", registration).await
    }

    /// Register a seller account; shops start unapproved until an admin acts.
    pub async fn register_shop(&self, registration: &ShopRegistration) -> Result<AuthResponse> {
        self.post("/auth/shop/register", registration).await
    }

    pub async fn current_user(&self) -> Result<UserProfile> {
        self.get("/auth/me").await
    }
}
