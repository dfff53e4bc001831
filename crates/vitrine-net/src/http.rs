//! Shared HTTP client used by every per-domain service wrapper.
//!
//! [`ApiClient`] is a thin pass-through: it attaches the bearer token, sends
//! the request and decodes the JSON body. There is no retry, caching or
//! batching; callers decide what to do with a failure.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NetError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Cheaply cloneable handle; clones share the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    token: Arc<RwLock<Option<String>>>,
}

/// Error bodies look like `{"message": "..."}` or `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NetError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set (or clear) the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = match self.token.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ------------------------------------------------------------------
    // Verb helpers
    // ------------------------------------------------------------------

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(self.request(Method::GET, path)).await
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.fetch_json(self.request(Method::GET, path).query(query))
            .await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch_json(self.request(Method::POST, path).json(body))
            .await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(self.request(Method::POST, path)).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch_json(self.request(Method::PUT, path).json(body))
            .await
    }

    pub(crate) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(self.request(Method::PUT, path)).await
    }

    /// PUT without a body whose response body is irrelevant.
    pub(crate) async fn put_discard(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::PUT, path)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "api request");

        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.execute(builder).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, &body);
        warn!(%url, status = status.as_u16(), error = %err, "api request failed");
        Err(err)
    }
}

fn status_error(status: StatusCode, body: &str) -> NetError {
    if status == StatusCode::UNAUTHORIZED {
        return NetError::Unauthorized;
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    NetError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            ApiClient::new("ftp://example.com"),
            Err(NetError::InvalidUrl(_))
        ));
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let client = ApiClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.url("/chat/conversations"), "http://localhost:5000/api/chat/conversations");
        assert_eq!(client.url("posts/feed"), "http://localhost:5000/api/posts/feed");
    }

    #[test]
    fn clones_share_token() {
        let client = ApiClient::new("http://localhost").unwrap();
        let clone = client.clone();
        client.set_token(Some("abc".into()));
        assert_eq!(clone.token().as_deref(), Some("abc"));
        clone.set_token(None);
        assert_eq!(client.token(), None);
    }

    #[test]
    fn status_error_prefers_body_message() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"message":"Shop not found"}"#);
        assert!(matches!(err, NetError::Status { status: 404, ref message } if message == "Shop not found"));

        let err = status_error(StatusCode::BAD_REQUEST, r#"{"error":"bad id"}"#);
        assert!(matches!(err, NetError::Status { ref message, .. } if message == "bad id"));

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>");
        assert!(matches!(err, NetError::Status { ref message, .. } if message == "Internal Server Error"));
    }

    #[test]
    fn unauthorized_is_distinct() {
        assert!(matches!(status_error(StatusCode::UNAUTHORIZED, ""), NetError::Unauthorized));
    }
}
