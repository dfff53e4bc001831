use serde::Serialize;

use vitrine_shared::models::{Comment, Post};
use vitrine_shared::types::PostId;

use crate::error::Result;
use crate::http::ApiClient;

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPost {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

#[derive(Serialize)]
struct Page {
    page: u32,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    text: &'a str,
}

impl ApiClient {
    /// Social feed, 1-based pages.
    pub async fn feed(&self, page: u32) -> Result<Vec<Post>> {
        self.get_with_query("/posts/feed", &Page { page: page.max(1) })
            .await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.post("/posts", post).await
    }

    /// Toggle the signed-in user's like; returns the updated post.
    pub async fn like_post(&self, post: &PostId) -> Result<Post> {
        self.post_empty(&format!("/posts/{post}/like")).await
    }

    pub async fn comments(&self, post: &PostId) -> Result<Vec<Comment>> {
        self.get(&format!("/posts/{post}/comments")).await
    }

    pub async fn add_comment(&self, post: &PostId, text: &str) -> Result<Comment> {
        self.post(&format!("/posts/{post}/comments"), &CommentBody { text })
            .await
    }
}
