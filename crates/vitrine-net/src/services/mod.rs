//! Per-domain wrappers around [`ApiClient`](crate::ApiClient).
//!
//! Each module adds an `impl ApiClient` block for one backend domain. The
//! wrappers only shape requests and responses; they hold no state.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod friend;
pub mod notification;
pub mod post;
pub mod shop;
