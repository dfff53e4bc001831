//! # vitrine-store
//!
//! On-device persistence for the Vitrine client, backed by SQLite.
//!
//! The store only holds session bookkeeping (`authToken`, `user`, `userType`,
//! `shop`, `sessionTimestamp`) as key/value entries plus the client settings
//! row. Badge counters are deliberately not persisted: they are rebuilt from
//! the backend on every launch.

pub mod database;
pub mod entries;
pub mod migrations;
pub mod models;
pub mod session;
pub mod settings;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
