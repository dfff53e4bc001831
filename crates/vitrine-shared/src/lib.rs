//! # vitrine-shared
//!
//! Types shared by every Vitrine crate: backend identifiers, the REST/socket
//! wire models, the realtime event protocol and common constants.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::ProtocolError;
