use thiserror::Error;

use vitrine_net::NetError;
use vitrine_store::StoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("No stored session")]
    NoSession,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
