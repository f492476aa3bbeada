// In crates/market/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Market data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
