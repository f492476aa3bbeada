// In crates/model-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Model API error: status {status}, body: {body}")]
    ApiError { status: u16, body: String },
    #[error("Model returned no choices")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, Error>;
