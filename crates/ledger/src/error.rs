// In crates/ledger/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
