// In crates/decision/src/error.rs

use crate::parser::ParseError;
use crate::types::FullDecision;
use crate::validate::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Every requested symbol failed to produce market data; the cycle has
    /// nothing to decide on. Individual fetch failures are skipped, not fatal.
    #[error("No market data could be fetched for any of the {requested} requested symbols")]
    MarketDataUnavailable { requested: usize },

    #[error("Primary model call failed: {0}")]
    PrimaryModel(#[source] model_client::Error),

    /// The primary response could not be parsed. The partial decision still
    /// carries the reasoning trace recovered before the failure point.
    #[error("Failed to parse primary model response: {source}")]
    Parse {
        partial: Box<FullDecision>,
        #[source]
        source: ParseError,
    },

    /// A decision violated a validation rule. The partial decision carries
    /// the reasoning trace and the normalized actions for diagnosis.
    #[error("Decision validation failed: {source}")]
    Validation {
        partial: Box<FullDecision>,
        #[source]
        source: ValidationError,
    },
}

impl Error {
    /// The partial decision recovered before the failure, when one exists.
    /// Callers use this to inspect the reasoning trace of a failed cycle.
    pub fn partial_decision(&self) -> Option<&FullDecision> {
        match self {
            Error::Parse { partial, .. } | Error::Validation { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
