// In crates/decision/src/lib.rs

pub mod engine;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod types;
pub mod validate;

// Re-export the most important types for easy access from other crates.
pub use engine::{AFFIRMATIVE_TOKEN, DISSENT_TOKEN, fetch_market_data, get_full_decision};
pub use error::{Error, Result};
pub use parser::ParseError;
pub use types::{DecisionContext, FullDecision};
pub use validate::{MAJOR_SYMBOLS, RiskLimits, ValidationError, normalize_actions, validate_actions};
