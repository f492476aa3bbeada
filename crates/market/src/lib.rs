// In crates/market/src/lib.rs

use async_trait::async_trait;
use core_types::{AccountInfo, CandidateCoin, Position};

pub mod error;
pub mod http;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use http::HttpProvider;
pub use types::{MarketData, OiTopEntry, OpenInterest, format_market_block};

/// Read access to per-symbol market snapshots and the open-interest
/// leaderboard.
///
/// Failures are per symbol; callers are expected to skip a failing symbol
/// and continue with the rest of the batch.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the current snapshot for one symbol.
    async fn market_data(&self, symbol: &str) -> Result<MarketData>;

    /// Fetches the open-interest growth leaderboard. An empty list is a
    /// valid answer; this data only enriches prompts.
    async fn oi_top(&self) -> Result<Vec<OiTopEntry>>;
}

/// Read access to account state and the candidate-coin pool.
#[async_trait]
pub trait StateProvider: Send + Sync {
    async fn account(&self) -> Result<AccountInfo>;

    async fn positions(&self) -> Result<Vec<Position>>;

    /// The ranked candidate list from the coin-pool service, best first.
    async fn candidates(&self) -> Result<Vec<CandidateCoin>>;
}
