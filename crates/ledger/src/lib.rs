// In crates/ledger/src/lib.rs

pub mod analyze;
pub mod error;
pub mod insights;
pub mod record;
pub mod replay;
pub mod store;

// Re-export the most important types for easy access from other crates.
pub use analyze::{
    LOOKBACK_WINDOW_FACTOR, PerformanceAnalysis, SymbolPerformance, analyze_performance,
    analyze_recent, sharpe_ratio,
};
pub use error::{Error, Result};
pub use insights::generate_insights;
pub use record::{AccountSnapshot, CycleRecord, MarketSnapshot, PositionSnapshot};
pub use replay::{CloseReason, TradeOutcome, reconstruct_trades};
pub use store::{FileRecordStore, RecordStore, Statistics, statistics};
