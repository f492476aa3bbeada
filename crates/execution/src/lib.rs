// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{AccountInfo, ExecutedAction, Position, TradeAction};
use market::MarketData;
use std::collections::HashMap;

pub mod paper;

// Re-export public types
pub use paper::PaperExecutor;

/// The universal interface for an execution handler.
///
/// An `Executor` takes a validated decision batch and produces one outcome
/// per actionable instruction. Failures are recorded per action rather than
/// raised: one bad fill never aborts the rest of the batch or the cycle.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of the executor (e.g., "PaperExecutor").
    fn name(&self) -> &'static str;

    /// Executes open/close actions against the given market snapshots.
    /// Hold and wait actions produce no outcome.
    async fn execute(
        &mut self,
        actions: &[TradeAction],
        market: &HashMap<String, MarketData>,
    ) -> Vec<ExecutedAction>;

    /// The current account snapshot, including unrealized PnL.
    fn account(&self) -> AccountInfo;

    /// The currently held positions, ordered by symbol.
    fn positions(&self) -> Vec<Position>;
}
