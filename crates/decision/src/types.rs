// In crates/decision/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{AccountInfo, CandidateCoin, Position, TradeAction};
use market::{MarketData, OiTopEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The complete outcome of one decision cycle: the prompt that was sent, the
/// model's reasoning trace, the surviving decisions, and the cross-validation
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullDecision {
    /// The user prompt sent to the primary model, retained for the cycle log.
    pub user_prompt: String,
    /// Free-text reasoning emitted before the JSON decision array.
    pub reasoning: String,
    pub decisions: Vec<TradeAction>,
    /// One line per open-action cross-validation verdict.
    pub validation_trace: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Everything the orchestrator needs to build prompts for one cycle.
///
/// `market_data` and `oi_top` start empty and are populated by the
/// market-data fetch step.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub current_time: String,
    pub runtime_minutes: i64,
    pub cycle_number: u64,
    pub account: AccountInfo,
    pub positions: Vec<Position>,
    pub candidates: Vec<CandidateCoin>,
    pub market_data: HashMap<String, MarketData>,
    pub oi_top: HashMap<String, OiTopEntry>,
    /// Sharpe-style score from the performance analyzer, when history exists.
    pub sharpe_ratio: Option<f64>,
    /// Review-notes narrative from the insights generator.
    pub insights: String,
}
