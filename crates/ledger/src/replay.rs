// In crates/ledger/src/replay.rs
//
// Replays an ordered (oldest-first) sequence of cycle records and rebuilds
// realized trades by matching open outcomes to close outcomes per symbol.
// The replay holds no state across invocations; each call owns its own
// transient open-position map, so concurrent replays need no coordination.

use crate::record::{CycleRecord, MarketSnapshot};
use chrono::{DateTime, Duration, Utc};
use core_types::{Action, ExecutedAction, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Slippage tolerance band used to classify a close as a TP or SL hit.
pub const SL_TP_TOLERANCE: f64 = 0.001;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "SL")]
    StopLoss,
    Strategy,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CloseReason::TakeProfit => "TP",
            CloseReason::StopLoss => "SL",
            CloseReason::Strategy => "Strategy",
        };
        f.write_str(label)
    }
}

/// A fully matched open-to-close trade with computed results. Immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub leverage: u32,
    pub open_price: f64,
    pub close_price: f64,
    /// quantity x open price.
    pub position_value: f64,
    /// position value / leverage; 0 when leverage is unknown.
    pub margin_used: f64,
    pub pnl: f64,
    /// PnL as a percentage of the margin used.
    pub pnl_pct: f64,
    pub duration: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub close_reason: CloseReason,
    pub entry_vwap: f64,
    pub entry_rsi: f64,
    pub entry_macd: f64,
}

/// Transient per-symbol open state, consumed when a matching close arrives.
struct OpenPositionState {
    open_time: DateTime<Utc>,
    open_price: f64,
    quantity: f64,
    leverage: u32,
    side: Side,
    stop_loss: f64,
    take_profit: f64,
    entry: MarketSnapshot,
}

/// Minimal view of the recorded decision JSON, used to recover the
/// stop-loss/take-profit the AI intended for an executed action.
#[derive(Debug, Deserialize)]
struct IntendedAction {
    symbol: String,
    action: Action,
    #[serde(default)]
    stop_loss: f64,
    #[serde(default)]
    take_profit: f64,
}

/// Replays records oldest to newest and returns matched trades in
/// chronological close order.
///
/// At most one open position is tracked per symbol; a close whose side does
/// not match the tracked open is ignored, and opens left unmatched at the
/// end of the window are dropped.
pub fn reconstruct_trades(records: &[CycleRecord]) -> Vec<TradeOutcome> {
    let mut open_positions: HashMap<String, OpenPositionState> = HashMap::new();
    let mut outcomes = Vec::new();

    for record in records {
        let intended = parse_intended(&record.decision_json);

        for action in &record.executed {
            if !action.success {
                continue;
            }
            let Some(side) = action.action.side() else {
                continue;
            };

            if action.action.is_open() {
                let (stop_loss, take_profit) = intended
                    .get(&(action.symbol.clone(), side))
                    .copied()
                    .unwrap_or((0.0, 0.0));

                open_positions.insert(
                    action.symbol.clone(),
                    OpenPositionState {
                        open_time: action.timestamp,
                        open_price: action.price,
                        quantity: action.quantity,
                        leverage: action.leverage,
                        side,
                        stop_loss,
                        take_profit,
                        entry: record
                            .market_data
                            .get(&action.symbol)
                            .cloned()
                            .unwrap_or_default(),
                    },
                );
            } else if action.action.is_close() {
                if let Entry::Occupied(entry) = open_positions.entry(action.symbol.clone()) {
                    // A side mismatch is not a closing event for the tracked
                    // direction; leave the open state alone.
                    if entry.get().side == side {
                        outcomes.push(build_outcome(entry.remove(), action));
                    }
                }
            }
        }
    }

    outcomes
}

fn parse_intended(decision_json: &str) -> HashMap<(String, Side), (f64, f64)> {
    let intended: Vec<IntendedAction> =
        serde_json::from_str(decision_json).unwrap_or_default();

    intended
        .into_iter()
        .filter_map(|d| {
            let side = d.action.side()?;
            Some(((d.symbol, side), (d.stop_loss, d.take_profit)))
        })
        .collect()
}

fn build_outcome(open: OpenPositionState, close: &ExecutedAction) -> TradeOutcome {
    let pnl = match open.side {
        Side::Long => open.quantity * (close.price - open.open_price),
        Side::Short => open.quantity * (open.open_price - close.price),
    };

    let position_value = open.quantity * open.open_price;
    let margin_used = if open.leverage > 0 {
        position_value / f64::from(open.leverage)
    } else {
        0.0
    };
    let pnl_pct = if margin_used > 0.0 {
        pnl / margin_used * 100.0
    } else {
        0.0
    };

    TradeOutcome {
        symbol: close.symbol.clone(),
        side: open.side,
        quantity: open.quantity,
        leverage: open.leverage,
        open_price: open.open_price,
        close_price: close.price,
        position_value,
        margin_used,
        pnl,
        pnl_pct,
        duration: format_duration(close.timestamp - open.open_time),
        open_time: open.open_time,
        close_time: close.timestamp,
        close_reason: classify_close(open.side, close.price, open.stop_loss, open.take_profit),
        entry_vwap: open.entry.current_vwap,
        entry_rsi: open.entry.current_rsi7,
        entry_macd: open.entry.current_macd,
    }
}

/// Classifies a close against the recorded stop/target, allowing 0.1%
/// slippage in the direction of each level.
pub fn classify_close(side: Side, close_price: f64, stop_loss: f64, take_profit: f64) -> CloseReason {
    match side {
        Side::Long => {
            if take_profit > 0.0 && close_price >= take_profit * (1.0 - SL_TP_TOLERANCE) {
                CloseReason::TakeProfit
            } else if stop_loss > 0.0 && close_price <= stop_loss * (1.0 + SL_TP_TOLERANCE) {
                CloseReason::StopLoss
            } else {
                CloseReason::Strategy
            }
        }
        Side::Short => {
            if take_profit > 0.0 && close_price <= take_profit * (1.0 + SL_TP_TOLERANCE) {
                CloseReason::TakeProfit
            } else if stop_loss > 0.0 && close_price >= stop_loss * (1.0 - SL_TP_TOLERANCE) {
                CloseReason::StopLoss
            } else {
                CloseReason::Strategy
            }
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
