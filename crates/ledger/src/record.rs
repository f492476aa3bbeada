// In crates/ledger/src/record.rs

use chrono::{DateTime, Utc};
use core_types::{ExecutedAction, Side};
use market::MarketData;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The per-symbol market state captured at decision time, kept small enough
/// to store with every cycle. Doubles as the "entry indicators" snapshot
/// when a trade is later reconstructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub current_vwap: f64,
    pub current_rsi7: f64,
    pub current_macd: f64,
}

impl From<&MarketData> for MarketSnapshot {
    fn from(data: &MarketData) -> Self {
        Self {
            current_price: data.current_price,
            current_vwap: data.current_vwap,
            current_rsi7: data.current_rsi7,
            current_macd: data.current_macd,
        }
    }
}

/// Account state at the end of a cycle. `total_equity` feeds the equity
/// curve behind the Sharpe-style score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_equity: f64,
    pub available_balance: f64,
    pub total_pnl: f64,
    pub margin_used_pct: f64,
    pub position_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub mark_price: f64,
    pub unrealized_pnl: f64,
    pub leverage: u32,
    pub liquidation_price: f64,
}

/// One immutable, append-only unit of trading history.
///
/// Created once per cycle, never mutated after persistence, and replayed
/// many times by the reconstructor. The raw `decision_json` is kept verbatim
/// because the AI's intended stop/target and the execution outcomes are
/// logged separately and only re-joined at replay time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub timestamp: DateTime<Utc>,
    pub cycle_number: u64,
    pub input_prompt: String,
    /// The model's free-text reasoning trace.
    pub reasoning: String,
    #[serde(default)]
    pub validation_trace: Vec<String>,
    /// The decision array as raw JSON text.
    pub decision_json: String,
    pub account: AccountSnapshot,
    pub positions: Vec<PositionSnapshot>,
    pub candidate_symbols: Vec<String>,
    /// Outcomes of the actions actually executed this cycle.
    pub executed: Vec<ExecutedAction>,
    #[serde(default)]
    pub execution_log: Vec<String>,
    pub success: bool,
    #[serde(default)]
    pub error_message: String,
    pub market_data: HashMap<String, MarketSnapshot>,
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            side: Side::Long,
            quantity: 0.0,
            entry_price: 0.0,
            mark_price: 0.0,
            unrealized_pnl: 0.0,
            leverage: 0,
            liquidation_price: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Action;

    #[test]
    fn cycle_record_round_trips_through_json() {
        let record = CycleRecord {
            timestamp: "2026-08-06T12:00:00Z".parse().unwrap(),
            cycle_number: 3,
            input_prompt: "prompt".to_string(),
            reasoning: "trace".to_string(),
            validation_trace: vec!["- validate BTCUSDT open_long: confirmed (AGREE)".to_string()],
            decision_json: r#"[{"symbol":"BTCUSDT","action":"open_long"}]"#.to_string(),
            account: AccountSnapshot {
                total_equity: 10_000.0,
                available_balance: 9_000.0,
                total_pnl: 120.0,
                margin_used_pct: 10.0,
                position_count: 1,
            },
            positions: vec![PositionSnapshot {
                symbol: "BTCUSDT".to_string(),
                quantity: 0.01,
                entry_price: 60_000.0,
                mark_price: 60_500.0,
                unrealized_pnl: 5.0,
                leverage: 10,
                liquidation_price: 54_000.0,
                ..Default::default()
            }],
            candidate_symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            executed: vec![ExecutedAction {
                action: Action::OpenLong,
                symbol: "BTCUSDT".to_string(),
                quantity: 0.01,
                leverage: 10,
                price: 60_000.0,
                order_id: 42,
                timestamp: "2026-08-06T12:00:01Z".parse().unwrap(),
                success: true,
                error: String::new(),
            }],
            execution_log: vec!["opened BTCUSDT".to_string()],
            success: true,
            error_message: String::new(),
            market_data: HashMap::from([(
                "BTCUSDT".to_string(),
                MarketSnapshot {
                    current_price: 60_000.0,
                    current_vwap: 59_900.0,
                    current_rsi7: 60.0,
                    current_macd: 15.0,
                },
            )]),
        };

        let encoded = serde_json::to_string_pretty(&record).unwrap();
        let decoded: CycleRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(record.timestamp, decoded.timestamp);
        assert_eq!(record.account, decoded.account);
        assert_eq!(record.positions, decoded.positions);
        assert_eq!(record.market_data, decoded.market_data);
        assert_eq!(record.executed[0].action, decoded.executed[0].action);
        assert_eq!(record.decision_json, decoded.decision_json);
    }
}
