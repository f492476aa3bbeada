// In crates/execution/src/paper.rs

use crate::Executor;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{AccountInfo, Action, ExecutedAction, Position, Side, TradeAction};
use market::MarketData;
use std::collections::HashMap;

/// Fills orders in memory at the snapshot price and tracks the resulting
/// paper account. At most one position is held per symbol; a second open on
/// a held symbol fails its outcome, so downstream replay never sees
/// overlapping open/close pairs.
#[derive(Debug)]
pub struct PaperExecutor {
    initial_equity: f64,
    /// Realized cash equity; unrealized PnL is derived from marks.
    equity: f64,
    positions: HashMap<String, Position>,
    next_order_id: i64,
}

impl PaperExecutor {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            initial_equity,
            equity: initial_equity,
            positions: HashMap::new(),
            next_order_id: 1,
        }
    }

    fn next_order_id(&mut self) -> i64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// Re-marks held positions against the latest snapshots.
    fn refresh_marks(&mut self, market: &HashMap<String, MarketData>) {
        for position in self.positions.values_mut() {
            let Some(data) = market.get(&position.symbol) else {
                continue;
            };
            position.mark_price = data.current_price;
            position.unrealized_pnl = unrealized_pnl(position);
            position.unrealized_pnl_pct = if position.margin_used > 0.0 {
                position.unrealized_pnl / position.margin_used * 100.0
            } else {
                0.0
            };
        }
    }

    fn open(&mut self, action: &TradeAction, market: &HashMap<String, MarketData>) -> ExecutedAction {
        let order_id = self.next_order_id();
        let side = action
            .action
            .side()
            .expect("open actions always name a side");

        if self.positions.contains_key(&action.symbol) {
            return failure(action, order_id, "a position is already open for this symbol");
        }
        let Some(data) = market.get(&action.symbol) else {
            return failure(action, order_id, "no market data for symbol");
        };
        if data.current_price <= 0.0 {
            return failure(action, order_id, "snapshot price is not positive");
        }

        let price = data.current_price;
        let quantity = action.position_size_usd / price;
        let margin_used = if action.leverage > 0 {
            action.position_size_usd / f64::from(action.leverage)
        } else {
            action.position_size_usd
        };
        let now = Utc::now();

        self.positions.insert(
            action.symbol.clone(),
            Position {
                symbol: action.symbol.clone(),
                side,
                entry_price: price,
                mark_price: price,
                quantity,
                leverage: action.leverage,
                unrealized_pnl: 0.0,
                unrealized_pnl_pct: 0.0,
                liquidation_price: 0.0,
                margin_used,
                update_time: now.timestamp_millis(),
            },
        );

        tracing::info!(symbol = %action.symbol, side = %side, quantity, price, "Paper position opened.");

        ExecutedAction {
            action: action.action,
            symbol: action.symbol.clone(),
            quantity,
            leverage: action.leverage,
            price,
            order_id,
            timestamp: now,
            success: true,
            error: String::new(),
        }
    }

    fn close(&mut self, action: &TradeAction, market: &HashMap<String, MarketData>) -> ExecutedAction {
        let order_id = self.next_order_id();
        let side = action
            .action
            .side()
            .expect("close actions always name a side");

        let matching = self
            .positions
            .get(&action.symbol)
            .is_some_and(|p| p.side == side);
        if !matching {
            return failure(action, order_id, "no matching open position");
        }
        let position = self
            .positions
            .remove(&action.symbol)
            .expect("position presence checked above");

        let price = market
            .get(&action.symbol)
            .map(|data| data.current_price)
            .unwrap_or(position.mark_price);

        let pnl = match position.side {
            Side::Long => position.quantity * (price - position.entry_price),
            Side::Short => position.quantity * (position.entry_price - price),
        };
        self.equity += pnl;

        tracing::info!(symbol = %action.symbol, side = %side, pnl, "Paper position closed.");

        ExecutedAction {
            action: action.action,
            symbol: action.symbol.clone(),
            quantity: position.quantity,
            leverage: position.leverage,
            price,
            order_id,
            timestamp: Utc::now(),
            success: true,
            error: String::new(),
        }
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    fn name(&self) -> &'static str {
        "PaperExecutor"
    }

    async fn execute(
        &mut self,
        actions: &[TradeAction],
        market: &HashMap<String, MarketData>,
    ) -> Vec<ExecutedAction> {
        self.refresh_marks(market);

        let mut outcomes = Vec::new();
        for action in actions {
            match action.action {
                Action::OpenLong | Action::OpenShort => outcomes.push(self.open(action, market)),
                Action::CloseLong | Action::CloseShort => outcomes.push(self.close(action, market)),
                _ => {}
            }
        }
        outcomes
    }

    fn account(&self) -> AccountInfo {
        let margin_used: f64 = self.positions.values().map(|p| p.margin_used).sum();
        let unrealized: f64 = self.positions.values().map(unrealized_pnl).sum();
        let total_equity = self.equity + unrealized;
        let total_pnl = total_equity - self.initial_equity;

        AccountInfo {
            total_equity,
            available_balance: (total_equity - margin_used).max(0.0),
            total_pnl,
            total_pnl_pct: if self.initial_equity > 0.0 {
                total_pnl / self.initial_equity * 100.0
            } else {
                0.0
            },
            margin_used,
            margin_used_pct: if total_equity > 0.0 {
                margin_used / total_equity * 100.0
            } else {
                0.0
            },
            position_count: self.positions.len(),
        }
    }

    fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }
}

fn unrealized_pnl(position: &Position) -> f64 {
    match position.side {
        Side::Long => position.quantity * (position.mark_price - position.entry_price),
        Side::Short => position.quantity * (position.entry_price - position.mark_price),
    }
}

fn failure(action: &TradeAction, order_id: i64, reason: &str) -> ExecutedAction {
    tracing::warn!(symbol = %action.symbol, action = %action.action, reason, "Paper execution rejected.");
    ExecutedAction {
        action: action.action,
        symbol: action.symbol.clone(),
        quantity: 0.0,
        leverage: action.leverage,
        price: 0.0,
        order_id,
        timestamp: Utc::now(),
        success: false,
        error: reason.to_string(),
    }
}
