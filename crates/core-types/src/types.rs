// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The direction of a held position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade instruction as emitted by the model.
///
/// The canonical set is the first six variants. `HoldLong`/`HoldShort` and
/// the side-less `Close` are accepted on the wire and folded into canonical
/// form by normalization before validation runs. `UnresolvedClose` marks a
/// generic close with no matching open position; it always fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Action {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    Hold,
    Wait,
    HoldLong,
    HoldShort,
    Close,
    UnresolvedClose,
    Unknown,
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match value.as_str() {
            "open_long" => Action::OpenLong,
            "open_short" => Action::OpenShort,
            "close_long" => Action::CloseLong,
            "close_short" => Action::CloseShort,
            "hold" => Action::Hold,
            "wait" => Action::Wait,
            "hold_long" => Action::HoldLong,
            "hold_short" => Action::HoldShort,
            "close" => Action::Close,
            "unresolved_close" => Action::UnresolvedClose,
            _ => Action::Unknown,
        }
    }
}

impl Action {
    /// True for `open_long` and `open_short`.
    pub fn is_open(&self) -> bool {
        matches!(self, Action::OpenLong | Action::OpenShort)
    }

    /// True for `close_long` and `close_short`.
    pub fn is_close(&self) -> bool {
        matches!(self, Action::CloseLong | Action::CloseShort)
    }

    /// The side an open/close action acts on, if it names one.
    pub fn side(&self) -> Option<Side> {
        match self {
            Action::OpenLong | Action::CloseLong => Some(Side::Long),
            Action::OpenShort | Action::CloseShort => Some(Side::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::OpenLong => "open_long",
            Action::OpenShort => "open_short",
            Action::CloseLong => "close_long",
            Action::CloseShort => "close_short",
            Action::Hold => "hold",
            Action::Wait => "wait",
            Action::HoldLong => "hold_long",
            Action::HoldShort => "hold_short",
            Action::Close => "close",
            Action::UnresolvedClose => "unresolved_close",
            Action::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed trade instruction from the model.
///
/// Numeric fields are optional on the wire; the model omits them for
/// close/hold/wait actions, so they default to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeAction {
    pub symbol: String,
    pub action: Action,
    #[serde(default)]
    pub leverage: u32,
    #[serde(default)]
    pub position_size_usd: f64,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default)]
    pub take_profit: f64,
    /// Advisory confidence score, 0-100.
    #[serde(default)]
    pub confidence: u32,
    /// Advisory maximum dollar risk.
    #[serde(default)]
    pub risk_usd: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// A currently held position, as reported by the account collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub mark_price: f64,
    pub quantity: f64,
    pub leverage: u32,
    #[serde(default)]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub unrealized_pnl_pct: f64,
    #[serde(default)]
    pub liquidation_price: f64,
    #[serde(default)]
    pub margin_used: f64,
    /// Last position update, milliseconds since the epoch.
    #[serde(default)]
    pub update_time: i64,
}

/// An account-level snapshot from the account collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub total_equity: f64,
    pub available_balance: f64,
    pub total_pnl: f64,
    pub total_pnl_pct: f64,
    pub margin_used: f64,
    pub margin_used_pct: f64,
    pub position_count: usize,
}

/// A candidate symbol from the coin-pool collaborator, tagged with the
/// screeners that surfaced it ("ai500", "oi_top").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCoin {
    pub symbol: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// The outcome of executing one trade action, as logged in a cycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedAction {
    pub action: Action,
    pub symbol: String,
    pub quantity: f64,
    #[serde(default)]
    pub leverage: u32,
    /// Fill price.
    pub price: f64,
    #[serde(default)]
    pub order_id: i64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default)]
    pub error: String,
}
