// In crates/market/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Open-interest figures for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterest {
    /// Latest open interest, in contracts of the base asset.
    pub latest: f64,
}

/// A point-in-time market snapshot for one symbol.
///
/// The indicator values (VWAP, RSI, MACD) are computed by the market-data
/// collaborator and are opaque inputs here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub current_price: f64,
    pub current_vwap: f64,
    pub current_rsi7: f64,
    pub current_macd: f64,
    #[serde(default)]
    pub price_change_1h: f64,
    #[serde(default)]
    pub price_change_4h: f64,
    #[serde(default)]
    pub open_interest: Option<OpenInterest>,
}

impl MarketData {
    /// Open-interest notional in millions of USD, when open interest is known
    /// and the price is usable.
    pub fn oi_notional_millions(&self) -> Option<f64> {
        let oi = self.open_interest.as_ref()?;
        if self.current_price <= 0.0 {
            return None;
        }
        Some(oi.latest * self.current_price / 1_000_000.0)
    }

    /// Whether this symbol clears the open-interest liquidity floor.
    ///
    /// Symbols with unknown open interest pass; the floor only screens out
    /// instruments known to be thin.
    pub fn passes_liquidity_floor(&self, floor_millions: f64) -> bool {
        match self.oi_notional_millions() {
            Some(notional) => notional >= floor_millions,
            None => true,
        }
    }
}

/// One row of the open-interest growth leaderboard, used as decision context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OiTopEntry {
    pub symbol: String,
    pub rank: u32,
    /// Open-interest change over the last hour, percent.
    pub oi_delta_pct: f64,
    /// Open-interest change over the last hour, USD.
    pub oi_delta_value: f64,
    pub price_delta_pct: f64,
    pub net_long: f64,
    pub net_short: f64,
}

/// Renders the market block for one symbol as it appears in prompts.
pub fn format_market_block(data: &MarketData) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "- Price: {:.4} (1h {:+.2}%, 4h {:+.2}%)",
        data.current_price, data.price_change_1h, data.price_change_4h
    );
    let _ = writeln!(
        out,
        "- VWAP: {:.4} | RSI(7): {:.2} | MACD: {:.4}",
        data.current_vwap, data.current_rsi7, data.current_macd
    );
    if let Some(notional) = data.oi_notional_millions() {
        let _ = writeln!(out, "- Open interest: {notional:.1}M USD");
    }
    out
}
