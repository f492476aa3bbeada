// In crates/ledger/src/insights.rs
//
// Turns the most recent trade outcomes into a short list of actionable
// review notes. This narrative is handed back to the prompt builder, the
// one place analytics state flows back into decision-making.

use crate::analyze::PerformanceAnalysis;
use crate::replay::CloseReason;
use core_types::Side;

/// How many of the most recent trades are reviewed.
const TRADES_TO_REVIEW: usize = 5;

/// Derives review notes from the most recent trades. Always returns some
/// text; with no history it says so instead of guessing.
pub fn generate_insights(analysis: &PerformanceAnalysis) -> String {
    if analysis.recent_trades.is_empty() {
        return "Not enough closed trades to review yet.".to_string();
    }

    let mut notes = Vec::new();

    for trade in analysis.recent_trades.iter().take(TRADES_TO_REVIEW) {
        let tag = format!("[{} {}]", trade.symbol, trade.side);

        if trade.pnl < 0.0 {
            if trade.close_reason == CloseReason::StopLoss {
                notes.push(format!(
                    "Losing trade {tag}: closed at the stop-loss. Re-examine the entry point and the stop placement."
                ));
            }

            match trade.side {
                Side::Long if trade.entry_rsi > 70.0 => notes.push(format!(
                    "Losing trade {tag}: opened long with RSI at {:.0}, likely overbought. Avoid opening longs when RSI > 70.",
                    trade.entry_rsi
                )),
                Side::Short if trade.entry_rsi < 30.0 => notes.push(format!(
                    "Losing trade {tag}: opened short with RSI at {:.0}, likely oversold. Avoid opening shorts when RSI < 30.",
                    trade.entry_rsi
                )),
                _ => {}
            }

            match trade.side {
                Side::Long if trade.open_price < trade.entry_vwap => notes.push(format!(
                    "Losing trade {tag}: opened long below VWAP, against the prevailing trend. Only open longs when price is above VWAP."
                )),
                Side::Short if trade.open_price > trade.entry_vwap => notes.push(format!(
                    "Losing trade {tag}: opened short above VWAP, against the prevailing trend. Only open shorts when price is below VWAP."
                )),
                _ => {}
            }
        }

        if trade.pnl > 0.0 {
            match trade.side {
                Side::Long if trade.open_price > trade.entry_vwap => notes.push(format!(
                    "Winning trade {tag}: long above VWAP, a trend-following entry that paid off. Keep taking entries aligned with VWAP."
                )),
                Side::Short if trade.open_price < trade.entry_vwap => notes.push(format!(
                    "Winning trade {tag}: short below VWAP, a trend-following entry that paid off. Keep taking entries aligned with VWAP."
                )),
                _ => {}
            }
        }
    }

    if notes.is_empty() {
        return "No clear pattern in the recent trades. Keep observing.".to_string();
    }

    format!("\n# Trade review notes\n{}", notes.join("\n"))
}
