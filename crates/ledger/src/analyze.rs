// In crates/ledger/src/analyze.rs
//
// Folds reconstructed trades into win/loss statistics and a Sharpe-style
// risk/return score over the recorded equity curve. Pure and single-pass;
// every invocation works from an immutable slice of history.

use crate::record::CycleRecord;
use crate::replay::{TradeOutcome, reconstruct_trades};
use crate::store::RecordStore;
use crate::{Result, insights};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reported when there are wins but no losses to divide by.
pub const SATURATED_PROFIT_FACTOR: f64 = 999.0;
/// Reported when the equity curve has a nonzero mean return but zero
/// variance, signalling "consistently one-sided" without dividing by zero.
pub const SATURATED_SHARPE: f64 = 999.0;
/// How many records are read per requested lookback cycle, so closes near
/// the window start can still find their opens.
pub const LOOKBACK_WINDOW_FACTOR: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolPerformance {
    pub symbol: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
}

/// Aggregate trading performance over a replay window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Mean of the losing subset; negative when losses exist.
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    /// The most recent trades, newest first, truncated to the lookback.
    pub recent_trades: Vec<TradeOutcome>,
    pub symbol_stats: HashMap<String, SymbolPerformance>,
    pub best_symbol: String,
    pub worst_symbol: String,
}

impl PerformanceAnalysis {
    /// The review-notes narrative for the next cycle's prompt.
    pub fn insights(&self) -> String {
        insights::generate_insights(self)
    }
}

/// Reconstructs trades from `records` (oldest first) and folds them into a
/// performance analysis. `lookback` bounds the recent-trades list only;
/// the statistics cover every matched trade in the window.
pub fn analyze_performance(records: &[CycleRecord], lookback: usize) -> PerformanceAnalysis {
    let outcomes = reconstruct_trades(records);

    let mut analysis = PerformanceAnalysis {
        sharpe_ratio: sharpe_ratio(records),
        ..Default::default()
    };

    let mut total_win = 0.0;
    let mut total_loss = 0.0;

    for outcome in &outcomes {
        analysis.total_trades += 1;
        if outcome.pnl > 0.0 {
            analysis.winning_trades += 1;
            total_win += outcome.pnl;
        } else if outcome.pnl < 0.0 {
            analysis.losing_trades += 1;
            total_loss += outcome.pnl;
        }

        let stats = analysis
            .symbol_stats
            .entry(outcome.symbol.clone())
            .or_insert_with(|| SymbolPerformance {
                symbol: outcome.symbol.clone(),
                ..Default::default()
            });
        stats.total_trades += 1;
        stats.total_pnl += outcome.pnl;
        if outcome.pnl > 0.0 {
            stats.winning_trades += 1;
        } else if outcome.pnl < 0.0 {
            stats.losing_trades += 1;
        }
    }

    if analysis.total_trades > 0 {
        analysis.win_rate =
            analysis.winning_trades as f64 / analysis.total_trades as f64 * 100.0;
        if analysis.winning_trades > 0 {
            analysis.avg_win = total_win / analysis.winning_trades as f64;
        }
        if analysis.losing_trades > 0 {
            analysis.avg_loss = total_loss / analysis.losing_trades as f64;
        }
        analysis.profit_factor = if total_loss != 0.0 {
            total_win / total_loss.abs()
        } else if total_win > 0.0 {
            SATURATED_PROFIT_FACTOR
        } else {
            0.0
        };
    }

    let mut best_pnl = f64::NEG_INFINITY;
    let mut worst_pnl = f64::INFINITY;
    for stats in analysis.symbol_stats.values_mut() {
        stats.win_rate = stats.winning_trades as f64 / stats.total_trades as f64 * 100.0;
        stats.avg_pnl = stats.total_pnl / stats.total_trades as f64;
        if stats.total_pnl > best_pnl {
            best_pnl = stats.total_pnl;
            analysis.best_symbol = stats.symbol.clone();
        }
        if stats.total_pnl < worst_pnl {
            worst_pnl = stats.total_pnl;
            analysis.worst_symbol = stats.symbol.clone();
        }
    }

    let mut recent = outcomes;
    recent.reverse();
    recent.truncate(lookback);
    analysis.recent_trades = recent;

    analysis
}

/// Reads an expanded window from the store and analyzes it. The window is
/// `lookback x 5` records so closes can still find opens from earlier
/// cycles.
pub fn analyze_recent(store: &dyn RecordStore, lookback: usize) -> Result<PerformanceAnalysis> {
    let records = store.latest(lookback.saturating_mul(LOOKBACK_WINDOW_FACTOR))?;
    Ok(analyze_performance(&records, lookback))
}

/// A Sharpe-style score over the per-cycle equity curve: mean period
/// return divided by the population standard deviation of returns.
///
/// Only positive recorded equity values are eligible samples. Under two
/// samples (or no computable return) the score is 0; zero variance
/// saturates to +/-999 depending on the sign of the mean return.
pub fn sharpe_ratio(records: &[CycleRecord]) -> f64 {
    let equities: Vec<f64> = records
        .iter()
        .map(|r| r.account.total_equity)
        .filter(|equity| *equity > 0.0)
        .collect();

    if equities.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equities
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return if mean > 0.0 {
            SATURATED_SHARPE
        } else if mean < 0.0 {
            -SATURATED_SHARPE
        } else {
            0.0
        };
    }

    mean / std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::tests::{btc_long_scenario, eth_short_scenario, executed, record};
    use approx::assert_relative_eq;
    use core_types::Action;

    fn two_trade_history() -> Vec<CycleRecord> {
        let mut records = btc_long_scenario();
        records.extend(eth_short_scenario());
        records
    }

    #[test]
    fn aggregates_wins_and_losses_with_newest_trade_first() {
        let analysis = analyze_performance(&two_trade_history(), 10);

        assert_eq!(analysis.total_trades, 2);
        assert_eq!(analysis.winning_trades, 1);
        assert_eq!(analysis.losing_trades, 1);
        assert_relative_eq!(analysis.win_rate, 50.0);
        assert_relative_eq!(analysis.avg_win, 14.94, max_relative = 1e-9);
        assert_relative_eq!(analysis.avg_loss, -4.95, max_relative = 1e-9);
        assert_relative_eq!(analysis.profit_factor, 14.94 / 4.95, max_relative = 1e-9);

        assert_eq!(analysis.recent_trades.len(), 2);
        assert_eq!(analysis.recent_trades[0].symbol, "ETHUSDT");
        assert_eq!(analysis.recent_trades[1].symbol, "BTCUSDT");

        assert_eq!(analysis.best_symbol, "BTCUSDT");
        assert_eq!(analysis.worst_symbol, "ETHUSDT");

        let btc = &analysis.symbol_stats["BTCUSDT"];
        assert_eq!(btc.total_trades, 1);
        assert_relative_eq!(btc.win_rate, 100.0);
    }

    #[test]
    fn recent_trades_are_truncated_to_the_lookback() {
        let analysis = analyze_performance(&two_trade_history(), 1);
        assert_eq!(analysis.recent_trades.len(), 1);
        assert_eq!(analysis.recent_trades[0].symbol, "ETHUSDT");
        // Statistics still cover the whole window.
        assert_eq!(analysis.total_trades, 2);
    }

    #[test]
    fn profit_factor_saturates_without_losses() {
        let analysis = analyze_performance(&btc_long_scenario(), 10);
        assert_relative_eq!(analysis.profit_factor, SATURATED_PROFIT_FACTOR);
    }

    #[test]
    fn no_trades_yields_an_empty_analysis() {
        let analysis = analyze_performance(&[], 10);
        assert_eq!(analysis.total_trades, 0);
        assert_relative_eq!(analysis.profit_factor, 0.0);
        assert!(analysis.recent_trades.is_empty());
        assert!(analysis.best_symbol.is_empty());
    }

    #[test]
    fn sharpe_is_zero_under_two_equity_samples() {
        assert_relative_eq!(sharpe_ratio(&[]), 0.0);

        let one = vec![record(
            vec![],
            "[]",
            &[],
            10_000.0,
            "2026-08-01T10:00:00Z",
        )];
        assert_relative_eq!(sharpe_ratio(&one), 0.0);

        // Non-positive equity samples are not eligible.
        let broken = vec![
            record(vec![], "[]", &[], 0.0, "2026-08-01T10:00:00Z"),
            record(vec![], "[]", &[], 10_000.0, "2026-08-01T11:00:00Z"),
        ];
        assert_relative_eq!(sharpe_ratio(&broken), 0.0);
    }

    #[test]
    fn sharpe_saturates_on_zero_variance() {
        let rising = vec![
            record(vec![], "[]", &[], 100.0, "2026-08-01T10:00:00Z"),
            record(vec![], "[]", &[], 110.0, "2026-08-01T11:00:00Z"),
            record(vec![], "[]", &[], 121.0, "2026-08-01T12:00:00Z"),
        ];
        assert_relative_eq!(sharpe_ratio(&rising), SATURATED_SHARPE);

        let falling = vec![
            record(vec![], "[]", &[], 100.0, "2026-08-01T10:00:00Z"),
            record(vec![], "[]", &[], 90.0, "2026-08-01T11:00:00Z"),
        ];
        assert_relative_eq!(sharpe_ratio(&falling), -SATURATED_SHARPE);

        let flat = vec![
            record(vec![], "[]", &[], 100.0, "2026-08-01T10:00:00Z"),
            record(vec![], "[]", &[], 100.0, "2026-08-01T11:00:00Z"),
        ];
        assert_relative_eq!(sharpe_ratio(&flat), 0.0);
    }

    #[test]
    fn sharpe_divides_mean_by_population_std_dev() {
        // Returns: +10% then -10%; mean 0, so the score is 0.
        let records = vec![
            record(vec![], "[]", &[], 100.0, "2026-08-01T10:00:00Z"),
            record(vec![], "[]", &[], 110.0, "2026-08-01T11:00:00Z"),
            record(vec![], "[]", &[], 99.0, "2026-08-01T12:00:00Z"),
        ];
        assert_relative_eq!(sharpe_ratio(&records), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_pnl_trade_counts_as_neither_win_nor_loss() {
        let records = vec![
            record(
                vec![executed(
                    Action::OpenLong,
                    "BTCUSDT",
                    0.01,
                    10,
                    60_000.0,
                    "2026-08-01T10:00:00Z",
                )],
                r#"[{"symbol":"BTCUSDT","action":"open_long","stop_loss":58000,"take_profit":65000}]"#,
                &[("BTCUSDT", 60_000.0, 59_900.0, 50.0, 0.0)],
                10_000.0,
                "2026-08-01T10:00:00Z",
            ),
            record(
                vec![executed(
                    Action::CloseLong,
                    "BTCUSDT",
                    0.01,
                    10,
                    60_000.0,
                    "2026-08-01T11:00:00Z",
                )],
                "[]",
                &[],
                10_000.0,
                "2026-08-01T11:00:00Z",
            ),
        ];
        let analysis = analyze_performance(&records, 10);
        assert_eq!(analysis.total_trades, 1);
        assert_eq!(analysis.winning_trades, 0);
        assert_eq!(analysis.losing_trades, 0);
        assert_relative_eq!(analysis.win_rate, 0.0);
    }
}
