// In crates/decision/src/prompt.rs
//
// Prompt text for the primary and secondary models. The system prompt is
// fixed strategy rules (cacheable); the user prompt carries the per-cycle
// account, position, and market state plus the analytics feedback.

use crate::types::DecisionContext;
use crate::validate::RiskLimits;
use chrono::Utc;
use core_types::TradeAction;
use market::format_market_block;
use std::fmt::Write;

/// Builds the fixed rule-based system prompt from the configured limits.
pub fn build_system_prompt(limits: &RiskLimits) -> String {
    let mut sb = String::new();

    sb.push_str("You are a professional crypto-futures trading AI running a VWAP-based intraday strategy.\n\n");
    sb.push_str("# Objective\n");
    sb.push_str("Follow the VWAP trading rules strictly, using RSI and MACD as confirmation, and only take high-probability setups.\n\n");

    sb.push_str("# Trading rules (VWAP strategy)\n\n");
    sb.push_str("## Long signal:\n");
    sb.push_str("1. Primary condition: current_price > current_vwap (price trading in the intraday strength zone).\n");
    sb.push_str("2. Entry timing: a cross above VWAP from below, or a successful retest of VWAP as support.\n");
    sb.push_str("3. Confirmation: current_rsi7 < 70 (do not chase into overbought) and current_macd > 0 or rising.\n");
    sb.push_str("4. Only when the primary condition and confirmations all hold is confidence >= 75 justified.\n\n");

    sb.push_str("## Short signal:\n");
    sb.push_str("1. Primary condition: current_price < current_vwap (price trading in the intraday weakness zone).\n");
    sb.push_str("2. Entry timing: a cross below VWAP from above, or a rejection at VWAP as resistance.\n");
    sb.push_str("3. Confirmation: current_rsi7 > 30 (do not sell into oversold) and current_macd < 0 or falling.\n");
    sb.push_str("4. Only when the primary condition and confirmations all hold is confidence >= 75 justified.\n\n");

    sb.push_str("## Hold / close rules:\n");
    sb.push_str("- Hold a long while current_price stays above current_vwap; hold a short while it stays below.\n");
    sb.push_str("- When price crosses back through VWAP against the position, close it.\n\n");

    sb.push_str("# Risk constraints (hard limits)\n\n");
    let _ = writeln!(
        sb,
        "1. Reward:risk must be at least {:.0}:1 from entry to take-profit versus entry to stop-loss.",
        limits.min_reward_risk
    );
    sb.push_str("2. Stop-loss: for longs, below VWAP; for shorts, above VWAP.\n");
    sb.push_str("3. Hold at most 3 symbols at once.\n");
    let _ = writeln!(
        sb,
        "4. Position value per symbol: altcoins up to {:.0} USD, BTC/ETH up to {:.0} USD.",
        limits.account_equity * limits.altcoin_size_multiplier,
        limits.account_equity * limits.majors_size_multiplier
    );
    let _ = writeln!(
        sb,
        "5. Leverage: altcoins at most {}x, BTC/ETH at most {}x.\n",
        limits.altcoin_max_leverage, limits.majors_max_leverage
    );

    sb.push_str("# Self-review before deciding\n\n");
    sb.push_str("The user prompt includes review notes covering the most recent trades: why losses happened and which patterns paid off. ");
    sb.push_str("Read them first, follow their recommendations in this cycle, and state in your reasoning how they changed your decision.\n\n");

    sb.push_str("# Decision procedure\n\n");
    sb.push_str("1. Review open positions: hold or close per the VWAP rules.\n");
    sb.push_str("2. Scan the candidate list for symbols meeting the long or short signal.\n");
    sb.push_str("3. If nothing qualifies, answer wait for every symbol; otherwise give open_long/open_short with all required parameters.\n\n");

    sb.push_str("# Output format\n\n");
    sb.push_str("Free-form reasoning first, then exactly one JSON array of decisions:\n");
    sb.push_str("```json\n[\n");
    sb.push_str("  {\"symbol\": \"BTCUSDT\", \"action\": \"open_long\", \"leverage\": 10, \"position_size_usd\": 5000, \"stop_loss\": 68000, \"take_profit\": 72000, \"confidence\": 80, \"risk_usd\": 200, \"reasoning\": \"price crossed above VWAP, RSI < 70, MACD rising\"}\n");
    sb.push_str("]\n```\n");

    sb
}

/// Builds the dynamic user prompt for one cycle.
pub fn build_user_prompt(ctx: &DecisionContext) -> String {
    let mut sb = String::new();

    let _ = writeln!(
        sb,
        "**Time**: {} | **Cycle**: #{} | **Runtime**: {} min\n",
        ctx.current_time, ctx.cycle_number, ctx.runtime_minutes
    );

    if let Some(btc) = ctx.market_data.get("BTCUSDT") {
        let _ = writeln!(
            sb,
            "**BTC**: {:.2} (1h {:+.2}%, 4h {:+.2}%) | VWAP: {:.2} | MACD: {:.4} | RSI: {:.2}\n",
            btc.current_price,
            btc.price_change_1h,
            btc.price_change_4h,
            btc.current_vwap,
            btc.current_macd,
            btc.current_rsi7
        );
    }

    let balance_pct = if ctx.account.total_equity > 0.0 {
        ctx.account.available_balance / ctx.account.total_equity * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        sb,
        "**Account**: equity {:.2} | balance {:.2} ({:.1}%) | PnL {:+.2}% | margin {:.1}% | {} positions\n",
        ctx.account.total_equity,
        ctx.account.available_balance,
        balance_pct,
        ctx.account.total_pnl_pct,
        ctx.account.margin_used_pct,
        ctx.account.position_count
    );

    if ctx.positions.is_empty() {
        sb.push_str("**Open positions**: none\n\n");
    } else {
        sb.push_str("## Open positions\n");
        let now_ms = Utc::now().timestamp_millis();
        for (i, pos) in ctx.positions.iter().enumerate() {
            let held_for = if pos.update_time > 0 {
                let minutes = (now_ms - pos.update_time) / (1000 * 60);
                if minutes < 60 {
                    format!(" | held {minutes} min")
                } else {
                    format!(" | held {}h {}m", minutes / 60, minutes % 60)
                }
            } else {
                String::new()
            };

            let _ = writeln!(
                sb,
                "{}. {} {} | entry {:.4} mark {:.4} | PnL {:+.2}% | {}x | margin {:.0} | liq {:.4}{}\n",
                i + 1,
                pos.symbol,
                pos.side.as_str().to_uppercase(),
                pos.entry_price,
                pos.mark_price,
                pos.unrealized_pnl_pct,
                pos.leverage,
                pos.margin_used,
                pos.liquidation_price,
                held_for
            );

            if let Some(data) = ctx.market_data.get(&pos.symbol) {
                sb.push_str(&format_market_block(data));
                sb.push('\n');
            }
        }
    }

    let _ = writeln!(sb, "## Candidate symbols ({})\n", ctx.market_data.len());
    let mut displayed = 0;
    for coin in &ctx.candidates {
        let Some(data) = ctx.market_data.get(&coin.symbol) else {
            continue;
        };
        displayed += 1;

        let source_tag = if coin.sources.len() > 1 {
            " (AI500 + OI_Top double signal)"
        } else if coin.sources.first().is_some_and(|s| s.as_str() == "oi_top") {
            " (OI_Top open-interest growth)"
        } else {
            ""
        };

        let _ = writeln!(sb, "### {displayed}. {}{source_tag}\n", coin.symbol);
        sb.push_str(&format_market_block(data));
        if let Some(oi) = ctx.oi_top.get(&coin.symbol) {
            let _ = writeln!(
                sb,
                "- OI leaderboard: rank #{}, OI {:+.2}% (1h), price {:+.2}%",
                oi.rank, oi.oi_delta_pct, oi.price_delta_pct
            );
        }
        sb.push('\n');
    }
    sb.push('\n');

    if let Some(sharpe) = ctx.sharpe_ratio {
        let _ = writeln!(sb, "## Sharpe ratio: {sharpe:.2}\n");
    }

    if !ctx.insights.is_empty() {
        sb.push_str(&ctx.insights);
        sb.push('\n');
    }

    sb.push_str("---\n\nAnalyze and output your decision (reasoning followed by the JSON array).\n");

    sb
}

/// Builds the constrained yes/no prompt for the secondary model.
pub fn build_validation_prompt(ctx: &DecisionContext, action: &TradeAction) -> String {
    let mut sb = String::new();

    sb.push_str("You are a strict trading-strategy validator. Judge whether the proposed decision follows the VWAP strategy rules and the market data below. ");
    sb.push_str("Answer with exactly one word: AGREE or DISAGREE.\n\n");

    sb.push_str("# VWAP strategy core rules\n");
    sb.push_str("- Long signal: price > VWAP, with RSI < 70 and MACD > 0.\n");
    sb.push_str("- Short signal: price < VWAP, with RSI > 30 and MACD < 0.\n\n");

    sb.push_str("# Proposed decision\n");
    let _ = writeln!(sb, "- Symbol: {}", action.symbol);
    let _ = writeln!(sb, "- Direction: {}", action.action);
    let _ = writeln!(sb, "- Reasoning: {}\n", action.reasoning);

    sb.push_str("# Market data\n");
    match ctx.market_data.get(&action.symbol) {
        Some(data) => sb.push_str(&format_market_block(data)),
        None => sb.push_str("No market data available for this symbol.\n"),
    }

    sb.push_str("\nDoes this decision follow the VWAP strategy rules? Answer AGREE or DISAGREE only.");

    sb
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{AccountInfo, Action};

    #[test]
    fn system_prompt_renders_configured_limits() {
        let limits = RiskLimits::new(10_000.0, 50, 20);
        let prompt = build_system_prompt(&limits);
        assert!(prompt.contains("at most 20x"));
        assert!(prompt.contains("at most 50x"));
        assert!(prompt.contains("100000 USD"));
        assert!(prompt.contains("3:1"));
    }

    #[test]
    fn user_prompt_includes_insights_and_sharpe() {
        let ctx = DecisionContext {
            current_time: "2026-08-06 12:00:00".to_string(),
            cycle_number: 7,
            account: AccountInfo {
                total_equity: 10_000.0,
                available_balance: 8_000.0,
                ..Default::default()
            },
            sharpe_ratio: Some(1.25),
            insights: "# Trade review notes\nkeep taking entries aligned with VWAP".to_string(),
            ..Default::default()
        };
        let prompt = build_user_prompt(&ctx);
        assert!(prompt.contains("Cycle**: #7"));
        assert!(prompt.contains("Sharpe ratio: 1.25"));
        assert!(prompt.contains("Trade review notes"));
        assert!(prompt.contains("Open positions**: none"));
    }

    #[test]
    fn validation_prompt_names_the_proposed_action() {
        let ctx = DecisionContext::default();
        let action = TradeAction {
            symbol: "ETHUSDT".to_string(),
            action: Action::OpenShort,
            leverage: 10,
            position_size_usd: 1_000.0,
            stop_loss: 3_100.0,
            take_profit: 2_800.0,
            confidence: 75,
            risk_usd: 50.0,
            reasoning: "below VWAP".to_string(),
        };
        let prompt = build_validation_prompt(&ctx, &action);
        assert!(prompt.contains("ETHUSDT"));
        assert!(prompt.contains("open_short"));
        assert!(prompt.contains("AGREE or DISAGREE"));
        assert!(prompt.contains("No market data available"));
    }
}
