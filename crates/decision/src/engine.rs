// In crates/decision/src/engine.rs
//
// The cross-validation orchestrator: one primary-model call proposes a
// decision batch, then every surviving open action is confirmed or dropped
// by an independent secondary model. Secondary calls run sequentially in
// the original decision order so the validation trace is deterministic.

use crate::error::{Error, Result};
use crate::parser;
use crate::prompt;
use crate::types::{DecisionContext, FullDecision};
use crate::validate::{self, RiskLimits};
use chrono::Utc;
use market::MarketDataProvider;
use model_client::ModelClient;

/// The token the secondary model must emit to confirm an open action.
pub const AFFIRMATIVE_TOKEN: &str = "AGREE";
/// The dissenting token, checked first so it cannot be mistaken for the
/// affirmative one by substring matching.
pub const DISSENT_TOKEN: &str = "DISAGREE";

/// Runs one full decision cycle: market-data fetch, primary proposal,
/// parse/normalize/validate, then per-action secondary confirmation.
///
/// Parse and validation failures return an error that still carries the
/// recovered reasoning trace, so operators can diagnose why a model failed.
pub async fn get_full_decision(
    ctx: &mut DecisionContext,
    limits: &RiskLimits,
    liquidity_floor_millions: f64,
    primary: &dyn ModelClient,
    secondary: &dyn ModelClient,
    provider: &dyn MarketDataProvider,
) -> Result<FullDecision> {
    fetch_market_data(ctx, provider, liquidity_floor_millions).await?;

    let system_prompt = prompt::build_system_prompt(limits);
    let user_prompt = prompt::build_user_prompt(ctx);

    let response = primary
        .call(&system_prompt, &user_prompt)
        .await
        .map_err(Error::PrimaryModel)?;

    let mut decision = parse_and_validate(&response, user_prompt, ctx, limits)?;

    tracing::info!(model = %secondary.name(), proposals = decision.decisions.len(), "Cross-validating open actions.");

    let proposed = std::mem::take(&mut decision.decisions);
    let mut final_decisions = Vec::with_capacity(proposed.len());
    let mut validation_trace = Vec::new();

    for mut action in proposed {
        // Only open actions carry new risk; everything else passes through.
        if !action.action.is_open() {
            final_decisions.push(action);
            continue;
        }

        let validation_prompt = prompt::build_validation_prompt(ctx, &action);
        match secondary.call("", &validation_prompt).await {
            Err(err) => {
                // A transport failure rejects the action: under-trading beats
                // acting on unconfirmed risk.
                let line = format!(
                    "- validate {} {}: rejected ({} call failed: {err})",
                    action.symbol,
                    action.action,
                    secondary.name()
                );
                tracing::warn!(symbol = %action.symbol, error = %err, "Secondary validation call failed; action dropped.");
                validation_trace.push(line);
            }
            Ok(verdict) => {
                if is_affirmative(&verdict) {
                    let line = format!(
                        "- validate {} {}: confirmed ({AFFIRMATIVE_TOKEN})",
                        action.symbol, action.action
                    );
                    tracing::info!(symbol = %action.symbol, action = %action.action, "Secondary model confirmed.");
                    validation_trace.push(line);

                    action
                        .reasoning
                        .push_str(&format!(" ({} confirmed)", secondary.name()));
                    final_decisions.push(action);
                } else {
                    let line = format!(
                        "- validate {} {}: rejected ({DISSENT_TOKEN}). Original reasoning: {}",
                        action.symbol, action.action, action.reasoning
                    );
                    tracing::info!(symbol = %action.symbol, action = %action.action, "Secondary model dissented; action dropped.");
                    validation_trace.push(line);
                }
            }
        }
    }

    decision.decisions = final_decisions;
    decision.validation_trace = validation_trace;
    decision.timestamp = Utc::now();

    Ok(decision)
}

/// Populates `ctx.market_data` for every position and candidate symbol.
///
/// Fetches run concurrently; a single symbol's failure is logged and
/// skipped. Candidates below the open-interest liquidity floor are dropped;
/// held positions are exempt so they can still be closed. The batch is
/// fatal only when symbols were requested and none produced data.
pub async fn fetch_market_data(
    ctx: &mut DecisionContext,
    provider: &dyn MarketDataProvider,
    liquidity_floor_millions: f64,
) -> Result<()> {
    let mut symbols: Vec<String> = ctx.positions.iter().map(|p| p.symbol.clone()).collect();
    for coin in &ctx.candidates {
        if !symbols.contains(&coin.symbol) {
            symbols.push(coin.symbol.clone());
        }
    }

    let fetches = symbols.iter().map(|symbol| provider.market_data(symbol));
    let results = futures::future::join_all(fetches).await;

    ctx.market_data.clear();
    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(data) => {
                let held = ctx.positions.iter().any(|p| &p.symbol == symbol);
                if !held && !data.passes_liquidity_floor(liquidity_floor_millions) {
                    tracing::warn!(
                        symbol = %symbol,
                        notional_millions = ?data.oi_notional_millions(),
                        "Open-interest notional below the liquidity floor; skipping symbol."
                    );
                    continue;
                }
                ctx.market_data.insert(symbol.clone(), data);
            }
            Err(err) => {
                tracing::warn!(symbol = %symbol, error = %err, "Market data fetch failed; skipping symbol.");
            }
        }
    }

    if ctx.market_data.is_empty() && !symbols.is_empty() {
        return Err(Error::MarketDataUnavailable {
            requested: symbols.len(),
        });
    }

    // The OI leaderboard only enriches prompts; a failure never blocks the cycle.
    match provider.oi_top().await {
        Ok(entries) => {
            ctx.oi_top = entries
                .into_iter()
                .map(|entry| (entry.symbol.clone(), entry))
                .collect();
        }
        Err(err) => {
            tracing::warn!(error = %err, "OI leaderboard fetch failed; continuing without it.");
        }
    }

    Ok(())
}

/// Splits the primary response into reasoning and decisions, then
/// normalizes and validates the batch.
fn parse_and_validate(
    response: &str,
    user_prompt: String,
    ctx: &DecisionContext,
    limits: &RiskLimits,
) -> Result<FullDecision> {
    let reasoning = parser::extract_reasoning(response).to_string();

    let mut actions = match parser::extract_actions(response) {
        Ok(actions) => actions,
        Err(source) => {
            return Err(Error::Parse {
                partial: Box::new(FullDecision {
                    user_prompt,
                    reasoning,
                    decisions: Vec::new(),
                    validation_trace: Vec::new(),
                    timestamp: Utc::now(),
                }),
                source,
            });
        }
    };

    validate::normalize_actions(&mut actions, &ctx.positions);

    if let Err(source) = validate::validate_actions(&actions, limits) {
        return Err(Error::Validation {
            partial: Box::new(FullDecision {
                user_prompt,
                reasoning,
                decisions: actions,
                validation_trace: Vec::new(),
                timestamp: Utc::now(),
            }),
            source,
        });
    }

    Ok(FullDecision {
        user_prompt,
        reasoning,
        decisions: actions,
        validation_trace: Vec::new(),
        timestamp: Utc::now(),
    })
}

fn is_affirmative(verdict: &str) -> bool {
    let upper = verdict.to_uppercase();
    !upper.contains(DISSENT_TOKEN) && upper.contains(AFFIRMATIVE_TOKEN)
}
