// In app/src/main.rs

use anyhow::Result;
use app_config::Settings;
use chrono::Utc;
use clap::{Parser, Subcommand};
use core_types::ExecutedAction;
use decision::{DecisionContext, FullDecision, RiskLimits};
use execution::{Executor, PaperExecutor};
use ledger::{AccountSnapshot, CycleRecord, FileRecordStore, MarketSnapshot, PositionSnapshot, RecordStore};
use market::{HttpProvider, StateProvider};
use model_client::{HttpModelClient, ModelClient};
use std::collections::HashMap;
use std::time::{Duration, Instant};

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "An AI-cross-validated crypto-futures trading loop.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the trading loop against the paper executor.
    Run {
        /// Stop after this many cycles (runs until interrupted by default).
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Replays recent cycle records and prints the performance analysis.
    Analyze {
        /// How many recent trades to report.
        #[arg(short, long, default_value_t = 20)]
        lookback: usize,
    },

    /// Prints cycle-level statistics over the whole record log.
    Stats,

    /// Deletes records older than the retention horizon.
    Clean {
        /// Override the configured retention, in days.
        #[arg(long)]
        days: Option<u32>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting Meridian application");

    let settings = app_config::load_settings()?;

    match cli.command {
        Commands::Run { cycles } => run_loop(settings, cycles).await?,
        Commands::Analyze { lookback } => handle_analyze(&settings, lookback)?,
        Commands::Stats => handle_stats(&settings)?,
        Commands::Clean { days } => handle_clean(&settings, days)?,
    }

    Ok(())
}

// --- Command Handlers ---

async fn run_loop(settings: Settings, max_cycles: Option<u64>) -> Result<()> {
    let provider = HttpProvider::new(settings.provider.base_url.clone());
    let primary = HttpModelClient::new(
        "primary",
        settings.models.primary.base_url.clone(),
        settings.models.primary.api_key.clone(),
        settings.models.primary.model.clone(),
    );
    let secondary = HttpModelClient::new(
        "secondary",
        settings.models.secondary.base_url.clone(),
        settings.models.secondary.api_key.clone(),
        settings.models.secondary.model.clone(),
    );

    let mut store = FileRecordStore::open(&settings.log.dir)?;
    let mut executor = PaperExecutor::new(settings.trading.initial_equity);

    let started = Instant::now();
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        tracing::info!(cycle, "Starting trading cycle.");

        if let Err(err) = run_cycle(
            &settings,
            &provider,
            &primary,
            &secondary,
            &mut store,
            &mut executor,
            started,
            cycle,
        )
        .await
        {
            tracing::error!(cycle, error = %err, "Trading cycle failed.");
        }

        if let Err(err) = store.prune(settings.log.retention_days) {
            tracing::warn!(error = %err, "Record retention sweep failed.");
        }

        if max_cycles.is_some_and(|max| cycle >= max) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(settings.trading.interval_minutes * 60)).await;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_cycle(
    settings: &Settings,
    provider: &HttpProvider,
    primary: &dyn ModelClient,
    secondary: &dyn ModelClient,
    store: &mut FileRecordStore,
    executor: &mut PaperExecutor,
    started: Instant,
    cycle: u64,
) -> Result<()> {
    // 1. Gather state: candidates from the pool service, account and
    // positions from the paper executor.
    let candidates = match provider.candidates().await {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::warn!(error = %err, "Candidate fetch failed; deciding over held positions only.");
            Vec::new()
        }
    };
    let account = executor.account();

    // 2. Replay recent history so the next prompt carries the feedback.
    let analysis = ledger::analyze_recent(store, settings.trading.performance_lookback)?;
    let insights = analysis.insights();

    let limits = RiskLimits::new(
        account.total_equity,
        settings.trading.btc_eth_leverage,
        settings.trading.altcoin_leverage,
    );

    let mut ctx = DecisionContext {
        current_time: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        runtime_minutes: started.elapsed().as_secs() as i64 / 60,
        cycle_number: cycle,
        account,
        positions: executor.positions(),
        candidates,
        market_data: HashMap::new(),
        oi_top: HashMap::new(),
        sharpe_ratio: (analysis.total_trades > 0).then_some(analysis.sharpe_ratio),
        insights,
    };

    // 3. Decide, execute, and log the cycle. A failed cycle is still logged
    // with whatever reasoning trace was recovered.
    match decision::get_full_decision(
        &mut ctx,
        &limits,
        settings.trading.liquidity_floor_millions,
        primary,
        secondary,
        provider,
    )
    .await
    {
        Ok(decision) => {
            let executed = executor.execute(&decision.decisions, &ctx.market_data).await;
            let mut record =
                build_record(&ctx, Some(&decision), &executed, executor, true, String::new())?;
            store.append(&mut record)?;
            Ok(())
        }
        Err(err) => {
            let mut record = build_record(
                &ctx,
                err.partial_decision(),
                &[],
                executor,
                false,
                err.to_string(),
            )?;
            store.append(&mut record)?;
            Err(err.into())
        }
    }
}

/// Assembles the immutable cycle record from the decision and its outcomes.
fn build_record(
    ctx: &DecisionContext,
    decision: Option<&FullDecision>,
    executed: &[ExecutedAction],
    executor: &PaperExecutor,
    success: bool,
    error_message: String,
) -> Result<CycleRecord> {
    let decision_json = match decision {
        Some(full) => serde_json::to_string(&full.decisions)?,
        None => "[]".to_string(),
    };

    let account = executor.account();
    let execution_log = executed
        .iter()
        .map(|outcome| {
            if outcome.success {
                format!(
                    "{} {} qty {:.6} @ {:.4}",
                    outcome.action, outcome.symbol, outcome.quantity, outcome.price
                )
            } else {
                format!("{} {} failed: {}", outcome.action, outcome.symbol, outcome.error)
            }
        })
        .collect();

    Ok(CycleRecord {
        timestamp: Utc::now(),
        cycle_number: 0,
        input_prompt: decision.map(|d| d.user_prompt.clone()).unwrap_or_default(),
        reasoning: decision.map(|d| d.reasoning.clone()).unwrap_or_default(),
        validation_trace: decision.map(|d| d.validation_trace.clone()).unwrap_or_default(),
        decision_json,
        account: AccountSnapshot {
            total_equity: account.total_equity,
            available_balance: account.available_balance,
            total_pnl: account.total_pnl,
            margin_used_pct: account.margin_used_pct,
            position_count: account.position_count,
        },
        positions: executor
            .positions()
            .iter()
            .map(|p| PositionSnapshot {
                symbol: p.symbol.clone(),
                side: p.side,
                quantity: p.quantity,
                entry_price: p.entry_price,
                mark_price: p.mark_price,
                unrealized_pnl: p.unrealized_pnl,
                leverage: p.leverage,
                liquidation_price: p.liquidation_price,
            })
            .collect(),
        candidate_symbols: ctx.candidates.iter().map(|c| c.symbol.clone()).collect(),
        executed: executed.to_vec(),
        execution_log,
        success,
        error_message,
        market_data: ctx
            .market_data
            .iter()
            .map(|(symbol, data)| (symbol.clone(), MarketSnapshot::from(data)))
            .collect(),
    })
}

fn handle_analyze(settings: &Settings, lookback: usize) -> Result<()> {
    let store = FileRecordStore::open(&settings.log.dir)?;
    let analysis = ledger::analyze_recent(&store, lookback)?;

    println!("Performance over the replay window:");
    println!(
        "  Trades: {} total, {} wins, {} losses (win rate {:.1}%)",
        analysis.total_trades, analysis.winning_trades, analysis.losing_trades, analysis.win_rate
    );
    println!(
        "  Avg win {:+.2} | avg loss {:+.2} | profit factor {:.2} | Sharpe {:.2}",
        analysis.avg_win, analysis.avg_loss, analysis.profit_factor, analysis.sharpe_ratio
    );
    if !analysis.best_symbol.is_empty() {
        println!(
            "  Best symbol: {} | worst symbol: {}",
            analysis.best_symbol, analysis.worst_symbol
        );
    }

    if !analysis.recent_trades.is_empty() {
        println!("\nRecent trades (newest first):");
        for trade in &analysis.recent_trades {
            println!(
                "  {} {} {} qty {:.6} | {:.4} -> {:.4} | PnL {:+.2} ({:+.1}%) | {} | held {}",
                trade.close_time.format("%Y-%m-%d %H:%M"),
                trade.symbol,
                trade.side,
                trade.quantity,
                trade.open_price,
                trade.close_price,
                trade.pnl,
                trade.pnl_pct,
                trade.close_reason,
                trade.duration
            );
        }
    }

    println!("{}", analysis.insights());
    Ok(())
}

fn handle_stats(settings: &Settings) -> Result<()> {
    let store = FileRecordStore::open(&settings.log.dir)?;
    let records = store.latest(usize::MAX)?;
    let stats = ledger::statistics(&records);

    println!("Cycle statistics:");
    println!(
        "  Cycles: {} total, {} successful, {} failed",
        stats.total_cycles, stats.successful_cycles, stats.failed_cycles
    );
    println!(
        "  Fills: {} opens, {} closes",
        stats.opens_executed, stats.closes_executed
    );
    Ok(())
}

fn handle_clean(settings: &Settings, days: Option<u32>) -> Result<()> {
    let mut store = FileRecordStore::open(&settings.log.dir)?;
    let retention = days.unwrap_or(settings.log.retention_days);
    let removed = store.prune(retention)?;
    println!("Removed {removed} records older than {retention} days.");
    Ok(())
}
