// In crates/app-config/src/types.rs

use serde::Deserialize;

/// Top-level application settings.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub models: ModelsSettings,
    pub provider: ProviderSettings,
    pub trading: TradingSettings,
    pub log: LogSettings,
}

/// One chat-completions endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct ModelEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelsSettings {
    pub primary: ModelEndpoint,
    pub secondary: ModelEndpoint,
}

/// The market/account/pool collaborator service.
#[derive(Deserialize, Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TradingSettings {
    /// Leverage ceiling for BTC/ETH.
    pub btc_eth_leverage: u32,
    /// Leverage ceiling for everything else.
    pub altcoin_leverage: u32,
    /// Minutes between trading cycles.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// How many recent trades feed the performance review.
    #[serde(default = "default_performance_lookback")]
    pub performance_lookback: usize,
    /// Starting equity for the paper account.
    #[serde(default = "default_initial_equity")]
    pub initial_equity: f64,
    /// Open-interest notional floor for candidates, in millions of USD.
    #[serde(default = "default_liquidity_floor")]
    pub liquidity_floor_millions: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LogSettings {
    /// Directory the cycle records are written to.
    pub dir: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_interval_minutes() -> u64 {
    15
}

fn default_performance_lookback() -> usize {
    20
}

fn default_initial_equity() -> f64 {
    10_000.0
}

fn default_liquidity_floor() -> f64 {
    15.0
}

fn default_retention_days() -> u32 {
    30
}
