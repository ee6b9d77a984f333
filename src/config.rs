//! Runtime configuration for a backtest run, loaded from the environment the
//! way the teacher's `StrategyEnvConfig::from_env` does: `.env` first, then
//! `std::env`, with `anyhow::Context` on every parse failure.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BacktestRunConfig {
    pub starting_balance: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub min_warmup_bars: usize,
    pub worker_pool_size: usize,
    pub swing_use_close: bool,
    pub range_min_touches: usize,
    pub false_breakout_min_wick_atr_mult: f64,
}

impl Default for BacktestRunConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            commission_pct: 0.04,
            slippage_pct: 0.02,
            min_warmup_bars: 50,
            worker_pool_size: 4,
            swing_use_close: true,
            range_min_touches: 3,
            false_breakout_min_wick_atr_mult: 0.3,
        }
    }
}

impl BacktestRunConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let default = Self::default();

        Ok(Self {
            starting_balance: Self::parse_f64("STRATFORGE_STARTING_BALANCE", default.starting_balance)?,
            commission_pct: Self::parse_f64("STRATFORGE_COMMISSION_PCT", default.commission_pct)?,
            slippage_pct: Self::parse_f64("STRATFORGE_SLIPPAGE_PCT", default.slippage_pct)?,
            min_warmup_bars: Self::parse_usize("STRATFORGE_MIN_WARMUP_BARS", default.min_warmup_bars)?,
            worker_pool_size: Self::parse_usize("STRATFORGE_WORKER_POOL_SIZE", default.worker_pool_size)?,
            swing_use_close: Self::parse_bool("STRATFORGE_SWING_USE_CLOSE", default.swing_use_close)?,
            range_min_touches: Self::parse_usize("STRATFORGE_RANGE_MIN_TOUCHES", default.range_min_touches)?,
            false_breakout_min_wick_atr_mult: Self::parse_f64(
                "STRATFORGE_FALSE_BREAKOUT_MIN_WICK_ATR_MULT",
                default.false_breakout_min_wick_atr_mult,
            )?,
        })
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key).unwrap_or_else(|_| default.to_string()).parse::<f64>().with_context(|| format!("failed to parse {key}"))
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key).unwrap_or_else(|_| default.to_string()).parse::<usize>().with_context(|| format!("failed to parse {key}"))
    }

    fn parse_bool(key: &str, default: bool) -> Result<bool> {
        env::var(key).unwrap_or_else(|_| default.to_string()).parse::<bool>().with_context(|| format!("failed to parse {key}"))
    }

    /// Loads engine-wide tuning constants from a TOML file, falling back to
    /// `Self::default()` for any key the file omits. Mirrors the teacher's
    /// layered file-then-env config loading, minus the env overlay (callers
    /// combine the two by calling `from_env` first and overriding fields).
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Initializes `tracing-subscriber` from `RUST_LOG`, defaulting to `info`.
/// Mirrors the teacher's binary-level logging setup.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
