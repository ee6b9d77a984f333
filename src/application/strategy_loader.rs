//! Parses a declarative strategy document (JSON) into a [`Strategy`]. The
//! condition registry is closed: an unknown `type` is logged and the single
//! condition is skipped rather than failing the whole document.

use crate::domain::conditions::context::{ComputedLevel, Level};
use crate::domain::conditions::indicator::{AdxTrending, EmaAlignment, MacdCrossover, PriceAboveEma, PriceAboveVwap, PriceBelowEma, PriceBelowVwap, RsiLevel, RsiZone, VolumeSpikeCondition, VwapSlope};
use crate::domain::conditions::pattern::{At25FibLevel, At75FibLevel, BosOccurred, FalseBreakoutOccurred, InDowntrend, InRange, InUptrend, IsRanging, MsbOccurred, RetestOccurred};
use crate::domain::conditions::price::{CandleBias, CandleDirection, ConsecutiveCandles, PriceAbove, PriceBelow, PriceCrossedAbove, PriceCrossedBelow, PriceInRange, PriceNear};
use crate::domain::conditions::Condition;
use crate::domain::errors::StrategyLoadError;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::strategy::{Direction, SlConfig, Strategy, TpConfig};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Default, Clone, Copy)]
pub struct StrategyLoader;

impl StrategyLoader {
    pub fn load_file(&self, path: &Path) -> Result<Strategy, StrategyLoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| StrategyLoadError::DocumentParse { reason: e.to_string() })?;
        self.load_string(&text)
    }

    pub fn load_string(&self, text: &str) -> Result<Strategy, StrategyLoadError> {
        let doc: Value = serde_json::from_str(text).map_err(|e| StrategyLoadError::DocumentParse { reason: e.to_string() })?;
        self.load_document(&doc)
    }

    /// Unreadable or malformed files are logged and skipped; the rest of the
    /// directory still loads.
    pub fn load_directory(&self, dir: &Path) -> Vec<Strategy> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            warn!(dir = %dir.display(), "strategy directory could not be read");
            return Vec::new();
        };

        entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| match self.load_file(&e.path()) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!(file = %e.path().display(), error = %err, "skipping strategy file");
                    None
                }
            })
            .collect()
    }

    pub fn load_document(&self, doc: &Value) -> Result<Strategy, StrategyLoadError> {
        let name = doc.get("name").and_then(Value::as_str).unwrap_or("Unnamed Strategy").to_string();

        let timeframe = doc
            .get("timeframe")
            .and_then(Value::as_str)
            .map(Timeframe::from_str)
            .transpose()
            .map_err(|reason| StrategyLoadError::InvalidParameter {
                type_name: "strategy".into(),
                param: "timeframe".into(),
                reason: reason.to_string(),
            })?
            .unwrap_or(Timeframe::FifteenMin);

        let direction = match doc.get("direction").and_then(Value::as_str).unwrap_or("both") {
            "long" => Direction::Long,
            "short" => Direction::Short,
            _ => Direction::Both,
        };

        let entry = doc
            .get("entry")
            .and_then(|e| e.get("conditions"))
            .and_then(Value::as_array)
            .map(|arr| self.parse_conditions(arr))
            .unwrap_or_default();

        let filters = doc.get("filters").and_then(Value::as_array).map(|arr| self.parse_conditions(arr)).unwrap_or_default();

        let exit = doc.get("exit");
        let stop_loss = exit.and_then(|e| e.get("stop_loss")).map(parse_stop_loss).unwrap_or(SlConfig::Atr { multiplier: 1.5 });
        let take_profit = exit.and_then(|e| e.get("take_profit")).map(parse_take_profit).unwrap_or(TpConfig::RiskReward { ratio: 3.0 });

        let risk_percent = doc.get("risk_percent").and_then(Value::as_f64).unwrap_or(1.0);
        let max_positions = doc.get("max_positions").and_then(Value::as_u64).unwrap_or(1) as usize;
        let description = doc.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
        let enabled = doc.get("enabled").and_then(Value::as_bool).unwrap_or(true);

        if entry.is_empty() {
            warn!(strategy = %name, "strategy has no remaining entry conditions, disabling");
            return Ok(Strategy {
                name,
                timeframe,
                direction,
                entry,
                filters,
                stop_loss,
                take_profit,
                risk_percent,
                max_positions,
                description,
                enabled: false,
            });
        }

        Ok(Strategy { name, timeframe, direction, entry, filters, stop_loss, take_profit, risk_percent, max_positions, description, enabled })
    }

    fn parse_conditions(&self, items: &[Value]) -> Vec<Condition> {
        items.iter().filter_map(|item| self.parse_condition(item)).collect()
    }

    fn parse_condition(&self, data: &Value) -> Option<Condition> {
        let type_name = data.get("type").and_then(Value::as_str)?;

        let condition = match type_name {
            "price_above" => Condition::PriceAbove(PriceAbove { level: parse_level(data.get("level")?)? }),
            "price_below" => Condition::PriceBelow(PriceBelow { level: parse_level(data.get("level")?)? }),
            "price_near" => Condition::PriceNear(PriceNear {
                level: parse_level(data.get("level")?)?,
                tolerance_pct: num(data, "tolerance_pct", 0.1),
            }),
            "price_crossed_above" => Condition::PriceCrossedAbove(PriceCrossedAbove { level: parse_level(data.get("level")?)? }),
            "price_crossed_below" => Condition::PriceCrossedBelow(PriceCrossedBelow { level: parse_level(data.get("level")?)? }),
            "price_in_range" => Condition::PriceInRange(PriceInRange { low: num(data, "low", 0.0), high: num(data, "high", 0.0) }),
            "candle_direction" => Condition::CandleDirection(CandleDirection { direction: parse_bias(data.get("direction"))? }),
            "consecutive_candles" => Condition::ConsecutiveCandles(ConsecutiveCandles {
                direction: parse_bias(data.get("direction"))?,
                count: usize_of(data, "count", 2),
            }),

            "bos_occurred" => Condition::BosOccurred(BosOccurred { direction: data.get("direction").and_then(|v| parse_bias(Some(v))), lookback: usize_of(data, "lookback", 5) }),
            "msb_occurred" => Condition::MsbOccurred(MsbOccurred { direction: data.get("direction").and_then(|v| parse_bias(Some(v))), lookback: usize_of(data, "lookback", 5) }),
            "in_range" => Condition::InRange(InRange { min_touches: usize_of(data, "min_touches", 3) }),
            "at_75_fib" => Condition::At75FibLevel(At75FibLevel { tolerance_pct: num(data, "tolerance_pct", 0.5) }),
            "at_25_fib" => Condition::At25FibLevel(At25FibLevel { tolerance_pct: num(data, "tolerance_pct", 0.5) }),
            "false_breakout" => Condition::FalseBreakoutOccurred(FalseBreakoutOccurred {
                direction: data.get("direction").and_then(|v| parse_bias(Some(v))),
                lookback: usize_of(data, "lookback", 3),
            }),
            "in_uptrend" => Condition::InUptrend(InUptrend),
            "in_downtrend" => Condition::InDowntrend(InDowntrend),
            "is_ranging" => Condition::IsRanging(IsRanging),
            "retest_occurred" => Condition::RetestOccurred(RetestOccurred { lookback: usize_of(data, "lookback", 10) }),

            "ema_alignment" => Condition::EmaAlignment(EmaAlignment {
                direction: parse_bias(data.get("direction"))?,
                periods: data.get("periods")?.as_array()?.iter().filter_map(Value::as_u64).map(|v| v as usize).collect(),
            }),
            "price_above_ema" => Condition::PriceAboveEma(PriceAboveEma { period: usize_of(data, "period", 200) }),
            "price_below_ema" => Condition::PriceBelowEma(PriceBelowEma { period: usize_of(data, "period", 200) }),
            "rsi_level" => Condition::RsiLevel(RsiLevel {
                zone: parse_rsi_zone(data.get("zone")).unwrap_or(RsiZone::Neutral),
                period: usize_of(data, "period", 14),
                oversold: num(data, "oversold", 30.0),
                overbought: num(data, "overbought", 70.0),
            }),
            "vwap_slope" => Condition::VwapSlope(VwapSlope { direction: parse_bias(data.get("direction"))?, slope_period: usize_of(data, "slope_period", 5) }),
            "price_above_vwap" => Condition::PriceAboveVwap(PriceAboveVwap),
            "price_below_vwap" => Condition::PriceBelowVwap(PriceBelowVwap),
            "volume_spike" => Condition::VolumeSpike(VolumeSpikeCondition { threshold: num(data, "threshold", 1.5), period: usize_of(data, "period", 20) }),
            "adx_trending" => Condition::AdxTrending(AdxTrending { threshold: num(data, "threshold", 25.0), period: usize_of(data, "period", 14) }),
            "macd_crossover" => Condition::MacdCrossover(MacdCrossover {
                direction: parse_bias(data.get("direction"))?,
                fast: usize_of(data, "fast", 12),
                slow: usize_of(data, "slow", 26),
                signal: usize_of(data, "signal", 9),
            }),

            other => {
                warn!(condition_type = %other, "unknown condition type, skipping");
                return None;
            }
        };

        Some(condition)
    }
}

fn num(data: &Value, key: &str, default: f64) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn usize_of(data: &Value, key: &str, default: usize) -> usize {
    data.get(key).and_then(Value::as_u64).map(|v| v as usize).unwrap_or(default)
}

fn parse_bias(value: Option<&Value>) -> Option<CandleBias> {
    match value?.as_str()? {
        "bullish" | "up" | "long" => Some(CandleBias::Bullish),
        "bearish" | "down" | "short" => Some(CandleBias::Bearish),
        _ => None,
    }
}

fn parse_rsi_zone(value: Option<&Value>) -> Option<RsiZone> {
    match value?.as_str()? {
        "oversold" => Some(RsiZone::Oversold),
        "overbought" => Some(RsiZone::Overbought),
        "neutral" => Some(RsiZone::Neutral),
        _ => None,
    }
}

fn parse_level(value: &Value) -> Option<Level> {
    if let Some(n) = value.as_f64() {
        return Some(Level::Scalar(n));
    }
    let s = value.as_str()?;
    let computed = match s {
        "last_swing_high" => Some(ComputedLevel::LastSwingHigh),
        "last_swing_low" => Some(ComputedLevel::LastSwingLow),
        "range_mid" => Some(ComputedLevel::RangeMid),
        "range_high" => Some(ComputedLevel::RangeHigh),
        "range_low" => Some(ComputedLevel::RangeLow),
        _ => None,
    };
    Some(match computed {
        Some(c) => Level::Computed(c),
        None => Level::ContextKey(s.to_string()),
    })
}

fn parse_stop_loss(data: &Value) -> SlConfig {
    match data.get("type").and_then(Value::as_str).unwrap_or("atr") {
        "percent" => SlConfig::Percent { percent: num(data, "percent", num(data, "value", 1.0)) },
        "fixed" => SlConfig::Fixed { value: num(data, "value", 1.0) },
        "swing" => SlConfig::Swing,
        "level" => SlConfig::Level { price: num(data, "price", num(data, "value", 0.0)) },
        _ => SlConfig::Atr { multiplier: num(data, "multiplier", num(data, "value", 1.5)) },
    }
}

fn parse_take_profit(data: &Value) -> TpConfig {
    match data.get("type").and_then(Value::as_str).unwrap_or("risk_reward") {
        "atr" => TpConfig::Atr { multiplier: num(data, "multiplier", num(data, "value", 1.5)) },
        "percent" => TpConfig::Percent { percent: num(data, "percent", num(data, "value", 2.0)) },
        "fixed" => TpConfig::Fixed { value: num(data, "value", 1.0) },
        "level" => TpConfig::Level { price: num(data, "price", num(data, "value", 0.0)) },
        _ => TpConfig::RiskReward { ratio: num(data, "ratio", num(data, "value", 3.0)) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bos_breakout_document() {
        let doc = json!({
            "name": "BOS Breakout Long",
            "timeframe": "15m",
            "direction": "long",
            "entry": {
                "conditions": [
                    {"type": "bos_occurred", "direction": "bullish", "lookback": 5},
                    {"type": "price_above_ema", "period": 200},
                ]
            },
            "exit": {
                "stop_loss": {"type": "atr", "multiplier": 1.5},
                "take_profit": {"type": "risk_reward", "ratio": 3.0}
            },
            "filters": [{"type": "volume_spike", "threshold": 1.5}],
            "risk_percent": 1.0
        });

        let strategy = StrategyLoader.load_document(&doc).unwrap();
        assert_eq!(strategy.name, "BOS Breakout Long");
        assert_eq!(strategy.entry.len(), 2);
        assert_eq!(strategy.filters.len(), 1);
        assert!(strategy.enabled);
        assert_eq!(strategy.stop_loss, SlConfig::Atr { multiplier: 1.5 });
    }

    #[test]
    fn unknown_condition_type_is_skipped_not_fatal() {
        let doc = json!({
            "name": "Has Unknown",
            "entry": {"conditions": [{"type": "price_above_ema", "period": 50}, {"type": "nonsense_type"}]}
        });
        let strategy = StrategyLoader.load_document(&doc).unwrap();
        assert_eq!(strategy.entry.len(), 1);
    }

    #[test]
    fn no_remaining_entry_conditions_disables_strategy() {
        let doc = json!({
            "name": "All Unknown",
            "entry": {"conditions": [{"type": "nonsense"}]}
        });
        let strategy = StrategyLoader.load_document(&doc).unwrap();
        assert!(!strategy.enabled);
    }
}
