//! Turns a satisfied entry into a concrete [`Signal`]: entry price, stop
//! loss, take profit, and position size.

use crate::application::context_builder::ContextBuilder;
use crate::application::indicators;
use crate::domain::market::candle::Candle;
use crate::domain::signal::{Signal, SignalKind};
use crate::domain::strategy::{Direction, SlConfig, Strategy, TpConfig};

pub struct SignalGenerator {
    strategies: Vec<Strategy>,
    context_builder: ContextBuilder,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self { strategies: Vec::new(), context_builder: ContextBuilder::default() }
    }
}

impl SignalGenerator {
    pub fn add_strategy(&mut self, strategy: Strategy) {
        self.strategies.push(strategy);
    }

    /// Only one signal per bar per strategy. Registration order determines
    /// tie-break precedence when a caller enforces `max_positions`.
    pub fn generate(&self, full_candles: &[Candle], bar_index: usize, account_balance: f64) -> Vec<Signal> {
        let prefix = &full_candles[..=bar_index];
        let atr14 = indicators::atr14(prefix);

        self.strategies
            .iter()
            .filter_map(|strategy| {
                let ctx = self.context_builder.build(full_candles, bar_index, strategy);
                if !strategy.entry_satisfied(prefix, &ctx) {
                    return None;
                }
                build_signal(strategy, prefix, &atr14, &ctx, bar_index, account_balance)
            })
            .collect()
    }
}

fn build_signal(
    strategy: &Strategy,
    prefix: &[Candle],
    atr14: &[f64],
    ctx: &crate::domain::conditions::EvaluationContext,
    bar_index: usize,
    account_balance: f64,
) -> Option<Signal> {
    let last = prefix.last()?;
    let entry_price = last.close;
    let kind = match strategy.direction {
        Direction::Short => SignalKind::Short,
        _ => SignalKind::Long,
    };

    let atr_last = atr14.last().copied().unwrap_or(0.0);
    let stop_loss = resolve_stop_loss(&strategy.stop_loss, entry_price, kind, atr_last, ctx);
    let take_profit = resolve_take_profit(&strategy.take_profit, entry_price, stop_loss, kind, atr_last);

    let denom = (entry_price - stop_loss).abs();
    if denom == 0.0 {
        return None;
    }

    let risk_amount = account_balance * strategy.risk_percent / 100.0;
    let position_size = risk_amount / denom;

    Some(Signal {
        kind,
        entry_price,
        stop_loss,
        take_profit,
        position_size,
        risk_amount,
        strategy_name: strategy.name.clone(),
        bar_index,
        timestamp_ms: last.timestamp_ms,
    })
}

fn resolve_stop_loss(
    config: &SlConfig,
    entry: f64,
    kind: SignalKind,
    atr_last: f64,
    ctx: &crate::domain::conditions::EvaluationContext,
) -> f64 {
    let sign = match kind {
        SignalKind::Long => -1.0,
        SignalKind::Short => 1.0,
    };
    match config {
        SlConfig::Atr { multiplier } => entry + sign * multiplier * atr_last,
        SlConfig::Percent { percent } => entry * (1.0 + sign * percent / 100.0),
        SlConfig::Fixed { value } => entry + sign * value,
        SlConfig::Level { price } => *price,
        SlConfig::Swing => {
            let opposite = match kind {
                SignalKind::Long => ctx.last_swing_low().map(|s| s.price),
                SignalKind::Short => ctx.last_swing_high().map(|s| s.price),
            };
            opposite.unwrap_or(entry + sign * 1.5 * atr_last)
        }
    }
}

fn resolve_take_profit(config: &TpConfig, entry: f64, stop_loss: f64, kind: SignalKind, atr_last: f64) -> f64 {
    let sign = match kind {
        SignalKind::Long => 1.0,
        SignalKind::Short => -1.0,
    };
    match config {
        TpConfig::RiskReward { ratio } => entry + sign * ratio * (entry - stop_loss).abs(),
        TpConfig::Atr { multiplier } => entry + sign * multiplier * atr_last,
        TpConfig::Percent { percent } => entry * (1.0 + sign * percent / 100.0),
        TpConfig::Fixed { value } => entry + sign * value,
        TpConfig::Level { price } => *price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conditions::price::PriceAbove;
    use crate::domain::conditions::{Condition, Level};
    use crate::domain::market::timeframe::Timeframe;

    fn bar(close: f64) -> Candle {
        Candle { timestamp_ms: 0, open: close, high: close + 1.0, low: close - 1.0, close, volume: 100.0 }
    }

    fn always_long_strategy() -> Strategy {
        Strategy {
            name: "always-long".into(),
            timeframe: Timeframe::OneHour,
            direction: Direction::Long,
            entry: vec![Condition::PriceAbove(PriceAbove { level: Level::Scalar(0.0) })],
            filters: vec![],
            stop_loss: SlConfig::Percent { percent: 1.0 },
            take_profit: TpConfig::RiskReward { ratio: 2.0 },
            risk_percent: 1.0,
            max_positions: 1,
            description: String::new(),
            enabled: true,
        }
    }

    #[test]
    fn generates_signal_with_risk_reward_take_profit() {
        let candles: Vec<_> = (0..20).map(|i| bar(100.0 + i as f64)).collect();
        let mut generator = SignalGenerator::default();
        generator.add_strategy(always_long_strategy());
        let signals = generator.generate(&candles, 19, 10_000.0);
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert!((s.stop_loss - s.entry_price * 0.99).abs() < 1e-9);
        let expected_tp = s.entry_price + 2.0 * (s.entry_price - s.stop_loss).abs();
        assert!((s.take_profit - expected_tp).abs() < 1e-6);
    }

    #[test]
    fn zero_denominator_yields_no_signal() {
        let mut strat = always_long_strategy();
        strat.stop_loss = SlConfig::Fixed { value: 0.0 };
        let candles: Vec<_> = (0..20).map(|i| bar(100.0 + i as f64)).collect();
        let mut generator = SignalGenerator::default();
        generator.add_strategy(strat);
        assert!(generator.generate(&candles, 19, 10_000.0).is_empty());
    }
}
