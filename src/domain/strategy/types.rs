use crate::domain::conditions::Condition;
use crate::domain::market::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlConfig {
    Atr { multiplier: f64 },
    Percent { percent: f64 },
    Fixed { value: f64 },
    /// Most recent opposite swing; falls back to `Atr { multiplier: 1.5 }`
    /// when no such swing exists.
    Swing,
    Level { price: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TpConfig {
    RiskReward { ratio: f64 },
    Atr { multiplier: f64 },
    Percent { percent: f64 },
    Fixed { value: f64 },
    Level { price: f64 },
}

/// A loaded, immutable strategy. Entry is a conjunction of `entry`
/// conditions; `filters` is a disjunction (empty means "no filter gate").
///
/// Invariants: `risk_percent > 0`, `max_positions >= 1`.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: String,
    pub timeframe: Timeframe,
    pub direction: Direction,
    pub entry: Vec<Condition>,
    pub filters: Vec<Condition>,
    pub stop_loss: SlConfig,
    pub take_profit: TpConfig,
    pub risk_percent: f64,
    pub max_positions: usize,
    pub description: String,
    pub enabled: bool,
}

impl Strategy {
    /// Entry is satisfied when every entry condition is `True` and (there are
    /// no filters, or any filter is `True`).
    pub fn entry_satisfied(
        &self,
        candles: &[crate::domain::market::candle::Candle],
        ctx: &crate::domain::conditions::EvaluationContext,
    ) -> bool {
        if !self.enabled || self.entry.is_empty() {
            return false;
        }
        let entries_pass = self.entry.iter().all(|c| c.evaluate(candles, ctx).as_bool());
        if !entries_pass {
            return false;
        }
        self.filters.is_empty() || self.filters.iter().any(|c| c.evaluate(candles, ctx).as_bool())
    }
}
