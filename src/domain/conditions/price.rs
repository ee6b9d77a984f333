use crate::domain::conditions::context::{EvaluationContext, Level};
use crate::domain::conditions::result::{EvaluationResult, Verdict};
use crate::domain::market::candle::Candle;

fn neutral(name: &str, details: &str) -> EvaluationResult {
    EvaluationResult::new(Verdict::Neutral, name, details)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceAbove {
    pub level: Level,
}

impl PriceAbove {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(last) = candles.last() else {
            return neutral("PriceAbove", "no candles");
        };
        let Some(level) = self.level.resolve(ctx) else {
            return neutral("PriceAbove", "level unresolved");
        };
        let verdict = if last.close > level { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceAbove", format!("close={} level={}", last.close, level))
            .with_value("close", last.close)
            .with_value("level", level)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBelow {
    pub level: Level,
}

impl PriceBelow {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(last) = candles.last() else {
            return neutral("PriceBelow", "no candles");
        };
        let Some(level) = self.level.resolve(ctx) else {
            return neutral("PriceBelow", "level unresolved");
        };
        let verdict = if last.close < level { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceBelow", format!("close={} level={}", last.close, level))
            .with_value("close", last.close)
            .with_value("level", level)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceNear {
    pub level: Level,
    pub tolerance_pct: f64,
}

impl PriceNear {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(last) = candles.last() else {
            return neutral("PriceNear", "no candles");
        };
        let Some(level) = self.level.resolve(ctx) else {
            return neutral("PriceNear", "level unresolved");
        };
        let tolerance = level.abs() * (self.tolerance_pct / 100.0);
        let verdict = if (last.close - level).abs() <= tolerance {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "PriceNear", format!("close={} level={}", last.close, level))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCrossedAbove {
    pub level: Level,
}

impl PriceCrossedAbove {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        if candles.len() < 2 {
            return neutral("PriceCrossedAbove", "fewer than 2 bars");
        }
        let Some(level) = self.level.resolve(ctx) else {
            return neutral("PriceCrossedAbove", "level unresolved");
        };
        let prev = candles[candles.len() - 2].close;
        let curr = candles[candles.len() - 1].close;
        let verdict = if prev <= level && curr > level { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceCrossedAbove", format!("prev={prev} curr={curr} level={level}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCrossedBelow {
    pub level: Level,
}

impl PriceCrossedBelow {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        if candles.len() < 2 {
            return neutral("PriceCrossedBelow", "fewer than 2 bars");
        }
        let Some(level) = self.level.resolve(ctx) else {
            return neutral("PriceCrossedBelow", "level unresolved");
        };
        let prev = candles[candles.len() - 2].close;
        let curr = candles[candles.len() - 1].close;
        let verdict = if prev >= level && curr < level { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceCrossedBelow", format!("prev={prev} curr={curr} level={level}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceInRange {
    pub low: f64,
    pub high: f64,
}

impl PriceInRange {
    pub fn evaluate(&self, candles: &[Candle], _ctx: &EvaluationContext) -> EvaluationResult {
        let Some(last) = candles.last() else {
            return neutral("PriceInRange", "no candles");
        };
        let verdict = if last.close >= self.low && last.close <= self.high {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "PriceInRange", format!("close={}", last.close))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleBias {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleDirection {
    pub direction: CandleBias,
}

impl CandleDirection {
    pub fn evaluate(&self, candles: &[Candle], _ctx: &EvaluationContext) -> EvaluationResult {
        let Some(last) = candles.last() else {
            return neutral("CandleDirection", "no candles");
        };
        let is_bullish = last.close > last.open;
        let matches = match self.direction {
            CandleBias::Bullish => is_bullish,
            CandleBias::Bearish => !is_bullish && last.close < last.open,
        };
        let verdict = if matches { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "CandleDirection", format!("open={} close={}", last.open, last.close))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsecutiveCandles {
    pub direction: CandleBias,
    pub count: usize,
}

impl ConsecutiveCandles {
    pub fn evaluate(&self, candles: &[Candle], _ctx: &EvaluationContext) -> EvaluationResult {
        if self.count == 0 || candles.len() < self.count {
            return neutral("ConsecutiveCandles", "not enough bars");
        }
        let window = &candles[candles.len() - self.count..];
        let all_match = window.iter().all(|c| match self.direction {
            CandleBias::Bullish => c.close > c.open,
            CandleBias::Bearish => c.close < c.open,
        });
        let verdict = if all_match { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "ConsecutiveCandles", format!("count={}", self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, close: f64) -> Candle {
        Candle {
            timestamp_ms: 0,
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn price_above_true_above_level() {
        let candles = vec![bar(99.0, 101.0)];
        let ctx = EvaluationContext::default();
        let cond = PriceAbove { level: Level::Scalar(100.0) };
        assert_eq!(cond.evaluate(&candles, &ctx).verdict, Verdict::True);
    }

    #[test]
    fn price_above_neutral_when_level_missing() {
        let candles = vec![bar(99.0, 101.0)];
        let ctx = EvaluationContext::default();
        let cond = PriceAbove { level: Level::ContextKey("missing".into()) };
        assert_eq!(cond.evaluate(&candles, &ctx).verdict, Verdict::Neutral);
    }

    #[test]
    fn crossed_above_requires_prev_at_or_below() {
        let candles = vec![bar(98.0, 99.0), bar(99.0, 101.0)];
        let ctx = EvaluationContext::default();
        let cond = PriceCrossedAbove { level: Level::Scalar(100.0) };
        assert_eq!(cond.evaluate(&candles, &ctx).verdict, Verdict::True);
    }

    #[test]
    fn consecutive_candles_all_bullish() {
        let candles = vec![bar(1.0, 2.0), bar(2.0, 3.0), bar(3.0, 4.0)];
        let ctx = EvaluationContext::default();
        let cond = ConsecutiveCandles { direction: CandleBias::Bullish, count: 3 };
        assert_eq!(cond.evaluate(&candles, &ctx).verdict, Verdict::True);
    }
}
