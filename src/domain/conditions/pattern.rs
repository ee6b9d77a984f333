use crate::domain::conditions::context::EvaluationContext;
use crate::domain::conditions::price::CandleBias;
use crate::domain::conditions::result::{EvaluationResult, Verdict};
use crate::domain::market::candle::Candle;
use crate::domain::market::false_breakout::FbKind;

fn neutral(name: &str, details: &str) -> EvaluationResult {
    EvaluationResult::new(Verdict::Neutral, name, details)
}

fn within_lookback(ctx: &EvaluationContext, event_index: usize, lookback: usize) -> bool {
    ctx.current_bar.saturating_sub(event_index) <= lookback
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BosOccurred {
    pub direction: Option<CandleBias>,
    pub lookback: usize,
}

impl BosOccurred {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let hit = ctx.structure_breaks.iter().any(|b| {
            b.kind.is_bos()
                && within_lookback(ctx, b.break_index, self.lookback)
                && match self.direction {
                    Some(CandleBias::Bullish) => b.kind.is_bullish(),
                    Some(CandleBias::Bearish) => b.kind.is_bearish(),
                    None => true,
                }
        });
        let verdict = if hit { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "BOSOccurred", format!("lookback={}", self.lookback))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsbOccurred {
    pub direction: Option<CandleBias>,
    pub lookback: usize,
}

impl MsbOccurred {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let hit = ctx.structure_breaks.iter().any(|b| {
            b.kind.is_msb()
                && within_lookback(ctx, b.break_index, self.lookback)
                && match self.direction {
                    Some(CandleBias::Bullish) => b.kind.is_bullish(),
                    Some(CandleBias::Bearish) => b.kind.is_bearish(),
                    None => true,
                }
        });
        let verdict = if hit { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "MSBOccurred", format!("lookback={}", self.lookback))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InRange {
    pub min_touches: usize,
}

impl InRange {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(range) = ctx.current_range.as_ref() else {
            return neutral("InRange", "no active range");
        };
        let verdict = if range.is_active() && range.is_valid(self.min_touches) {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "InRange", format!("touches={}", range.total_touches()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct At75FibLevel {
    pub tolerance_pct: f64,
}

impl At75FibLevel {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(range), Some(last)) = (ctx.current_range.as_ref(), candles.last()) else {
            return neutral("At75FibLevel", "no active range");
        };
        let verdict = if range.at_75_level(last.close, self.tolerance_pct) {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "At75FibLevel", format!("fib_75={}", range.fib().fib_75()))
            .with_value("fib_75", range.fib().fib_75())
            .with_value("range_high", range.high)
            .with_value("range_low", range.low)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct At25FibLevel {
    pub tolerance_pct: f64,
}

impl At25FibLevel {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(range), Some(last)) = (ctx.current_range.as_ref(), candles.last()) else {
            return neutral("At25FibLevel", "no active range");
        };
        let verdict = if range.at_25_level(last.close, self.tolerance_pct) {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "At25FibLevel", format!("fib_25={}", range.fib().fib_25()))
            .with_value("fib_25", range.fib().fib_25())
            .with_value("range_high", range.high)
            .with_value("range_low", range.low)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FalseBreakoutOccurred {
    pub direction: Option<CandleBias>,
    pub lookback: usize,
}

impl FalseBreakoutOccurred {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let hit = ctx.false_breakouts.iter().any(|fb| {
            within_lookback(ctx, fb.reversal_index, self.lookback)
                && match self.direction {
                    // bullish reversal = false break below a support level
                    Some(CandleBias::Bullish) => fb.fb_kind == FbKind::Below,
                    Some(CandleBias::Bearish) => fb.fb_kind == FbKind::Above,
                    None => true,
                }
        });
        let verdict = if hit { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "FalseBreakoutOccurred", format!("lookback={}", self.lookback))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InUptrend;

impl InUptrend {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(s) = ctx.structure.as_ref() else {
            return neutral("InUptrend", "no structure snapshot");
        };
        let verdict = if s.is_uptrend() { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "InUptrend", "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InDowntrend;

impl InDowntrend {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(s) = ctx.structure.as_ref() else {
            return neutral("InDowntrend", "no structure snapshot");
        };
        let verdict = if s.is_downtrend() { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "InDowntrend", "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsRanging;

impl IsRanging {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(s) = ctx.structure.as_ref() else {
            return neutral("IsRanging", "no structure snapshot");
        };
        let verdict = if s.is_ranging() { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "IsRanging", "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetestOccurred {
    pub lookback: usize,
}

impl RetestOccurred {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let hit = ctx.structure_breaks.iter().any(|b| {
            b.retest_index
                .map(|idx| within_lookback(ctx, idx, self.lookback))
                .unwrap_or(false)
        });
        let verdict = if hit { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "RetestOccurred", format!("lookback={}", self.lookback))
    }
}
