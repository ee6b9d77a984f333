use crate::domain::conditions::context::EvaluationContext;
use crate::domain::conditions::indicator::{
    AdxTrending, EmaAlignment, MacdCrossover, PriceAboveEma, PriceAboveVwap, PriceBelowEma, PriceBelowVwap, RsiLevel,
    VolumeSpikeCondition, VwapSlope,
};
use crate::domain::conditions::pattern::{
    At25FibLevel, At75FibLevel, BosOccurred, FalseBreakoutOccurred, InDowntrend, InRange, InUptrend, IsRanging,
    MsbOccurred, RetestOccurred,
};
use crate::domain::conditions::price::{
    CandleDirection, ConsecutiveCandles, PriceAbove, PriceBelow, PriceCrossedAbove, PriceCrossedBelow, PriceInRange,
    PriceNear,
};
use crate::domain::conditions::result::{EvaluationResult, Verdict};
use crate::domain::market::candle::Candle;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    All,
    Any,
}

/// Mutable per-instance state for a `Sequence` condition. Cloning a
/// `Condition` always yields fresh (reset) sequence state: the design note
/// on sequence state requires that no two strategies or parallel runs ever
/// share progress.
#[derive(Debug, Default)]
pub struct SequenceState {
    current_step: AtomicUsize,
    last_step_bar: AtomicI64,
}

impl Clone for SequenceState {
    fn clone(&self) -> Self {
        SequenceState::default()
    }
}

impl SequenceState {
    fn reset(&self) {
        self.current_step.store(0, Ordering::Relaxed);
        self.last_step_bar.store(-1, Ordering::Relaxed);
    }
}

/// The closed family of predicates and combinators. Kept as a sum type
/// rather than a trait-object tree so the compiler enforces exhaustive
/// matching over the whole catalog.
#[derive(Debug, Clone)]
pub enum Condition {
    PriceAbove(PriceAbove),
    PriceBelow(PriceBelow),
    PriceNear(PriceNear),
    PriceCrossedAbove(PriceCrossedAbove),
    PriceCrossedBelow(PriceCrossedBelow),
    PriceInRange(PriceInRange),
    CandleDirection(CandleDirection),
    ConsecutiveCandles(ConsecutiveCandles),

    BosOccurred(BosOccurred),
    MsbOccurred(MsbOccurred),
    InRange(InRange),
    At75FibLevel(At75FibLevel),
    At25FibLevel(At25FibLevel),
    FalseBreakoutOccurred(FalseBreakoutOccurred),
    InUptrend(InUptrend),
    InDowntrend(InDowntrend),
    IsRanging(IsRanging),
    RetestOccurred(RetestOccurred),

    EmaAlignment(EmaAlignment),
    PriceAboveEma(PriceAboveEma),
    PriceBelowEma(PriceBelowEma),
    RsiLevel(RsiLevel),
    VwapSlope(VwapSlope),
    PriceAboveVwap(PriceAboveVwap),
    PriceBelowVwap(PriceBelowVwap),
    VolumeSpike(VolumeSpikeCondition),
    AdxTrending(AdxTrending),
    MacdCrossover(MacdCrossover),

    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Group {
        conditions: Vec<Condition>,
        mode: GroupMode,
    },
    Sequence {
        conditions: Arc<Vec<Condition>>,
        max_bars_between: i64,
        state: SequenceState,
    },
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Condition {
        Condition::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    pub fn name(&self) -> String {
        match self {
            Condition::And(a, b) => format!("({} AND {})", a.name(), b.name()),
            Condition::Or(a, b) => format!("({} OR {})", a.name(), b.name()),
            Condition::Not(c) => format!("NOT({})", c.name()),
            Condition::Group { conditions, mode } => {
                let tag = match mode {
                    GroupMode::All => "ALL",
                    GroupMode::Any => "ANY",
                };
                format!("{tag}({})", conditions.iter().map(|c| c.name()).collect::<Vec<_>>().join(", "))
            }
            Condition::Sequence { conditions, .. } => {
                format!("SEQ({})", conditions.iter().map(|c| c.name()).collect::<Vec<_>>().join(" -> "))
            }
            other => other.leaf_name(),
        }
    }

    fn leaf_name(&self) -> String {
        // Every leaf variant's struct-level `evaluate` already stamps its own
        // name into the EvaluationResult; this is only used before the first
        // evaluation (e.g. when building a Group/Sequence's composite name).
        format!("{self:?}").split(['(', ' ']).next().unwrap_or("Condition").to_string()
    }

    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        match self {
            Condition::PriceAbove(c) => c.evaluate(candles, ctx),
            Condition::PriceBelow(c) => c.evaluate(candles, ctx),
            Condition::PriceNear(c) => c.evaluate(candles, ctx),
            Condition::PriceCrossedAbove(c) => c.evaluate(candles, ctx),
            Condition::PriceCrossedBelow(c) => c.evaluate(candles, ctx),
            Condition::PriceInRange(c) => c.evaluate(candles, ctx),
            Condition::CandleDirection(c) => c.evaluate(candles, ctx),
            Condition::ConsecutiveCandles(c) => c.evaluate(candles, ctx),

            Condition::BosOccurred(c) => c.evaluate(candles, ctx),
            Condition::MsbOccurred(c) => c.evaluate(candles, ctx),
            Condition::InRange(c) => c.evaluate(candles, ctx),
            Condition::At75FibLevel(c) => c.evaluate(candles, ctx),
            Condition::At25FibLevel(c) => c.evaluate(candles, ctx),
            Condition::FalseBreakoutOccurred(c) => c.evaluate(candles, ctx),
            Condition::InUptrend(c) => c.evaluate(candles, ctx),
            Condition::InDowntrend(c) => c.evaluate(candles, ctx),
            Condition::IsRanging(c) => c.evaluate(candles, ctx),
            Condition::RetestOccurred(c) => c.evaluate(candles, ctx),

            Condition::EmaAlignment(c) => c.evaluate(candles, ctx),
            Condition::PriceAboveEma(c) => c.evaluate(candles, ctx),
            Condition::PriceBelowEma(c) => c.evaluate(candles, ctx),
            Condition::RsiLevel(c) => c.evaluate(candles, ctx),
            Condition::VwapSlope(c) => c.evaluate(candles, ctx),
            Condition::PriceAboveVwap(c) => c.evaluate(candles, ctx),
            Condition::PriceBelowVwap(c) => c.evaluate(candles, ctx),
            Condition::VolumeSpike(c) => c.evaluate(candles, ctx),
            Condition::AdxTrending(c) => c.evaluate(candles, ctx),
            Condition::MacdCrossover(c) => c.evaluate(candles, ctx),

            Condition::And(a, b) => Self::eval_and(a, b, candles, ctx),
            Condition::Or(a, b) => Self::eval_or(a, b, candles, ctx),
            Condition::Not(c) => Self::eval_not(c, candles, ctx),
            Condition::Group { conditions, mode } => Self::eval_group(conditions, *mode, candles, ctx),
            Condition::Sequence {
                conditions,
                max_bars_between,
                state,
            } => Self::eval_sequence(conditions, *max_bars_between, state, candles, ctx),
        }
    }

    fn eval_and(a: &Condition, b: &Condition, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let ra = a.evaluate(candles, ctx);
        let rb = b.evaluate(candles, ctx);
        let name = format!("({} AND {})", ra.condition_name, rb.condition_name);
        if ra.verdict.is_false() || rb.verdict.is_false() {
            let failed = if ra.verdict.is_false() { &ra } else { &rb };
            EvaluationResult::new(Verdict::False, name, format!("failed: {}", failed.details))
        } else if ra.verdict.is_true() && rb.verdict.is_true() {
            EvaluationResult::new(Verdict::True, name, "both conditions met")
        } else {
            EvaluationResult::new(Verdict::Neutral, name, "one or more conditions neutral")
        }
    }

    fn eval_or(a: &Condition, b: &Condition, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let ra = a.evaluate(candles, ctx);
        let rb = b.evaluate(candles, ctx);
        let name = format!("({} OR {})", ra.condition_name, rb.condition_name);
        if ra.verdict.is_true() || rb.verdict.is_true() {
            EvaluationResult::new(Verdict::True, name, "passed")
        } else if ra.verdict.is_false() && rb.verdict.is_false() {
            EvaluationResult::new(Verdict::False, name, "both conditions failed")
        } else {
            EvaluationResult::new(Verdict::Neutral, name, "neither condition met, one neutral")
        }
    }

    fn eval_not(c: &Condition, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let r = c.evaluate(candles, ctx);
        let name = format!("NOT({})", r.condition_name);
        match r.verdict {
            Verdict::True => EvaluationResult::new(Verdict::False, name, "inverted from true"),
            Verdict::False => EvaluationResult::new(Verdict::True, name, "inverted from false"),
            Verdict::Neutral => EvaluationResult::new(Verdict::Neutral, name, "neutral unchanged"),
        }
    }

    fn eval_group(conditions: &[Condition], mode: GroupMode, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let results: Vec<_> = conditions.iter().map(|c| c.evaluate(candles, ctx)).collect();
        let name = format!(
            "{}({})",
            if mode == GroupMode::All { "ALL" } else { "ANY" },
            results.iter().map(|r| r.condition_name.clone()).collect::<Vec<_>>().join(", ")
        );
        match mode {
            GroupMode::All => {
                if results.iter().all(|r| r.verdict.is_true()) {
                    EvaluationResult::new(Verdict::True, name, "all conditions met")
                } else if let Some(failed) = results.iter().find(|r| r.verdict.is_false()) {
                    EvaluationResult::new(Verdict::False, name, format!("failed: {}", failed.condition_name))
                } else {
                    EvaluationResult::new(Verdict::Neutral, name, "some conditions neutral")
                }
            }
            GroupMode::Any => {
                if let Some(passed) = results.iter().find(|r| r.verdict.is_true()) {
                    EvaluationResult::new(Verdict::True, name, format!("passed: {}", passed.condition_name))
                } else if results.iter().all(|r| r.verdict.is_false()) {
                    EvaluationResult::new(Verdict::False, name, "all conditions failed")
                } else {
                    EvaluationResult::new(Verdict::Neutral, name, "no condition met yet")
                }
            }
        }
    }

    fn eval_sequence(
        conditions: &[Condition],
        max_bars_between: i64,
        state: &SequenceState,
        candles: &[Candle],
        ctx: &EvaluationContext,
    ) -> EvaluationResult {
        let name = format!("SEQ({})", conditions.iter().map(|c| c.name()).collect::<Vec<_>>().join(" -> "));
        let current_bar = ctx.current_bar as i64;

        let last_step_bar = state.last_step_bar.load(Ordering::Relaxed);
        if last_step_bar >= 0 && current_bar - last_step_bar > max_bars_between {
            state.reset();
        }

        let step = state.current_step.load(Ordering::Relaxed);
        let result = conditions[step].evaluate(candles, ctx);

        if result.verdict.is_true() {
            state.last_step_bar.store(current_bar, Ordering::Relaxed);
            let next_step = step + 1;
            if next_step >= conditions.len() {
                state.reset();
                return EvaluationResult::new(Verdict::True, name, "sequence complete");
            }
            state.current_step.store(next_step, Ordering::Relaxed);
            return EvaluationResult::new(Verdict::Neutral, name, format!("step {next_step}/{} complete", conditions.len()));
        }

        EvaluationResult::new(Verdict::Neutral, name, format!("waiting for step {}", step + 1))
    }
}
