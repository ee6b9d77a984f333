use crate::domain::market::false_breakout::FalseBreakout;
use crate::domain::market::range::Range;
use crate::domain::market::structure_break::StructureBreak;
use crate::domain::market::structure_snapshot::StructureSnapshot;
use crate::domain::market::swing::SwingPoint;
use std::collections::HashMap;

/// The `level` parameter of a price condition: a literal, a lookup into the
/// context's named levels, or a small registry of pure derivations over the
/// analyzer's output (replaces the legacy "callable level" kwarg).
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    Scalar(f64),
    ContextKey(String),
    Computed(ComputedLevel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedLevel {
    LastSwingHigh,
    LastSwingLow,
    RangeMid,
    RangeHigh,
    RangeLow,
}

impl Level {
    pub fn resolve(&self, ctx: &EvaluationContext) -> Option<f64> {
        match self {
            Level::Scalar(v) => Some(*v),
            Level::ContextKey(key) => ctx.scalars.get(key).copied().or_else(|| ctx.named_levels.get(key).copied()),
            Level::Computed(c) => ctx.computed_level(*c),
        }
    }
}

/// Per-bar evaluation context: precomputed indicator series/scalars, named
/// levels, and the analyzer's current outputs. Built once per bar by a
/// context builder that knows which keys the active conditions need.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub series: HashMap<String, Vec<f64>>,
    pub scalars: HashMap<String, f64>,
    pub named_levels: HashMap<String, f64>,
    pub swings: Vec<SwingPoint>,
    pub structure: Option<StructureSnapshot>,
    pub current_range: Option<Range>,
    pub structure_breaks: Vec<StructureBreak>,
    pub false_breakouts: Vec<FalseBreakout>,
    pub current_bar: usize,
}

impl EvaluationContext {
    pub fn series_at(&self, key: &str, index: usize) -> Option<f64> {
        self.series.get(key).and_then(|s| s.get(index)).copied()
    }

    pub fn last_swing_high(&self) -> Option<&SwingPoint> {
        self.swings.iter().rev().find(|s| s.is_high())
    }

    pub fn last_swing_low(&self) -> Option<&SwingPoint> {
        self.swings.iter().rev().find(|s| s.is_low())
    }

    fn computed_level(&self, level: ComputedLevel) -> Option<f64> {
        match level {
            ComputedLevel::LastSwingHigh => self.last_swing_high().map(|s| s.price),
            ComputedLevel::LastSwingLow => self.last_swing_low().map(|s| s.price),
            ComputedLevel::RangeMid => self.current_range.as_ref().map(|r| r.midpoint()),
            ComputedLevel::RangeHigh => self.current_range.as_ref().map(|r| r.high),
            ComputedLevel::RangeLow => self.current_range.as_ref().map(|r| r.low),
        }
    }
}
