use crate::domain::market::swing::SwingPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakKind {
    BosBull,
    BosBear,
    MsbBull,
    MsbBear,
}

impl BreakKind {
    pub fn is_bullish(&self) -> bool {
        matches!(self, BreakKind::BosBull | BreakKind::MsbBull)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, BreakKind::BosBear | BreakKind::MsbBear)
    }

    pub fn is_bos(&self) -> bool {
        matches!(self, BreakKind::BosBull | BreakKind::BosBear)
    }

    pub fn is_msb(&self) -> bool {
        matches!(self, BreakKind::MsbBull | BreakKind::MsbBear)
    }
}

/// A classified break of a prior swing level.
///
/// Invariant: `break_index > swing_broken.index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureBreak {
    pub kind: BreakKind,
    pub break_index: usize,
    pub break_price: f64,
    pub break_close: f64,
    pub swing_broken: SwingPoint,
    pub retest_index: Option<usize>,
    pub retest_price: Option<f64>,
}
