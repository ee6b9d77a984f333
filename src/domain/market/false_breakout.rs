use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FbKind {
    Above,
    Below,
}

/// A wick beyond a key level followed by a close back inside within a small
/// window. A liquidity sweep is the same shape produced with tighter
/// detector defaults, not a distinct type.
///
/// Invariants: for `Above`, `extreme_price > level_price` and
/// `reversal_close <= level_price`; symmetric for `Below`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalseBreakout {
    pub fb_kind: FbKind,
    pub level_price: f64,
    pub break_index: usize,
    pub extreme_price: f64,
    pub reversal_index: usize,
    pub reversal_close: f64,
    pub wick_size: f64,
    pub volume_spike: bool,
}
