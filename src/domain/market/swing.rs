use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// HH/HL/LH/LL classification against the previous swing of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Structure {
    HigherHigh,
    HigherLow,
    LowerHigh,
    LowerLow,
}

/// A confirmed swing point. Immutable once appended to a detector's output.
///
/// Invariant: `index < confirmed_at_index`; `structure` is `None` only when
/// no prior swing of the same kind exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
    pub confirmed_at_index: usize,
    pub structure: Option<Structure>,
}

impl SwingPoint {
    pub fn is_high(&self) -> bool {
        self.kind == SwingKind::High
    }

    pub fn is_low(&self) -> bool {
        self.kind == SwingKind::Low
    }
}
