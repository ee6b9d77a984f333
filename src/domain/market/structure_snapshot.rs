use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Uptrend,
    Downtrend,
    Ranging,
}

/// Regime classification over the last <= 6 swings, plus the counts and key
/// levels that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StructureSnapshot {
    pub regime: Option<Regime>,
    pub hh_count: usize,
    pub hl_count: usize,
    pub lh_count: usize,
    pub ll_count: usize,
    pub last_swing_high: Option<f64>,
    pub last_swing_low: Option<f64>,
    pub prev_swing_high: Option<f64>,
    pub prev_swing_low: Option<f64>,
}

impl StructureSnapshot {
    pub fn is_uptrend(&self) -> bool {
        self.regime == Some(Regime::Uptrend)
    }

    pub fn is_downtrend(&self) -> bool {
        self.regime == Some(Regime::Downtrend)
    }

    pub fn is_ranging(&self) -> bool {
        self.regime == Some(Regime::Ranging)
    }
}
