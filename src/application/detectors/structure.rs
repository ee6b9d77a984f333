use crate::domain::market::structure_snapshot::{Regime, StructureSnapshot};
use crate::domain::market::swing::{Structure, SwingPoint};

/// Classifies the current regime over the last <= 6 swings.
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    pub fn analyze(swings: &[SwingPoint]) -> StructureSnapshot {
        let recent = if swings.len() >= 6 { &swings[swings.len() - 6..] } else { swings };

        let hh_count = recent.iter().filter(|s| s.structure == Some(Structure::HigherHigh)).count();
        let hl_count = recent.iter().filter(|s| s.structure == Some(Structure::HigherLow)).count();
        let lh_count = recent.iter().filter(|s| s.structure == Some(Structure::LowerHigh)).count();
        let ll_count = recent.iter().filter(|s| s.structure == Some(Structure::LowerLow)).count();

        let regime = if hh_count >= 1 && hl_count >= 1 {
            Some(Regime::Uptrend)
        } else if lh_count >= 1 && ll_count >= 1 {
            Some(Regime::Downtrend)
        } else {
            Some(Regime::Ranging)
        };

        let highs: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_high()).collect();
        let lows: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_low()).collect();

        StructureSnapshot {
            regime,
            hh_count,
            hl_count,
            lh_count,
            ll_count,
            last_swing_high: highs.last().map(|s| s.price),
            last_swing_low: lows.last().map(|s| s.price),
            prev_swing_high: if highs.len() > 1 { Some(highs[highs.len() - 2].price) } else { None },
            prev_swing_low: if lows.len() > 1 { Some(lows[lows.len() - 2].price) } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::swing::SwingKind;

    fn swing(index: usize, price: f64, kind: SwingKind, structure: Option<Structure>) -> SwingPoint {
        SwingPoint { index, price, kind, confirmed_at_index: index + 1, structure }
    }

    #[test]
    fn uptrend_requires_hh_and_hl() {
        let swings = vec![
            swing(0, 100.0, SwingKind::Low, None),
            swing(1, 110.0, SwingKind::High, None),
            swing(2, 105.0, SwingKind::Low, Some(Structure::HigherLow)),
            swing(3, 120.0, SwingKind::High, Some(Structure::HigherHigh)),
        ];
        let snap = StructureAnalyzer::analyze(&swings);
        assert!(snap.is_uptrend());
    }

    #[test]
    fn no_structural_markers_is_ranging() {
        let swings = vec![swing(0, 100.0, SwingKind::Low, None), swing(1, 110.0, SwingKind::High, None)];
        let snap = StructureAnalyzer::analyze(&swings);
        assert!(snap.is_ranging());
    }
}
