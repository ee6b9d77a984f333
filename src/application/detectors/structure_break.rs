use crate::domain::market::candle::Candle;
use crate::domain::market::structure_break::{BreakKind, StructureBreak};
use crate::domain::market::swing::{Structure, SwingKind, SwingPoint};

#[derive(Debug, Clone, Copy)]
pub struct StructureBreakDetector {
    pub use_close: bool,
    pub confirmation_bars: usize,
    pub msb_window_bars: usize,
    pub msb_min_swings: usize,
}

impl Default for StructureBreakDetector {
    fn default() -> Self {
        Self {
            use_close: true,
            confirmation_bars: 1,
            msb_window_bars: 20,
            msb_min_swings: 2,
        }
    }
}

impl StructureBreakDetector {
    pub fn detect_bos(&self, candles: &[Candle], swings: &[SwingPoint]) -> Vec<StructureBreak> {
        self.detect(candles, swings).into_iter().filter(|b| b.kind.is_bos()).collect()
    }

    pub fn detect_msb(&self, candles: &[Candle], swings: &[SwingPoint]) -> Vec<StructureBreak> {
        self.detect(candles, swings).into_iter().filter(|b| b.kind.is_msb()).collect()
    }

    /// Each confirmed swing contributes at most one break attempt: the first
    /// bar past `confirmation_bars` that breaks the swing's level is
    /// evaluated once and, win or lose, the swing is never re-examined.
    fn detect(&self, candles: &[Candle], swings: &[SwingPoint]) -> Vec<StructureBreak> {
        let mut breaks = Vec::new();

        for swing in swings.iter() {
            let scan_start = swing.index + self.confirmation_bars;
            if scan_start >= candles.len() {
                continue;
            }

            let found = (scan_start..candles.len()).find_map(|i| {
                let bar = &candles[i];
                match swing.kind {
                    SwingKind::High => {
                        let break_price = if self.use_close { bar.close } else { bar.high };
                        (break_price > swing.price).then_some((i, break_price, bar.close))
                    }
                    SwingKind::Low => {
                        let break_price = if self.use_close { bar.close } else { bar.low };
                        (break_price < swing.price).then_some((i, break_price, bar.close))
                    }
                }
            });

            let Some((break_index, break_price, break_close)) = found else {
                continue;
            };

            let Some(most_recent) = swings.iter().filter(|s| s.index < break_index).next_back() else {
                continue;
            };

            let window_start = swing.index.saturating_sub(self.msb_window_bars);
            let opposite_count = |wants: &[Structure]| {
                swings
                    .iter()
                    .filter(|s| s.index >= window_start && s.index < break_index)
                    .filter(|s| s.structure.map(|st| wants.contains(&st)).unwrap_or(false))
                    .count()
            };

            let kind = match swing.kind {
                SwingKind::High => {
                    if matches!(most_recent.structure, Some(Structure::HigherHigh) | Some(Structure::HigherLow)) {
                        Some(BreakKind::BosBull)
                    } else if opposite_count(&[Structure::LowerHigh, Structure::LowerLow]) >= self.msb_min_swings {
                        Some(BreakKind::MsbBull)
                    } else {
                        None
                    }
                }
                SwingKind::Low => {
                    if matches!(most_recent.structure, Some(Structure::LowerHigh) | Some(Structure::LowerLow)) {
                        Some(BreakKind::BosBear)
                    } else if opposite_count(&[Structure::HigherHigh, Structure::HigherLow]) >= self.msb_min_swings {
                        Some(BreakKind::MsbBear)
                    } else {
                        None
                    }
                }
            };

            if let Some(kind) = kind {
                breaks.push(StructureBreak {
                    kind,
                    break_index,
                    break_price,
                    break_close,
                    swing_broken: *swing,
                    retest_index: None,
                    retest_price: None,
                });
            }
        }

        breaks
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetestDetector {
    pub max_retest_bars: usize,
    pub tolerance_pct: f64,
}

impl Default for RetestDetector {
    fn default() -> Self {
        Self { max_retest_bars: 20, tolerance_pct: 0.2 }
    }
}

impl RetestDetector {
    pub fn find_retest(&self, candles: &[Candle], structure_break: &StructureBreak) -> Option<(usize, f64)> {
        let level = structure_break.swing_broken.price;
        let tolerance = level.abs() * (self.tolerance_pct / 100.0);
        let scan_end = (structure_break.break_index + 1 + self.max_retest_bars).min(candles.len());

        for i in (structure_break.break_index + 1)..scan_end {
            let bar = &candles[i];
            let touched = if structure_break.kind.is_bullish() {
                (bar.low - level).abs() <= tolerance
            } else {
                (bar.high - level).abs() <= tolerance
            };
            if touched {
                let price = if structure_break.kind.is_bullish() { bar.low } else { bar.high };
                return Some((i, price));
            }
        }
        None
    }

    pub fn has_valid_retest(&self, candles: &[Candle], structure_break: &StructureBreak) -> bool {
        self.find_retest(candles, structure_break).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::detectors::swing::SwingDetector;

    fn bar(high: f64, low: f64, close: f64) -> Candle {
        Candle { timestamp_ms: 0, open: close, high, low, close, volume: 10.0 }
    }

    // Confirmed high at bar0 (100), a pullback confirms a low below it at bar1
    // (90), a second, higher high confirms at bar3 (150, classified HigherHigh
    // against bar0's 100), then bar5 closes above it (400) without printing a
    // new low of its own, so the HigherHigh swing itself stands as the most
    // recent swing ahead of the break.
    fn retrace_then_break_candles() -> Vec<Candle> {
        vec![
            bar(100.0, 100.0, 100.0),
            bar(95.0, 90.0, 92.0),
            bar(110.0, 92.0, 105.0),
            bar(150.0, 95.0, 98.0),
            bar(92.0, 88.0, 89.0),
            bar(500.0, 10.0, 400.0),
        ]
    }

    #[test]
    fn synthetic_uptrend_emits_bos_bull() {
        let candles = retrace_then_break_candles();
        let swings = SwingDetector::default().detect(&candles);
        let detector = StructureBreakDetector::default();
        let breaks = detector.detect_bos(&candles, &swings);
        assert!(breaks.iter().any(|b| b.kind == BreakKind::BosBull));
    }

    #[test]
    fn break_index_is_after_swing_index() {
        let candles = retrace_then_break_candles();
        let swings = SwingDetector::default().detect(&candles);
        let detector = StructureBreakDetector::default();
        for b in detector.detect_bos(&candles, &swings) {
            assert!(b.break_index > b.swing_broken.index);
        }
    }
}
