use crate::domain::market::candle::Candle;
use crate::domain::market::false_breakout::{FalseBreakout, FbKind};
use crate::domain::market::range::Range;
use crate::domain::market::swing::SwingPoint;

#[derive(Debug, Clone, Copy)]
pub struct FalseBreakoutDetector {
    pub min_wick_atr_mult: f64,
    pub volume_spike_required: bool,
    pub volume_spike_mult: f64,
    pub volume_lookback: usize,
    pub max_break_bars: usize,
}

impl Default for FalseBreakoutDetector {
    fn default() -> Self {
        Self {
            min_wick_atr_mult: 0.3,
            volume_spike_required: false,
            volume_spike_mult: 1.5,
            volume_lookback: 20,
            max_break_bars: 5,
        }
    }
}

impl FalseBreakoutDetector {
    /// Same detector, tighter defaults: a stricter wick threshold and a
    /// required volume spike.
    pub fn liquidity_sweep() -> Self {
        Self {
            min_wick_atr_mult: 0.5,
            volume_spike_required: true,
            ..Self::default()
        }
    }

    pub fn detect_at_swing_levels(
        &self,
        candles: &[Candle],
        swings: &[SwingPoint],
        atr: &[f64],
        volume_avg: &[f64],
    ) -> Vec<FalseBreakout> {
        swings
            .iter()
            .filter_map(|s| {
                let kind = if s.is_high() { FbKind::Above } else { FbKind::Below };
                self.detect_at_level(candles, atr, volume_avg, s.price, kind, s.confirmed_at_index)
            })
            .collect()
    }

    pub fn detect_at_range_levels(&self, candles: &[Candle], ranges: &[Range], atr: &[f64], volume_avg: &[f64]) -> Vec<FalseBreakout> {
        ranges
            .iter()
            .flat_map(|r| {
                let start = r.end_index.unwrap_or(r.start_index) + 1;
                [
                    self.detect_at_level(candles, atr, volume_avg, r.high, FbKind::Above, start),
                    self.detect_at_level(candles, atr, volume_avg, r.low, FbKind::Below, start),
                ]
            })
            .flatten()
            .collect()
    }

    /// Per spec.md Open Question 1: an out-of-range ATR index at
    /// `break_index` skips the candidate rather than comparing against a
    /// stale or garbage wick threshold.
    pub fn detect_at_level(
        &self,
        candles: &[Candle],
        atr: &[f64],
        volume_avg: &[f64],
        level: f64,
        kind: FbKind,
        start_idx: usize,
    ) -> Option<FalseBreakout> {
        if start_idx >= candles.len() {
            return None;
        }

        for i in start_idx..candles.len() {
            let bar = &candles[i];
            let breached = match kind {
                FbKind::Above => bar.high > level,
                FbKind::Below => bar.low < level,
            };
            if !breached {
                continue;
            }

            let same_bar_reject = match kind {
                FbKind::Above => bar.close <= level,
                FbKind::Below => bar.close >= level,
            };

            if same_bar_reject {
                let extreme = match kind {
                    FbKind::Above => bar.high,
                    FbKind::Below => bar.low,
                };
                return self.build(candles, atr, volume_avg, level, kind, i, i, extreme, bar.close);
            }

            let scan_end = (i + 1 + self.max_break_bars).min(candles.len());
            if let Some(j) = (i + 1..scan_end).find(|&j| match kind {
                FbKind::Above => candles[j].close <= level,
                FbKind::Below => candles[j].close >= level,
            }) {
                let extreme = match kind {
                    FbKind::Above => candles[i..=j].iter().map(|c| c.high).fold(f64::MIN, f64::max),
                    FbKind::Below => candles[i..=j].iter().map(|c| c.low).fold(f64::MAX, f64::min),
                };
                return self.build(candles, atr, volume_avg, level, kind, i, j, extreme, candles[j].close);
            }

            // breached but never closed back inside within the window: not a false breakout.
            return None;
        }
        None
    }

    fn build(
        &self,
        candles: &[Candle],
        atr: &[f64],
        volume_avg: &[f64],
        level: f64,
        kind: FbKind,
        break_index: usize,
        reversal_index: usize,
        extreme_price: f64,
        reversal_close: f64,
    ) -> Option<FalseBreakout> {
        let atr_at_break = *atr.get(break_index)?;
        let wick_size = match kind {
            FbKind::Above => extreme_price - level,
            FbKind::Below => level - extreme_price,
        };
        if wick_size < self.min_wick_atr_mult * atr_at_break {
            return None;
        }

        // Requires at least `volume_lookback` prior bars per spec.md 4.5.
        let volume_spike = reversal_index >= self.volume_lookback
            && volume_avg
                .get(reversal_index)
                .zip(candles.get(reversal_index))
                .is_some_and(|(avg, bar)| bar.volume >= self.volume_spike_mult * avg);

        if self.volume_spike_required && !volume_spike {
            return None;
        }

        Some(FalseBreakout {
            fb_kind: kind,
            level_price: level,
            break_index,
            extreme_price,
            reversal_index,
            reversal_close,
            wick_size,
            volume_spike,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, low: f64, close: f64) -> Candle {
        Candle { timestamp_ms: 0, open: close, high, low, close, volume: 10.0 }
    }

    #[test]
    fn false_breakout_below_swing_low() {
        // SwingLow at 100; next bar low=99, close=100.5; ATR at that bar is 1.0
        let candles = vec![bar(101.0, 100.0, 100.5), bar(100.6, 99.0, 100.5)];
        let atr = vec![1.0, 1.0];
        let volume_avg = vec![10.0, 10.0];
        let detector = FalseBreakoutDetector::default();
        let fb = detector.detect_at_level(&candles, &atr, &volume_avg, 100.0, FbKind::Below, 1).unwrap();
        assert_eq!(fb.fb_kind, FbKind::Below);
        assert!((fb.wick_size - 1.0).abs() < 1e-9);
        assert!(!fb.volume_spike);
    }

    #[test]
    fn out_of_range_atr_index_is_skipped_not_panicking() {
        let candles = vec![bar(101.0, 100.0, 100.5), bar(100.6, 99.0, 100.5)];
        let atr: Vec<f64> = vec![]; // break_index out of range
        let volume_avg = vec![10.0, 10.0];
        let detector = FalseBreakoutDetector::default();
        assert!(detector.detect_at_level(&candles, &atr, &volume_avg, 100.0, FbKind::Below, 1).is_none());
    }

    #[test]
    fn wick_below_threshold_is_rejected() {
        let candles = vec![bar(101.0, 100.0, 100.5), bar(100.6, 99.9, 100.5)];
        let atr = vec![10.0, 10.0]; // large ATR makes the 0.1 wick too small
        let volume_avg = vec![10.0, 10.0];
        let detector = FalseBreakoutDetector::default();
        assert!(detector.detect_at_level(&candles, &atr, &volume_avg, 100.0, FbKind::Below, 1).is_none());
    }
}
