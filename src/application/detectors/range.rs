use crate::domain::market::candle::Candle;
use crate::domain::market::range::{Range, RangeStatus};
use crate::domain::market::swing::SwingPoint;

#[derive(Debug, Clone, Copy)]
pub struct RangeDetector {
    pub touch_tolerance_pct: f64,
    pub min_touches: usize,
    pub min_range_bars: usize,
    pub max_range_bars: usize,
}

impl Default for RangeDetector {
    fn default() -> Self {
        Self {
            touch_tolerance_pct: 0.3,
            min_touches: 3,
            min_range_bars: 10,
            max_range_bars: 100,
        }
    }
}

impl RangeDetector {
    pub fn detect(&self, candles: &[Candle], swings: &[SwingPoint]) -> Vec<Range> {
        let mut ranges = Vec::new();
        let lows: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_low()).collect();

        for (i, swing) in swings.iter().enumerate() {
            if i + 1 >= swings.len() {
                break;
            }
            if !swing.is_high() {
                continue;
            }
            if let Some(low_swing) = lows.iter().find(|l| l.index > swing.index) {
                if let Some(range) = self.create_range(candles, swing, low_swing) {
                    if range.is_valid(self.min_touches) {
                        ranges.push(range);
                    }
                }
            }
        }
        ranges
    }

    /// The latest range with `status in {Forming, Confirmed}`.
    pub fn current(&self, candles: &[Candle], swings: &[SwingPoint]) -> Option<Range> {
        self.detect(candles, swings).into_iter().filter(|r| r.is_active()).last()
    }

    fn create_range(&self, candles: &[Candle], high_swing: &SwingPoint, low_swing: &SwingPoint) -> Option<Range> {
        let start_index = high_swing.index.min(low_swing.index);
        let end_index = high_swing.index.max(low_swing.index);

        if end_index - start_index < self.min_range_bars {
            return None;
        }

        let high = high_swing.price;
        let low = low_swing.price;
        let height = high - low;
        let tolerance = height * (self.touch_tolerance_pct / 100.0);

        let mut high_touches = 0usize;
        let mut low_touches = 0usize;

        let scan_end = (end_index + self.max_range_bars).min(candles.len());
        for i in end_index..scan_end {
            let bar = &candles[i];
            if bar.high >= high - tolerance {
                high_touches += 1;
            }
            if bar.low <= low + tolerance {
                low_touches += 1;
            }
            if bar.high > high + tolerance {
                return Some(Range {
                    high,
                    low,
                    start_index,
                    end_index: Some(i),
                    high_touches,
                    low_touches,
                    status: RangeStatus::BrokenUp,
                    high_swing: *high_swing,
                    low_swing: *low_swing,
                });
            }
            if bar.low < low - tolerance {
                return Some(Range {
                    high,
                    low,
                    start_index,
                    end_index: Some(i),
                    high_touches,
                    low_touches,
                    status: RangeStatus::BrokenDown,
                    high_swing: *high_swing,
                    low_swing: *low_swing,
                });
            }
        }

        let status = if high_touches + low_touches >= self.min_touches {
            RangeStatus::Confirmed
        } else {
            RangeStatus::Forming
        };

        Some(Range {
            high,
            low,
            start_index,
            end_index: Some(candles.len().saturating_sub(1)),
            high_touches,
            low_touches,
            status,
            high_swing: *high_swing,
            low_swing: *low_swing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::swing::SwingKind;

    fn bar(high: f64, low: f64) -> Candle {
        Candle { timestamp_ms: 0, open: low, high, low, close: (high + low) / 2.0, volume: 10.0 }
    }

    fn swing(index: usize, price: f64, kind: SwingKind) -> SwingPoint {
        SwingPoint { index, price, kind, confirmed_at_index: index + 1, structure: None }
    }

    #[test]
    fn requires_minimum_bars_between_swings() {
        let candles: Vec<_> = (0..5).map(|_| bar(120.0, 100.0)).collect();
        let swings = vec![swing(0, 120.0, SwingKind::High), swing(2, 100.0, SwingKind::Low)];
        let detector = RangeDetector::default();
        assert!(detector.detect(&candles, &swings).is_empty());
    }

    #[test]
    fn confirms_range_with_enough_touches() {
        let candles: Vec<_> = (0..40).map(|_| bar(119.9, 100.1)).collect();
        let swings = vec![swing(0, 120.0, SwingKind::High), swing(15, 100.0, SwingKind::Low)];
        let detector = RangeDetector { touch_tolerance_pct: 1.0, min_touches: 3, min_range_bars: 10, max_range_bars: 100 };
        let ranges = detector.detect(&candles, &swings);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].status, RangeStatus::Confirmed);
    }

    #[test]
    fn breaks_above_high_plus_tolerance() {
        let mut candles: Vec<_> = (0..20).map(|_| bar(119.9, 100.1)).collect();
        candles.push(bar(125.0, 122.0));
        let swings = vec![swing(0, 120.0, SwingKind::High), swing(15, 100.0, SwingKind::Low)];
        let detector = RangeDetector { touch_tolerance_pct: 1.0, min_touches: 3, min_range_bars: 10, max_range_bars: 100 };
        let ranges = detector.detect(&candles, &swings);
        assert_eq!(ranges[0].status, RangeStatus::BrokenUp);
    }
}
