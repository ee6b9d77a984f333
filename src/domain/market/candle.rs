use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. All price arithmetic in this crate is double-precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered, validated sequence of bars with strictly increasing timestamps.
#[derive(Debug, Clone, Default)]
pub struct CandleTable {
    bars: Vec<Candle>,
}

impl CandleTable {
    /// Builds a table, enforcing the monotonic-timestamp and `high >= low`
    /// invariants up front. Fails fast per the input-validation error category.
    pub fn new(bars: Vec<Candle>) -> Result<Self, ValidationError> {
        if bars.is_empty() {
            return Err(ValidationError::EmptyCandles);
        }
        for (i, bar) in bars.iter().enumerate() {
            if bar.high < bar.low {
                return Err(ValidationError::InvertedBar {
                    index: i,
                    high: bar.high,
                    low: bar.low,
                });
            }
            if i > 0 && bar.timestamp_ms <= bars[i - 1].timestamp_ms {
                return Err(ValidationError::NonMonotonicTimestamps {
                    index: i,
                    timestamp: bar.timestamp_ms,
                    previous: bars[i - 1].timestamp_ms,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.bars.get(index)
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.bars
    }

    /// A prefix of the table up to and including bar `i`. All analyzer
    /// operations accept such a prefix.
    pub fn prefix(&self, up_to_inclusive: usize) -> &[Candle] {
        let end = (up_to_inclusive + 1).min(self.bars.len());
        &self.bars[..end]
    }

    pub fn require_min_bars(&self, required: usize) -> Result<(), ValidationError> {
        if self.bars.len() < required {
            return Err(ValidationError::InsufficientBars {
                required,
                available: self.bars.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, h: f64, l: f64) -> Candle {
        Candle {
            timestamp_ms: ts,
            open: l,
            high: h,
            low: l,
            close: (h + l) / 2.0,
            volume: 100.0,
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            CandleTable::new(vec![]),
            Err(ValidationError::EmptyCandles)
        ));
    }

    #[test]
    fn rejects_non_monotonic_timestamps() {
        let bars = vec![bar(1000, 10.0, 9.0), bar(1000, 11.0, 9.5)];
        assert!(matches!(
            CandleTable::new(bars),
            Err(ValidationError::NonMonotonicTimestamps { .. })
        ));
    }

    #[test]
    fn rejects_inverted_bar() {
        let bars = vec![bar(1000, 9.0, 10.0)];
        assert!(matches!(
            CandleTable::new(bars),
            Err(ValidationError::InvertedBar { .. })
        ));
    }

    #[test]
    fn prefix_is_inclusive() {
        let bars = vec![bar(1000, 10.0, 9.0), bar(2000, 11.0, 9.5), bar(3000, 12.0, 10.0)];
        let table = CandleTable::new(bars).unwrap();
        assert_eq!(table.prefix(1).len(), 2);
        assert_eq!(table.prefix(10).len(), 3);
    }
}
