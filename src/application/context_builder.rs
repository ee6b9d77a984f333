//! Builds a per-bar [`EvaluationContext`] from the detector outputs and only
//! the indicator series a strategy's conditions actually reference, rather
//! than computing every indicator every bar.

use crate::application::detectors::false_breakout::FalseBreakoutDetector;
use crate::application::detectors::range::RangeDetector;
use crate::application::detectors::structure::StructureAnalyzer;
use crate::application::detectors::structure_break::{RetestDetector, StructureBreakDetector};
use crate::application::detectors::swing::SwingDetector;
use crate::application::indicators;
use crate::domain::conditions::indicator::{adx_key, ema_key, macd_line_key, macd_signal_key, rsi_key, VWAP_KEY};
use crate::domain::conditions::{Condition, EvaluationContext};
use crate::domain::market::candle::Candle;
use crate::domain::strategy::Strategy;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SeriesRequest {
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    Macd(usize, usize, usize),
    Vwap,
}

fn collect_requests(condition: &Condition, out: &mut HashSet<SeriesRequest>) {
    match condition {
        Condition::EmaAlignment(c) => out.extend(c.periods.iter().map(|p| SeriesRequest::Ema(*p))),
        Condition::PriceAboveEma(c) => {
            out.insert(SeriesRequest::Ema(c.period));
        }
        Condition::PriceBelowEma(c) => {
            out.insert(SeriesRequest::Ema(c.period));
        }
        Condition::RsiLevel(c) => {
            out.insert(SeriesRequest::Rsi(c.period));
        }
        Condition::VwapSlope(_) | Condition::PriceAboveVwap(_) | Condition::PriceBelowVwap(_) => {
            out.insert(SeriesRequest::Vwap);
        }
        Condition::AdxTrending(c) => {
            out.insert(SeriesRequest::Adx(c.period));
        }
        Condition::MacdCrossover(c) => {
            out.insert(SeriesRequest::Macd(c.fast, c.slow, c.signal));
        }
        Condition::And(a, b) | Condition::Or(a, b) => {
            collect_requests(a, out);
            collect_requests(b, out);
        }
        Condition::Not(c) => collect_requests(c, out),
        Condition::Group { conditions, .. } => conditions.iter().for_each(|c| collect_requests(c, out)),
        Condition::Sequence { conditions, .. } => conditions.iter().for_each(|c| collect_requests(c, out)),
        _ => {}
    }
}

pub struct ContextBuilder {
    swing_detector: SwingDetector,
    structure_break_detector: StructureBreakDetector,
    retest_detector: RetestDetector,
    range_detector: RangeDetector,
    false_breakout_detector: FalseBreakoutDetector,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            swing_detector: SwingDetector::default(),
            structure_break_detector: StructureBreakDetector::default(),
            retest_detector: RetestDetector::default(),
            range_detector: RangeDetector::default(),
            false_breakout_detector: FalseBreakoutDetector::default(),
        }
    }
}

impl ContextBuilder {
    /// `full_candles[..=bar_index]` is the information available at `bar_index`.
    pub fn build(&self, full_candles: &[Candle], bar_index: usize, strategy: &Strategy) -> EvaluationContext {
        let prefix = &full_candles[..=bar_index];

        let swings = self.swing_detector.detect(prefix);
        let structure = Some(StructureAnalyzer::analyze(&swings));
        let ranges = self.range_detector.detect(prefix, &swings);
        let current_range = ranges.into_iter().filter(|r| r.is_active()).last();

        let atr14 = indicators::atr14(prefix);
        let volume_avg = indicators::volume_sma(prefix, self.false_breakout_detector.volume_lookback);

        let mut structure_breaks = self.structure_break_detector.detect_bos(prefix, &swings);
        structure_breaks.extend(self.structure_break_detector.detect_msb(prefix, &swings));
        for b in &mut structure_breaks {
            if let Some((index, price)) = self.retest_detector.find_retest(prefix, b) {
                b.retest_index = Some(index);
                b.retest_price = Some(price);
            }
        }

        let false_breakouts = self.false_breakout_detector.detect_at_swing_levels(prefix, &swings, &atr14, &volume_avg);

        let mut requests = HashSet::new();
        strategy.entry.iter().for_each(|c| collect_requests(c, &mut requests));
        strategy.filters.iter().for_each(|c| collect_requests(c, &mut requests));

        let mut series: HashMap<String, Vec<f64>> = HashMap::new();
        for req in requests {
            match req {
                SeriesRequest::Ema(p) => {
                    series.insert(ema_key(p), indicators::ema(prefix, p));
                }
                SeriesRequest::Rsi(p) => {
                    series.insert(rsi_key(p), indicators::rsi(prefix, p));
                }
                SeriesRequest::Adx(p) => {
                    series.insert(adx_key(p), indicators::adx(prefix, p));
                }
                SeriesRequest::Macd(fast, slow, signal) => {
                    let (line, sig) = indicators::macd(prefix, fast, slow, signal);
                    series.insert(macd_line_key(fast, slow, signal), line);
                    series.insert(macd_signal_key(fast, slow, signal), sig);
                }
                SeriesRequest::Vwap => {
                    series.insert(VWAP_KEY.to_string(), indicators::vwap(prefix));
                }
            }
        }

        EvaluationContext {
            series,
            scalars: HashMap::new(),
            named_levels: HashMap::new(),
            swings,
            structure,
            current_range,
            structure_breaks,
            false_breakouts,
            current_bar: bar_index,
        }
    }
}
