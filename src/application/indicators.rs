//! Thin wrappers over the `ta` crate's streaming indicators, replayed over a
//! full candle slice to produce index-aligned series for the condition
//! context. Only ATR14 and the rolling volume average participate directly
//! in structure analysis (spec); the rest back the indicator condition
//! catalog, which treats them as an ambient collaborator library.

use crate::domain::market::candle::Candle;
use ta::indicators::{
    AverageDirectionalIndex, AverageTrueRange, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex,
};
use ta::{DataItem, Next};

fn data_item(c: &Candle) -> DataItem {
    DataItem::builder()
        .open(c.open)
        .high(c.high)
        .low(c.low)
        .close(c.close)
        .volume(c.volume)
        .build()
        .expect("candle fields are already validated as a well-formed OHLCV bar")
}

/// Wilder/RMA-14 average true range, matching the EMA-smoothed True Range
/// the original implementation intends (see SPEC_FULL.md section 11).
pub fn atr14(candles: &[Candle]) -> Vec<f64> {
    atr(candles, 14)
}

pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut indicator = AverageTrueRange::new(period).expect("ATR period is always > 0");
    candles.iter().map(|c| indicator.next(&data_item(c))).collect()
}

pub fn ema(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut indicator = ExponentialMovingAverage::new(period).expect("EMA period is always > 0");
    candles.iter().map(|c| indicator.next(c.close)).collect()
}

pub fn rsi(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut indicator = RelativeStrengthIndex::new(period).expect("RSI period is always > 0");
    candles.iter().map(|c| indicator.next(c.close)).collect()
}

pub fn adx(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut indicator = AverageDirectionalIndex::new(period).expect("ADX period is always > 0");
    candles.iter().map(|c| indicator.next(&data_item(c))).collect()
}

/// Returns `(macd_line, signal_line)`, index-aligned to `candles`.
pub fn macd(candles: &[Candle], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let mut indicator = MovingAverageConvergenceDivergence::new(fast, slow, signal).expect("MACD periods are valid");
    let mut line = Vec::with_capacity(candles.len());
    let mut sig = Vec::with_capacity(candles.len());
    for c in candles {
        let out = indicator.next(c.close);
        line.push(out.macd);
        sig.push(out.signal);
    }
    (line, sig)
}

/// Rolling average of the `period` bars strictly before each index, used by
/// the false-breakout detector's volume-spike gate. Excludes the current bar
/// so a spike is measured against prior volume, not itself.
pub fn volume_sma(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    let mut window_sum = 0.0;
    for i in 0..candles.len() {
        let count = i.min(period);
        out.push(if count == 0 { 0.0 } else { window_sum / count as f64 });
        window_sum += candles[i].volume;
        if i + 1 > period {
            window_sum -= candles[i - period].volume;
        }
    }
    out
}

/// Cumulative (session-less) volume-weighted average price. The `ta` crate
/// has no VWAP indicator, so this is hand-rolled the way the teacher's own
/// derived metrics (e.g. `domain/performance/calculator.rs`) compute plain
/// arithmetic directly rather than reach for an indicator crate.
pub fn vwap(candles: &[Candle]) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;
    for c in candles {
        let typical = (c.high + c.low + c.close) / 3.0;
        cum_pv += typical * c.volume;
        cum_vol += c.volume;
        out.push(if cum_vol > 0.0 { cum_pv / cum_vol } else { typical });
    }
    out
}
