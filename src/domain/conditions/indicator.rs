use crate::domain::conditions::context::EvaluationContext;
use crate::domain::conditions::price::CandleBias;
use crate::domain::conditions::result::{EvaluationResult, Verdict};
use crate::domain::market::candle::Candle;

fn neutral(name: &str, details: &str) -> EvaluationResult {
    EvaluationResult::new(Verdict::Neutral, name, details)
}

pub fn ema_key(period: usize) -> String {
    format!("ema_{period}")
}
pub fn rsi_key(period: usize) -> String {
    format!("rsi_{period}")
}
pub fn adx_key(period: usize) -> String {
    format!("adx_{period}")
}
pub fn macd_line_key(fast: usize, slow: usize, signal: usize) -> String {
    format!("macd_line_{fast}_{slow}_{signal}")
}
pub fn macd_signal_key(fast: usize, slow: usize, signal: usize) -> String {
    format!("macd_signal_{fast}_{slow}_{signal}")
}
pub const VWAP_KEY: &str = "vwap";

#[derive(Debug, Clone, PartialEq)]
pub struct EmaAlignment {
    pub direction: CandleBias,
    pub periods: Vec<usize>,
}

impl EmaAlignment {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        if self.periods.len() < 2 {
            return neutral("EMAAlignment", "need at least two periods");
        }
        let mut values = Vec::with_capacity(self.periods.len());
        for p in &self.periods {
            let Some(v) = ctx.series.get(&ema_key(*p)).and_then(|s| s.last()) else {
                return neutral("EMAAlignment", "missing EMA series");
            };
            values.push(*v);
        }
        let ordered = match self.direction {
            CandleBias::Bullish => values.windows(2).all(|w| w[0] > w[1]),
            CandleBias::Bearish => values.windows(2).all(|w| w[0] < w[1]),
        };
        let verdict = if ordered { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "EMAAlignment", format!("{values:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAboveEma {
    pub period: usize,
}

impl PriceAboveEma {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(last), Some(ema)) = (candles.last(), ctx.series.get(&ema_key(self.period)).and_then(|s| s.last())) else {
            return neutral("PriceAboveEMA", "missing EMA series");
        };
        let verdict = if last.close > *ema { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceAboveEMA", format!("close={} ema={}", last.close, ema))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBelowEma {
    pub period: usize,
}

impl PriceBelowEma {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(last), Some(ema)) = (candles.last(), ctx.series.get(&ema_key(self.period)).and_then(|s| s.last())) else {
            return neutral("PriceBelowEMA", "missing EMA series");
        };
        let verdict = if last.close < *ema { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceBelowEMA", format!("close={} ema={}", last.close, ema))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Oversold,
    Overbought,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiLevel {
    pub zone: RsiZone,
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiLevel {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(rsi) = ctx.series.get(&rsi_key(self.period)).and_then(|s| s.last()) else {
            return neutral("RSILevel", "missing RSI series");
        };
        let matches = match self.zone {
            RsiZone::Oversold => *rsi <= self.oversold,
            RsiZone::Overbought => *rsi >= self.overbought,
            RsiZone::Neutral => *rsi > self.oversold && *rsi < self.overbought,
        };
        let verdict = if matches { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "RSILevel", format!("rsi={rsi}")).with_value("rsi", *rsi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VwapSlope {
    pub direction: CandleBias,
    pub slope_period: usize,
}

impl VwapSlope {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(series) = ctx.series.get(VWAP_KEY) else {
            return neutral("VWAPSlope", "missing VWAP series");
        };
        if series.len() <= self.slope_period {
            return neutral("VWAPSlope", "not enough VWAP history");
        }
        let curr = series[series.len() - 1];
        let prev = series[series.len() - 1 - self.slope_period];
        let rising = curr > prev;
        let matches = match self.direction {
            CandleBias::Bullish => rising,
            CandleBias::Bearish => !rising,
        };
        let verdict = if matches { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "VWAPSlope", format!("curr={curr} prev={prev}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAboveVwap;

impl PriceAboveVwap {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(last), Some(vwap)) = (candles.last(), ctx.series.get(VWAP_KEY).and_then(|s| s.last())) else {
            return neutral("PriceAboveVWAP", "missing VWAP series");
        };
        let verdict = if last.close > *vwap { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceAboveVWAP", format!("close={} vwap={}", last.close, vwap))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBelowVwap;

impl PriceBelowVwap {
    pub fn evaluate(&self, candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(last), Some(vwap)) = (candles.last(), ctx.series.get(VWAP_KEY).and_then(|s| s.last())) else {
            return neutral("PriceBelowVWAP", "missing VWAP series");
        };
        let verdict = if last.close < *vwap { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "PriceBelowVWAP", format!("close={} vwap={}", last.close, vwap))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSpikeCondition {
    pub threshold: f64,
    pub period: usize,
}

impl VolumeSpikeCondition {
    pub fn evaluate(&self, candles: &[Candle], _ctx: &EvaluationContext) -> EvaluationResult {
        if candles.len() <= self.period {
            return neutral("VolumeSpikeCondition", "not enough bars");
        }
        let window = &candles[candles.len() - 1 - self.period..candles.len() - 1];
        let mean: f64 = window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64;
        let current = candles.last().unwrap().volume;
        let verdict = if mean > 0.0 && current >= self.threshold * mean {
            Verdict::True
        } else {
            Verdict::False
        };
        EvaluationResult::new(verdict, "VolumeSpikeCondition", format!("current={current} mean={mean}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxTrending {
    pub threshold: f64,
    pub period: usize,
}

impl AdxTrending {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let Some(adx) = ctx.series.get(&adx_key(self.period)).and_then(|s| s.last()) else {
            return neutral("ADXTrending", "missing ADX series");
        };
        let verdict = if *adx >= self.threshold { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "ADXTrending", format!("adx={adx}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdCrossover {
    pub direction: CandleBias,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl MacdCrossover {
    pub fn evaluate(&self, _candles: &[Candle], ctx: &EvaluationContext) -> EvaluationResult {
        let (Some(line), Some(sig)) = (
            ctx.series.get(&macd_line_key(self.fast, self.slow, self.signal)),
            ctx.series.get(&macd_signal_key(self.fast, self.slow, self.signal)),
        ) else {
            return neutral("MACDCrossover", "missing MACD series");
        };
        if line.len() < 2 || sig.len() < 2 {
            return neutral("MACDCrossover", "not enough MACD history");
        }
        let (prev_line, curr_line) = (line[line.len() - 2], line[line.len() - 1]);
        let (prev_sig, curr_sig) = (sig[sig.len() - 2], sig[sig.len() - 1]);
        let matches = match self.direction {
            CandleBias::Bullish => prev_line <= prev_sig && curr_line > curr_sig,
            CandleBias::Bearish => prev_line >= prev_sig && curr_line < curr_sig,
        };
        let verdict = if matches { Verdict::True } else { Verdict::False };
        EvaluationResult::new(verdict, "MACDCrossover", format!("line={curr_line} signal={curr_sig}"))
    }
}
