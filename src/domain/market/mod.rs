pub mod candle;
pub mod false_breakout;
pub mod range;
pub mod structure_break;
pub mod structure_snapshot;
pub mod swing;
pub mod timeframe;
