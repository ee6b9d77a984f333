pub mod metrics;
pub mod trade;

pub use metrics::{BacktestResult, DrawdownPoint};
pub use trade::{BacktestTrade, ExitReason};
