use crate::domain::signal::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Signal,
    EndOfData,
}

#[derive(Debug, Clone)]
pub struct BacktestTrade {
    pub trade_id: String,
    pub strategy_name: String,
    pub kind: SignalKind,
    pub entry_time: i64,
    pub entry_price: f64,
    pub entry_bar: usize,
    pub exit_time: Option<i64>,
    pub exit_price: Option<f64>,
    pub exit_bar: Option<usize>,
    pub exit_reason: Option<ExitReason>,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_amount: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub r_multiple: f64,
}

impl BacktestTrade {
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
