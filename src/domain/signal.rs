#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Long,
    Short,
}

/// Invariants: for `Long`, `stop_loss < entry_price < take_profit`;
/// symmetric for `Short`. `position_size > 0`.
#[derive(Debug, Clone)]
pub struct Signal {
    pub kind: SignalKind,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_amount: f64,
    pub strategy_name: String,
    pub bar_index: usize,
    pub timestamp_ms: i64,
}
