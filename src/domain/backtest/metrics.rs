use crate::domain::backtest::trade::BacktestTrade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownPoint {
    pub bar_index: usize,
    pub balance: f64,
    pub peak_balance: f64,
    pub drawdown: f64,
    pub drawdown_percent: f64,
}

/// The ledger and aggregate metrics from a single backtest run. Nothing
/// leaks between runs: each run owns its own ledger and balance state.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub starting_balance: f64,
    pub ending_balance: f64,
    pub trades: Vec<BacktestTrade>,
    pub drawdown_curve: Vec<DrawdownPoint>,
}

impl BacktestResult {
    fn closed_trades(&self) -> impl Iterator<Item = &BacktestTrade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn total_trades(&self) -> usize {
        self.closed_trades().count()
    }

    pub fn winners(&self) -> usize {
        self.closed_trades().filter(|t| t.is_winner()).count()
    }

    pub fn losers(&self) -> usize {
        self.closed_trades().filter(|t| !t.is_winner()).count()
    }

    pub fn win_rate(&self) -> f64 {
        let total = self.total_trades();
        if total == 0 {
            return 0.0;
        }
        self.winners() as f64 / total as f64
    }

    pub fn total_pnl(&self) -> f64 {
        self.closed_trades().map(|t| t.pnl).sum()
    }

    pub fn total_pnl_percent(&self) -> f64 {
        if self.starting_balance == 0.0 {
            return 0.0;
        }
        (self.total_pnl() / self.starting_balance) * 100.0
    }

    pub fn avg_winner(&self) -> f64 {
        let wins: Vec<f64> = self.closed_trades().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
        if wins.is_empty() {
            return 0.0;
        }
        wins.iter().sum::<f64>() / wins.len() as f64
    }

    pub fn avg_loser(&self) -> f64 {
        let losses: Vec<f64> = self.closed_trades().filter(|t| !t.is_winner()).map(|t| t.pnl).collect();
        if losses.is_empty() {
            return 0.0;
        }
        losses.iter().sum::<f64>() / losses.len() as f64
    }

    /// `Sum(wins) / |Sum(losses)|`; positive infinity when there are no losses.
    pub fn profit_factor(&self) -> f64 {
        let gross_win: f64 = self.closed_trades().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
        let gross_loss: f64 = self.closed_trades().filter(|t| t.pnl < 0.0).map(|t| t.pnl).sum();
        if gross_loss == 0.0 {
            return f64::INFINITY;
        }
        gross_win / gross_loss.abs()
    }

    pub fn avg_r_multiple(&self) -> f64 {
        let closed: Vec<f64> = self.closed_trades().map(|t| t.r_multiple).collect();
        if closed.is_empty() {
            return 0.0;
        }
        closed.iter().sum::<f64>() / closed.len() as f64
    }

    /// `win_rate * avg_r_multiple - (1 - win_rate)`.
    pub fn expectancy(&self) -> f64 {
        let win_rate = self.win_rate();
        win_rate * self.avg_r_multiple() - (1.0 - win_rate)
    }

    pub fn max_drawdown(&self) -> f64 {
        self.drawdown_curve.iter().map(|p| p.drawdown).fold(0.0, f64::max)
    }

    pub fn max_drawdown_percent(&self) -> f64 {
        self.drawdown_curve.iter().map(|p| p.drawdown_percent).fold(0.0, f64::max)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} trades, win_rate={:.1}%, profit_factor={:.2}, expectancy={:.3}R, max_dd={:.1}%",
            self.strategy_name,
            self.total_trades(),
            self.win_rate() * 100.0,
            self.profit_factor(),
            self.expectancy(),
            self.max_drawdown_percent(),
        )
    }
}

/// Bar-by-bar peak-to-balance distance, as the driver walks candles.
pub fn track_drawdown(curve: &mut Vec<DrawdownPoint>, bar_index: usize, balance: f64, peak_balance: &mut f64) {
    if balance > *peak_balance {
        *peak_balance = balance;
    }
    let drawdown = *peak_balance - balance;
    let drawdown_percent = if *peak_balance != 0.0 { (drawdown / *peak_balance) * 100.0 } else { 0.0 };
    curve.push(DrawdownPoint {
        bar_index,
        balance,
        peak_balance: *peak_balance,
        drawdown,
        drawdown_percent,
    });
}
