//! Tabular comparison export across backtest results: one row per strategy,
//! sorted by expectancy descending.

use crate::domain::backtest::metrics::BacktestResult;

pub struct ReportRow {
    pub strategy_name: String,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_r_multiple: f64,
    pub expectancy: f64,
    pub max_drawdown_percent: f64,
    pub total_pnl_percent: f64,
}

pub fn compare(results: &[BacktestResult]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = results
        .iter()
        .map(|r| ReportRow {
            strategy_name: r.strategy_name.clone(),
            total_trades: r.total_trades(),
            win_rate: r.win_rate(),
            profit_factor: r.profit_factor(),
            avg_r_multiple: r.avg_r_multiple(),
            expectancy: r.expectancy(),
            max_drawdown_percent: r.max_drawdown_percent(),
            total_pnl_percent: r.total_pnl_percent(),
        })
        .collect();

    rows.sort_by(|a, b| b.expectancy.partial_cmp(&a.expectancy).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut out = String::from("strategy_name,total_trades,win_rate,profit_factor,avg_r_multiple,expectancy,max_drawdown_percent,total_pnl_percent\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}\n",
            row.strategy_name,
            row.total_trades,
            row.win_rate,
            row.profit_factor,
            row.avg_r_multiple,
            row.expectancy,
            row.max_drawdown_percent,
            row.total_pnl_percent,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::trade::{BacktestTrade, ExitReason};
    use crate::domain::signal::SignalKind;

    fn trade(pnl: f64, r: f64) -> BacktestTrade {
        BacktestTrade {
            trade_id: "t".into(),
            strategy_name: "s".into(),
            kind: SignalKind::Long,
            entry_time: 0,
            entry_price: 100.0,
            entry_bar: 0,
            exit_time: Some(1),
            exit_price: Some(100.0 + pnl),
            exit_bar: Some(1),
            exit_reason: Some(ExitReason::Signal),
            stop_loss: 99.0,
            take_profit: 102.0,
            position_size: 1.0,
            risk_amount: 1.0,
            pnl,
            pnl_percent: pnl,
            r_multiple: r,
        }
    }

    fn result(name: &str, trades: Vec<BacktestTrade>) -> BacktestResult {
        BacktestResult { strategy_name: name.into(), starting_balance: 1000.0, ending_balance: 1000.0, trades, drawdown_curve: vec![] }
    }

    #[test]
    fn sorts_by_expectancy_descending() {
        let weak = result("weak", vec![trade(-5.0, -1.0)]);
        let strong = result("strong", vec![trade(20.0, 2.0), trade(20.0, 2.0)]);
        let rows = compare(&[weak, strong]);
        assert_eq!(rows[0].strategy_name, "strong");
        assert_eq!(rows[1].strategy_name, "weak");
    }

    #[test]
    fn csv_has_expected_header() {
        let rows = compare(&[result("s", vec![trade(1.0, 1.0)])]);
        let csv = to_csv(&rows);
        assert!(csv.starts_with("strategy_name,total_trades,win_rate"));
    }
}
