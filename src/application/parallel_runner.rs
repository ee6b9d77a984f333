//! Runs many `(strategy, candles)` backtests concurrently. Each worker owns
//! its own driver state; the candle table is shared read-only. A failing run
//! is isolated and reported without aborting the rest of the batch.

use crate::application::backtest_driver::Backtester;
use crate::domain::backtest::metrics::BacktestResult;
use crate::domain::errors::BacktestError;
use crate::domain::market::candle::CandleTable;
use crate::domain::strategy::Strategy;
use rayon::prelude::*;
use tracing::error;

pub fn run_multiple(
    backtester: &Backtester,
    strategies: &[Strategy],
    candles: &CandleTable,
    starting_balance: f64,
    parallel: bool,
) -> Vec<Result<BacktestResult, BacktestError>> {
    if parallel {
        strategies.par_iter().map(|s| run_one(backtester, s, candles, starting_balance)).collect()
    } else {
        strategies.iter().map(|s| run_one(backtester, s, candles, starting_balance)).collect()
    }
}

fn run_one(backtester: &Backtester, strategy: &Strategy, candles: &CandleTable, starting_balance: f64) -> Result<BacktestResult, BacktestError> {
    let result = backtester.run(strategy, candles, starting_balance);
    if let Err(ref e) = result {
        error!(strategy = %strategy.name, error = %e, "parallel backtest run failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conditions::price::PriceAbove;
    use crate::domain::conditions::{Condition, Level};
    use crate::domain::market::candle::Candle;
    use crate::domain::market::timeframe::Timeframe;
    use crate::domain::strategy::{Direction, SlConfig, TpConfig};

    fn bar(ts: i64, close: f64) -> Candle {
        Candle { timestamp_ms: ts, open: close, high: close + 2.0, low: close - 2.0, close, volume: 100.0 }
    }

    fn strategy(name: &str, enabled: bool) -> Strategy {
        Strategy {
            name: name.into(),
            timeframe: Timeframe::OneHour,
            direction: Direction::Long,
            entry: vec![Condition::PriceAbove(PriceAbove { level: Level::Scalar(0.0) })],
            filters: vec![],
            stop_loss: SlConfig::Fixed { value: 1.0 },
            take_profit: TpConfig::Fixed { value: 1.0 },
            risk_percent: 1.0,
            max_positions: 1,
            description: String::new(),
            enabled,
        }
    }

    #[test]
    fn one_failing_strategy_does_not_abort_the_batch() {
        let candles: Vec<_> = (0..60).map(|i| bar(i as i64 * 1000, 100.0)).collect();
        let table = CandleTable::new(candles).unwrap();
        let strategies = vec![strategy("ok", true), strategy("disabled", false)];
        let results = run_multiple(&Backtester::default(), &strategies, &table, 10_000.0, false);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(BacktestError::StrategyDisabled { .. })));
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let candles: Vec<_> = (0..60).map(|i| bar(i as i64 * 1000, 100.0 + (i % 7) as f64)).collect();
        let table = CandleTable::new(candles).unwrap();
        let strategies = vec![strategy("a", true), strategy("b", true)];
        let backtester = Backtester::default();
        let seq = run_multiple(&backtester, &strategies, &table, 10_000.0, false);
        let par = run_multiple(&backtester, &strategies, &table, 10_000.0, true);
        for seq_result in &seq {
            let seq_result = seq_result.as_ref().unwrap();
            let par_result = par
                .iter()
                .find_map(|r| r.as_ref().ok().filter(|r| r.strategy_name == seq_result.strategy_name))
                .unwrap();
            assert_eq!(seq_result.trades.len(), par_result.trades.len());
        }
    }
}
