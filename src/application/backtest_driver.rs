//! Single-strategy bar loop: warm-up, signal generation, SL/TP exit
//! resolution, commission and slippage, and end-of-data force-close.

use crate::application::signal_generator::SignalGenerator;
use crate::domain::backtest::metrics::{track_drawdown, BacktestResult};
use crate::domain::backtest::trade::{BacktestTrade, ExitReason};
use crate::domain::errors::BacktestError;
use crate::domain::market::candle::{Candle, CandleTable};
use crate::domain::signal::SignalKind;
use crate::domain::strategy::Strategy;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct Backtester {
    pub min_bars: usize,
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl Default for Backtester {
    fn default() -> Self {
        Self { min_bars: 50, commission_pct: 0.0, slippage_pct: 0.0 }
    }
}

struct OpenTrade {
    trade_id: String,
    kind: SignalKind,
    entry_time: i64,
    entry_price: f64,
    entry_bar: usize,
    stop_loss: f64,
    take_profit: f64,
    position_size: f64,
    risk_amount: f64,
}

impl Backtester {
    pub fn run(&self, strategy: &Strategy, candles: &CandleTable, starting_balance: f64) -> Result<BacktestResult, BacktestError> {
        if !strategy.enabled {
            return Err(BacktestError::StrategyDisabled { strategy_name: strategy.name.clone() });
        }
        candles.require_min_bars(self.min_bars)?;

        let mut generator = SignalGenerator::default();
        generator.add_strategy(strategy.clone());

        let bars = candles.as_slice();
        let mut balance = starting_balance;
        let mut peak_balance = starting_balance;
        let mut open_trade: Option<OpenTrade> = None;
        let mut trades: Vec<BacktestTrade> = Vec::new();
        let mut drawdown_curve = Vec::new();

        for i in self.min_bars..bars.len() {
            let bar = &bars[i];

            if let Some(trade) = open_trade.take() {
                match self.resolve_exit(&trade, bar) {
                    Some((exit_price, reason)) => {
                        let closed = self.close_trade(&strategy.name, &trade, i, bar.timestamp_ms, exit_price, reason);
                        balance += closed.pnl;
                        trades.push(closed);
                    }
                    None => open_trade = Some(trade),
                }
            }

            if open_trade.is_none() {
                let signals = generator.generate(bars, i, balance);
                if let Some(signal) = signals.into_iter().next() {
                    let entry_price = apply_entry_slippage(signal.entry_price, signal.kind, self.slippage_pct);
                    open_trade = Some(OpenTrade {
                        trade_id: Uuid::new_v4().to_string(),
                        kind: signal.kind,
                        entry_time: bar.timestamp_ms,
                        entry_price,
                        entry_bar: i,
                        stop_loss: signal.stop_loss,
                        take_profit: signal.take_profit,
                        position_size: signal.position_size,
                        risk_amount: signal.risk_amount,
                    });
                }
            }

            track_drawdown(&mut drawdown_curve, i, balance, &mut peak_balance);
        }

        if let Some(trade) = open_trade.take() {
            let last = bars.last().expect("require_min_bars already guarantees at least one bar");
            let closed = self.close_trade(&strategy.name, &trade, bars.len() - 1, last.timestamp_ms, last.close, ExitReason::EndOfData);
            balance += closed.pnl;
            trades.push(closed);
            track_drawdown(&mut drawdown_curve, bars.len() - 1, balance, &mut peak_balance);
        }

        info!(strategy = %strategy.name, trades = trades.len(), "backtest run finished");

        Ok(BacktestResult {
            strategy_name: strategy.name.clone(),
            starting_balance,
            ending_balance: balance,
            trades,
            drawdown_curve,
        })
    }

    /// SL-first rule: when both sides are touched on the same bar, the
    /// conservative stop-loss exit wins.
    fn resolve_exit(&self, trade: &OpenTrade, bar: &Candle) -> Option<(f64, ExitReason)> {
        match trade.kind {
            SignalKind::Long => {
                let hit_sl = bar.low <= trade.stop_loss;
                let hit_tp = bar.high >= trade.take_profit;
                if hit_sl {
                    Some((trade.stop_loss, ExitReason::StopLoss))
                } else if hit_tp {
                    Some((trade.take_profit, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
            SignalKind::Short => {
                let hit_sl = bar.high >= trade.stop_loss;
                let hit_tp = bar.low <= trade.take_profit;
                if hit_sl {
                    Some((trade.stop_loss, ExitReason::StopLoss))
                } else if hit_tp {
                    Some((trade.take_profit, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
        }
    }

    fn close_trade(
        &self,
        strategy_name: &str,
        trade: &OpenTrade,
        exit_bar: usize,
        exit_time: i64,
        exit_price: f64,
        reason: ExitReason,
    ) -> BacktestTrade {
        let raw_pnl = match trade.kind {
            SignalKind::Long => (exit_price - trade.entry_price) * trade.position_size,
            SignalKind::Short => (trade.entry_price - exit_price) * trade.position_size,
        };
        let commission = self.commission_pct / 100.0 * raw_pnl.abs();
        let pnl = raw_pnl - commission;
        let pnl_percent = if trade.entry_price * trade.position_size != 0.0 {
            pnl / (trade.entry_price * trade.position_size) * 100.0
        } else {
            0.0
        };
        let risk_denominator = trade.risk_amount * trade.position_size;
        let r_multiple = if risk_denominator != 0.0 { pnl / risk_denominator } else { 0.0 };

        BacktestTrade {
            trade_id: trade.trade_id.clone(),
            strategy_name: strategy_name.to_string(),
            kind: trade.kind,
            entry_time: trade.entry_time,
            entry_price: trade.entry_price,
            entry_bar: trade.entry_bar,
            exit_time: Some(exit_time),
            exit_price: Some(exit_price),
            exit_bar: Some(exit_bar),
            exit_reason: Some(reason),
            stop_loss: trade.stop_loss,
            take_profit: trade.take_profit,
            position_size: trade.position_size,
            risk_amount: trade.risk_amount,
            pnl,
            pnl_percent,
            r_multiple,
        }
    }
}

fn apply_entry_slippage(close: f64, kind: SignalKind, slippage_pct: f64) -> f64 {
    match kind {
        SignalKind::Long => close * (1.0 + slippage_pct / 100.0),
        SignalKind::Short => close * (1.0 - slippage_pct / 100.0),
    }
}
