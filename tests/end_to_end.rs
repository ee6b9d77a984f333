use serde_json::json;
use stratforge::application::backtest_driver::Backtester;
use stratforge::application::detectors::false_breakout::FalseBreakoutDetector;
use stratforge::application::detectors::range::RangeDetector;
use stratforge::application::detectors::structure_break::StructureBreakDetector;
use stratforge::application::detectors::swing::SwingDetector;
use stratforge::application::indicators;
use stratforge::application::parallel_runner::run_multiple;
use stratforge::application::strategy_loader::StrategyLoader;
use stratforge::domain::conditions::condition::GroupMode;
use stratforge::domain::conditions::indicator::{ema_key, PriceAboveEma};
use stratforge::domain::conditions::pattern::BosOccurred;
use stratforge::domain::conditions::price::CandleBias;
use stratforge::domain::conditions::{Condition, EvaluationContext};
use stratforge::domain::market::candle::{Candle, CandleTable};
use stratforge::domain::market::range::RangeStatus;
use stratforge::domain::market::structure_break::BreakKind;
use stratforge::domain::strategy::{Direction, SlConfig, Strategy, TpConfig};

fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle { timestamp_ms: ts, open, high, low, close, volume }
}

#[test]
fn scenario_1_synthetic_uptrend_bos() {
    // Confirmed high at bar0 (100), a pullback confirms a low below it at bar1
    // (90), a second, higher high confirms at bar3 (150, HigherHigh vs bar0's
    // 100), then bar5 closes above it (400) with no new low of its own, so
    // the HigherHigh swing stands as the most recent swing ahead of the break.
    let candles = vec![
        bar(0, 100.0, 100.0, 100.0, 100.0, 100.0),
        bar(1, 92.0, 95.0, 90.0, 92.0, 100.0),
        bar(2, 105.0, 110.0, 92.0, 105.0, 100.0),
        bar(3, 98.0, 150.0, 95.0, 98.0, 100.0),
        bar(4, 89.0, 92.0, 88.0, 89.0, 100.0),
        bar(5, 400.0, 500.0, 10.0, 400.0, 100.0),
    ];
    let swings = SwingDetector::default().detect(&candles);
    assert!(swings.iter().filter(|s| s.is_low()).count() >= 1);
    assert!(swings.iter().filter(|s| s.is_high()).count() >= 1);

    let breaks = StructureBreakDetector::default().detect_bos(&candles, &swings);
    assert!(breaks.iter().any(|b| b.kind == BreakKind::BosBull && b.break_price == 400.0));
}

#[test]
fn scenario_2_range_with_75_percent_touch() {
    use stratforge::domain::market::swing::{SwingKind, SwingPoint};

    let candles: Vec<Candle> = (0..40).map(|_| bar(0, 110.0, 119.9, 100.1, 110.0, 100.0)).collect();
    let swings = vec![
        SwingPoint { index: 0, price: 120.0, kind: SwingKind::High, confirmed_at_index: 1, structure: None },
        SwingPoint { index: 15, price: 100.0, kind: SwingKind::Low, confirmed_at_index: 16, structure: None },
    ];

    let detector = RangeDetector { touch_tolerance_pct: 1.0, min_touches: 3, min_range_bars: 10, max_range_bars: 100 };
    let ranges = detector.detect(&candles, &swings);
    assert_eq!(ranges.len(), 1);
    let range = &ranges[0];
    assert_eq!(range.status, RangeStatus::Confirmed);

    let fib = range.fib();
    assert!((fib.fib_75() - 115.0).abs() < 1e-6);
    assert!(range.at_75_level(115.0, 1.0));
}

#[test]
fn scenario_3_false_breakout_below_swing_low() {
    let candles = vec![bar(0, 100.5, 101.0, 100.0, 100.5, 100.0), bar(1, 100.5, 100.6, 99.0, 100.5, 100.0)];
    let atr = indicators::atr14(&candles);
    let volume_avg = indicators::volume_sma(&candles, 20);
    let detector = FalseBreakoutDetector::default();
    let fb = detector
        .detect_at_level(&candles, &atr, &volume_avg, 100.0, stratforge::domain::market::false_breakout::FbKind::Below, 1)
        .expect("expected a false breakout");
    assert_eq!(fb.fb_kind, stratforge::domain::market::false_breakout::FbKind::Below);
    assert!(!fb.volume_spike);
}

#[test]
fn scenario_4_backtest_is_deterministic_across_many_bars() {
    let mut candles = Vec::new();
    let mut price = 100.0;
    for i in 0..500 {
        price += if i % 3 == 0 { 0.5 } else { -0.2 };
        candles.push(bar(i as i64, price, price + 1.0, price - 1.0, price, 1000.0));
    }
    let table = CandleTable::new(candles).unwrap();

    let strategy = Strategy {
        name: "ema-bos".into(),
        timeframe: stratforge::domain::market::timeframe::Timeframe::OneHour,
        direction: Direction::Long,
        entry: vec![
            Condition::PriceAboveEma(PriceAboveEma { period: 50 }),
            Condition::BosOccurred(BosOccurred { direction: Some(CandleBias::Bullish), lookback: 5 }),
        ],
        filters: vec![],
        stop_loss: SlConfig::Atr { multiplier: 1.5 },
        take_profit: TpConfig::RiskReward { ratio: 2.0 },
        risk_percent: 1.0,
        max_positions: 1,
        description: String::new(),
        enabled: true,
    };

    let backtester = Backtester::default();
    let first = backtester.run(&strategy, &table, 10_000.0).unwrap();
    let second = backtester.run(&strategy, &table, 10_000.0).unwrap();
    assert_eq!(first.trades.len(), second.trades.len());
    assert!((first.ending_balance - second.ending_balance).abs() < 1e-9);

    let strategies = vec![strategy];
    let seq = run_multiple(&backtester, &strategies, &table, 10_000.0, false);
    let par = run_multiple(&backtester, &strategies, &table, 10_000.0, true);
    assert_eq!(seq[0].as_ref().unwrap().trades.len(), par[0].as_ref().unwrap().trades.len());
}

#[test]
fn scenario_5_sl_first_exit_on_same_bar_touch() {
    use stratforge::domain::conditions::price::PriceAbove;
    use stratforge::domain::conditions::Level;

    let mut candles = Vec::new();
    for i in 0..55 {
        candles.push(bar(i as i64, 100.0, 100.5, 99.5, 100.0, 100.0));
    }
    // bar 55: low=98 (through SL=99), high=103 (through TP=102)
    candles.push(bar(55, 100.0, 103.0, 98.0, 100.5, 100.0));
    let table = CandleTable::new(candles).unwrap();

    let strategy = Strategy {
        name: "sl-first".into(),
        timeframe: stratforge::domain::market::timeframe::Timeframe::OneHour,
        direction: Direction::Long,
        entry: vec![Condition::PriceAbove(PriceAbove { level: Level::Scalar(0.0) })],
        filters: vec![],
        stop_loss: SlConfig::Fixed { value: 1.0 },
        take_profit: TpConfig::Fixed { value: 2.0 },
        risk_percent: 1.0,
        max_positions: 1,
        description: String::new(),
        enabled: true,
    };

    let result = Backtester::default().run(&strategy, &table, 10_000.0).unwrap();
    let sl_exit = result.trades.iter().find(|t| t.exit_reason == Some(stratforge::domain::backtest::trade::ExitReason::StopLoss));
    assert!(sl_exit.is_some(), "expected at least one stop-loss exit under the SL-first rule");
}

#[test]
fn scenario_6_sequence_resets_after_timeout() {
    use stratforge::domain::conditions::price::{PriceAbove, PriceBelow};
    use stratforge::domain::conditions::Level;
    use std::sync::Arc;

    let step_a = Condition::PriceAbove(PriceAbove { level: Level::Scalar(100.0) });
    let step_b = Condition::PriceBelow(PriceBelow { level: Level::Scalar(50.0) });
    let sequence = Condition::Sequence {
        conditions: Arc::new(vec![step_a, step_b]),
        max_bars_between: 3,
        state: Default::default(),
    };

    let mut ctx = EvaluationContext::default();
    let firing = vec![bar(0, 101.0, 102.0, 99.0, 101.0, 100.0)];
    let idle = vec![bar(0, 60.0, 61.0, 59.0, 60.0, 100.0)];

    // bar 10: A fires (close=101 > 100), sequence advances to step 1
    ctx.current_bar = 10;
    let r = sequence.evaluate(&firing, &ctx);
    assert!(r.verdict.is_neutral());
    assert!(r.details.contains("step 1"));

    // bars 11..14: B never fires, and more than max_bars_between pass since step A
    for bar_index in 11..=14 {
        ctx.current_bar = bar_index;
        let r = sequence.evaluate(&idle, &ctx);
        assert!(!r.verdict.is_true());
    }

    // the timeout reset step back to 0, so firing A again at bar 15 advances to
    // step 1 again rather than being interpreted as a (stale) step-B check
    ctx.current_bar = 15;
    let r = sequence.evaluate(&firing, &ctx);
    assert!(r.verdict.is_neutral());
    assert!(r.details.contains("step 1"), "sequence should have re-observed step A after the timeout reset");
}

#[test]
fn strategy_document_round_trips_through_json() {
    let doc = json!({
        "name": "Round Trip",
        "timeframe": "1h",
        "direction": "long",
        "entry": {
            "conditions": [{"type": "price_above_ema", "period": 50}]
        },
        "exit": {
            "stop_loss": {"type": "atr", "multiplier": 1.5},
            "take_profit": {"type": "risk_reward", "ratio": 2.0}
        },
        "risk_percent": 2.0
    });

    let loader = StrategyLoader;
    let strategy = loader.load_document(&doc).unwrap();

    let reserialized = json!({
        "name": strategy.name,
        "timeframe": strategy.timeframe.to_string(),
        "direction": "long",
        "entry": {"conditions": [{"type": "price_above_ema", "period": 50}]},
        "exit": {
            "stop_loss": {"type": "atr", "multiplier": 1.5},
            "take_profit": {"type": "risk_reward", "ratio": 2.0}
        },
        "risk_percent": strategy.risk_percent
    });

    let reloaded = loader.load_document(&reserialized).unwrap();
    assert_eq!(strategy.name, reloaded.name);
    assert_eq!(strategy.entry.len(), reloaded.entry.len());
    assert_eq!(strategy.stop_loss, reloaded.stop_loss);
    assert_eq!(strategy.take_profit, reloaded.take_profit);
    assert_eq!(strategy.risk_percent, reloaded.risk_percent);
}

#[test]
fn group_mode_all_matches_conjunction_semantics() {
    use stratforge::domain::conditions::price::PriceAbove;
    use stratforge::domain::conditions::Level;

    let group = Condition::Group {
        conditions: vec![
            Condition::PriceAbove(PriceAbove { level: Level::Scalar(50.0) }),
            Condition::PriceAbove(PriceAbove { level: Level::Scalar(100.0) }),
        ],
        mode: GroupMode::All,
    };
    let candles = vec![bar(0, 90.0, 95.0, 85.0, 90.0, 10.0)];
    let ctx = EvaluationContext::default();
    let result = group.evaluate(&candles, &ctx);
    assert!(result.verdict.is_false());
}

#[test]
fn ema_series_is_computed_when_needed() {
    let candles: Vec<_> = (0..30).map(|i| bar(i as i64, 100.0 + i as f64, 101.0 + i as f64, 99.0 + i as f64, 100.0 + i as f64, 100.0)).collect();
    let series = indicators::ema(&candles, 9);
    assert_eq!(series.len(), candles.len());
    let key = ema_key(9);
    assert_eq!(key, "ema_9");
}
