use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use cyclebot::broker::simulated::SimulatedBroker;
use cyclebot::config::SymbolConfig;
use cyclebot::data::market::{OhlcvSeries, Timeframe};
use cyclebot::engine::TradingEngine;
use cyclebot::execution::OrderKind;
use cyclebot::execution::trade::TradeRecord;
use cyclebot::risk::RiskLimits;
use cyclebot::strategy::momentum::{Config as MomentumConfig, MomentumStrategy};
use cyclebot::strategy::{Signal, SignalKind, Strategy};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

fn cycle_time(minute_offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap() + TimeDelta::minutes(minute_offset)
}

fn momentum(name: &str) -> Box<dyn Strategy> {
    Box::new(MomentumStrategy::new(MomentumConfig {
        name: name.to_owned(),
        timeframes: vec![Timeframe::M1],
        allowed_symbols: None,
        size: 0.01,
    }))
}

fn closed_trade(symbol: &str, strategy: &str, pnl: f64, minute_offset: i64) -> TradeRecord {
    let entry_time = cycle_time(minute_offset) - TimeDelta::hours(2);
    TradeRecord {
        symbol: symbol.to_owned(),
        strategy_name: strategy.to_owned(),
        entry_time,
        exit_time: entry_time + TimeDelta::minutes(30),
        entry_price: 1.0,
        exit_price: 1.0,
        size: 0.01,
        pnl,
        stop_loss: None,
        take_profit: None,
    }
}

/// Emits one pre-scripted signal kind per cycle on EURUSD M1.
struct ScriptedStrategy {
    name: String,
    timeframes: Vec<Timeframe>,
    script: VecDeque<SignalKind>,
}

impl ScriptedStrategy {
    fn new(name: &str, script: impl IntoIterator<Item = SignalKind>) -> Box<dyn Strategy> {
        Box::new(Self {
            name: name.to_owned(),
            timeframes: vec![Timeframe::M1],
            script: script.into_iter().collect(),
        })
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    fn generate_signals(&mut self, _: &HashMap<Timeframe, OhlcvSeries>) -> Vec<Signal> {
        let Some(kind) = self.script.pop_front() else {
            return Vec::new();
        };
        vec![Signal {
            symbol: "EURUSD".to_owned(),
            strategy_name: self.name.clone(),
            timeframe: Timeframe::M1,
            kind,
            size: 0.01,
            stop_loss: None,
            take_profit: None,
        }]
    }
}

#[test]
fn duplicate_entries_are_suppressed_across_cycles() {
    let broker = Arc::new(SimulatedBroker::default());
    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("always_buy")])
        .risk_limits(RiskLimits::default())
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();
    assert_eq!(broker.order_count(), 1);

    // The strategy emits BUY again, but the broker still reports the position as open.
    engine.run_once(cycle_time(1)).unwrap();
    assert_eq!(broker.order_count(), 1);

    let order = &broker.orders_sent()[0];
    assert_eq!(order.kind, OrderKind::Buy);
    assert_eq!(order.symbol, "EURUSD");
    assert_eq!(order.comment.as_deref(), Some("always_buy-M1"));
    assert_eq!(order.magic_number, engine.registry().magic_of("always_buy"));
}

#[test]
fn distinct_strategies_open_positions_on_the_same_symbol() {
    let broker = Arc::new(SimulatedBroker::default());
    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("strategy_one"), momentum("strategy_two")])
        .risk_limits(RiskLimits::default())
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();

    let orders = broker.orders_sent();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|order| order.symbol == "EURUSD"));
    assert!(orders.iter().all(|order| order.magic_number.is_some()));
    assert_ne!(orders[0].magic_number, orders[1].magic_number);
    assert_eq!(broker.open_positions().len(), 2);
}

#[test]
fn tripped_global_gate_dispatches_no_orders() {
    let broker = Arc::new(SimulatedBroker::default());
    // Peak 1100, trough 500: drawdown ~54.5% against a 50% limit.
    broker.stage_closed_trade(closed_trade("EURUSD", "always_buy", 1000.0, 0));
    broker.stage_closed_trade(closed_trade("EURUSD", "always_buy", -600.0, 1));

    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("always_buy")])
        .risk_limits(RiskLimits {
            dd_global: Some(50.0),
            initial_balance: 100.0,
            ..RiskLimits::default()
        })
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();

    assert_eq!(broker.order_count(), 0);
    // The history was still reconciled before the gate tripped.
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn tripped_symbol_gate_isolates_other_symbols() {
    let broker = Arc::new(SimulatedBroker::default());
    // EURUSD drawdown (10500 - 9900) / 10500 ~ 5.71% against a 5% limit.
    broker.stage_closed_trade(closed_trade("EURUSD", "always_buy", 500.0, 0));
    broker.stage_closed_trade(closed_trade("EURUSD", "always_buy", -600.0, 1));

    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![
            SymbolConfig::new("EURUSD", Timeframe::M1, 0.01),
            SymbolConfig::new("GBPUSD", Timeframe::M1, 0.01),
        ])
        .strategies(vec![momentum("always_buy")])
        .risk_limits(RiskLimits {
            dd_per_symbol: HashMap::from([("EURUSD".to_owned(), 5.0)]),
            initial_balance: 10_000.0,
            ..RiskLimits::default()
        })
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();

    let orders = broker.orders_sent();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, "GBPUSD");
}

#[test]
fn tripped_strategy_gate_leaves_other_strategies_trading() {
    let broker = Arc::new(SimulatedBroker::default());
    broker.stage_closed_trade(closed_trade("EURUSD", "losing_strategy", -2_000.0, 0));

    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("losing_strategy"), momentum("fresh_strategy")])
        .risk_limits(RiskLimits {
            dd_per_strategy: HashMap::from([("losing_strategy".to_owned(), 10.0)]),
            initial_balance: 10_000.0,
            ..RiskLimits::default()
        })
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();

    let orders = broker.orders_sent();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].comment.as_deref(), Some("fresh_strategy-M1"));
}

#[test]
fn closed_trades_are_reconciled_exactly_once() {
    let broker = Arc::new(SimulatedBroker::default());
    broker.stage_closed_trade(closed_trade("EURUSD", "always_buy", 125.0, 0));

    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("always_buy")])
        .risk_limits(RiskLimits::default())
        .build()
        .unwrap();

    engine.run_once(cycle_time(0)).unwrap();
    // The broker keeps returning the same record; the history must not grow.
    engine.run_once(cycle_time(1)).unwrap();
    engine.run_once(cycle_time(2)).unwrap();

    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history()[0].pnl, 125.0);
}

#[test]
fn magic_numbers_remain_stable_across_cycles() {
    let broker = Arc::new(SimulatedBroker::default());
    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![momentum("always_buy")])
        .risk_limits(RiskLimits::default())
        .build()
        .unwrap();

    let initial = engine.registry().magic_of("always_buy");
    assert!(initial.is_some());

    for offset in 0..3 {
        engine.run_once(cycle_time(offset)).unwrap();
        assert_eq!(engine.registry().magic_of("always_buy"), initial);
    }

    // Every dispatched order carried the registered magic number.
    assert!(
        broker
            .orders_sent()
            .iter()
            .all(|order| order.magic_number == initial)
    );
}

#[test]
fn close_signals_round_trip_and_orphan_closes_are_skipped() {
    let broker = Arc::new(SimulatedBroker::default());
    let mut engine = TradingEngine::builder()
        .broker(Arc::clone(&broker))
        .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
        .strategies(vec![ScriptedStrategy::new(
            "scripted",
            [
                SignalKind::Buy,
                SignalKind::Close,
                SignalKind::Hold,
                SignalKind::Close,
            ],
        )])
        .risk_limits(RiskLimits::default())
        .build()
        .unwrap();

    // Cycle 1: BUY opens a position.
    engine.run_once(cycle_time(0)).unwrap();
    assert_eq!(broker.open_positions().len(), 1);

    // Cycle 2: CLOSE removes it at the broker.
    engine.run_once(cycle_time(1)).unwrap();
    assert!(broker.open_positions().is_empty());

    // Cycle 3 (HOLD) and cycle 4 (orphan CLOSE) dispatch nothing.
    engine.run_once(cycle_time(2)).unwrap();
    engine.run_once(cycle_time(3)).unwrap();

    let kinds = broker
        .orders_sent()
        .iter()
        .map(|order| order.kind)
        .collect::<Vec<OrderKind>>();
    assert_eq!(kinds, vec![OrderKind::Buy, OrderKind::Close]);
}
