//! # Cyclebot
//! [`Cyclebot`] is a framework for building **periodic, broker-coupled trading bots**. Once per
//! cycle it synchronises local state with the brokerage account, resamples historical market data
//! across the timeframes its strategies require, collects trade signals, enforces layered
//! drawdown limits, and idempotently dispatches market orders. It is built from several
//! de-coupled components that interact via a small set of traits:
//!
//! * **Broker**: The BrokerClient trait defines the brokerage operations the engine consumes:
//!   historical bar fetch, market order dispatch, open position query and closed trade retrieval.
//!   A SimulatedBroker implementation is provided for dry-trading and tests.
//! * **Data**: The MarketDataService fetches a symbol's base-timeframe series and resamples it to
//!   the union of timeframes required by the active strategies, returning one aligned series per
//!   timeframe.
//! * **Strategy**: The Strategy trait governs the generation of Signals from timeframe-indexed
//!   bar series. A StrategyRegistry assigns each strategy a stable magic number so broker-side
//!   orders remain attributable to their originating strategy.
//! * **Risk**: The RiskEvaluator decides whether the bot, a symbol, or a strategy may open new
//!   orders, evaluated statelessly over the closed-trade history via equity-curve max drawdown.
//! * **Execution**: The OrderExecutor owns the local mirror of open positions keyed by
//!   (symbol, magic number), dispatches orders, and answers duplicate-position checks.
//! * **Engine**: The TradingEngine orchestrates one cycle (reconcile, risk-gate, fetch, generate,
//!   dispatch) and the loop drivers run it on a fixed interval or aligned to candle boundaries.
//!
//! ## Getting Started
//! ### Strategy Registry
//! ```
//! use cyclebot::strategy::registry::StrategyRegistry;
//!
//! let mut registry = StrategyRegistry::new();
//!
//! let magic = registry.register("momentum_h1");
//!
//! // Registration is idempotent & lookups work both ways
//! assert_eq!(registry.register("momentum_h1"), magic);
//! assert_eq!(registry.magic_of("momentum_h1"), Some(magic));
//! assert_eq!(registry.name_of(magic), Some("momentum_h1"));
//! ```
//!
//! ### Risk Evaluator
//! ```
//! use cyclebot::risk::{RiskEvaluator, RiskLimits};
//!
//! let evaluator = RiskEvaluator::new(RiskLimits {
//!     dd_global: Some(30.0),
//!     initial_balance: 10_000.0,
//!     ..RiskLimits::default()
//! });
//!
//! // An empty history carries zero drawdown, so trading is allowed
//! assert!(evaluator.bot_allowed(&[]));
//! ```
//!
//! ### Engine
//! ```
//! use cyclebot::broker::simulated::SimulatedBroker;
//! use cyclebot::config::SymbolConfig;
//! use cyclebot::data::market::Timeframe;
//! use cyclebot::engine::TradingEngine;
//! use cyclebot::risk::RiskLimits;
//! use cyclebot::strategy::momentum::{Config as StrategyConfig, MomentumStrategy};
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! let broker = Arc::new(SimulatedBroker::default());
//!
//! let mut engine = TradingEngine::builder()
//!     .broker(Arc::clone(&broker))
//!     .symbols(vec![SymbolConfig::new("EURUSD", Timeframe::M1, 0.01)])
//!     .strategies(vec![Box::new(MomentumStrategy::new(StrategyConfig {
//!         name: "example_momentum".to_owned(),
//!         timeframes: vec![Timeframe::M1],
//!         allowed_symbols: None,
//!         size: 0.01,
//!     }))])
//!     .risk_limits(RiskLimits::default())
//!     .build()
//!     .expect("failed to build TradingEngine");
//!
//! engine.run_once(Utc::now()).expect("cycle failed");
//! ```

#![warn(missing_copy_implementations)]

/// Defines the Timeframe, Bar & OhlcvSeries market value types, the resampling pipeline that
/// aggregates a base series into coarser timeframes, and the MarketDataService that produces the
/// timeframe-indexed series map strategies consume.
pub mod data;

/// Defines a Signal, and provides the Strategy trait for handling the generation of them.
/// Contains the StrategyRegistry that assigns stable magic numbers, and an example
/// MomentumStrategy implementation that analyses the latest closes of its primary timeframe.
pub mod strategy;

/// Defines the RiskLimits configuration and a RiskEvaluator that gates trading at bot, symbol and
/// strategy scope using the equity-curve max drawdown of the closed-trade history.
pub mod risk;

/// Defines an OrderRequest, OrderResult, Position and TradeRecord, and provides the OrderExecutor
/// that owns the local position mirror, dispatches market orders and prevents duplicate entries.
pub mod execution;

/// Defines the BrokerClient trait consumed by the engine, the broker error taxonomy, and a
/// SimulatedBroker reference implementation for dry-trading and tests.
pub mod broker;

/// The TradingEngine orchestrating one trading cycle, plus the fixed-interval and candle-aligned
/// loop drivers that run cycles repeatedly until terminated.
pub mod engine;

/// Configuration surface the engine recognises: symbols, risk limits, loop scheduling and data
/// window caps, plus the startup validation rules.
pub mod config;

/// Logging initialisation utilities built on tracing-subscriber.
pub mod logging;

/// Communicates a String is a unique identifier for an instrument symbol (eg/ "EURUSD").
pub type SymbolId = String;
