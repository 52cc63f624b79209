/// Loop drivers that run trading cycles repeatedly until terminated.
pub mod driver;

/// Cyclebot engine module specific errors.
pub mod error;

use crate::broker::{BrokerClient, BrokerError};
use crate::config::{ConfigError, SymbolConfig, validate_risk_limits};
use crate::data::handler::{BarCaps, MarketDataService};
use crate::data::market::Timeframe;
use crate::engine::error::EngineError;
use crate::execution::executor::OrderExecutor;
use crate::execution::trade::{TradeKey, TradeRecord};
use crate::execution::{OrderKind, OrderRequest};
use crate::risk::{RiskEvaluator, RiskLimits};
use crate::strategy::registry::{MagicNumber, StrategyRegistry};
use crate::strategy::{Signal, SignalKind, Strategy};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Coordinates one full trading cycle: reconcile with the broker, apply the layered risk gates,
/// fetch & resample market data per symbol, collect strategy signals, and dispatch orders with
/// duplicate suppression.
///
/// The engine is single-threaded and cooperative: a cycle runs to completion on the calling
/// thread, and all mutable state (position mirror, registry, trade history) is owned exclusively
/// by the engine.
pub struct TradingEngine<Broker>
where
    Broker: BrokerClient,
{
    engine_id: Uuid,
    broker: Arc<Broker>,
    market_data: MarketDataService<Broker>,
    risk: RiskEvaluator,
    executor: OrderExecutor<Broker>,
    strategies: Vec<Box<dyn Strategy>>,
    symbols: Vec<SymbolConfig>,
    registry: StrategyRegistry,
    history: Vec<TradeRecord>,
    seen_trades: HashSet<TradeKey>,
}

impl<Broker> TradingEngine<Broker>
where
    Broker: BrokerClient,
{
    /// Returns a [`TradingEngineBuilder`] instance.
    pub fn builder() -> TradingEngineBuilder<Broker> {
        TradingEngineBuilder::new()
    }

    /// Executes one trading cycle at `now`. The phase ordering is part of the contract:
    /// reconcile happens before any risk check, risk checks before data fetch, data fetch before
    /// signal generation, and signal generation before any dispatch for that strategy & symbol.
    ///
    /// Per-symbol failures are logged and the cycle continues with the next symbol; only
    /// failures outside the symbol pipeline would surface in the returned result.
    pub fn run_once(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        info!(engine_id = %self.engine_id, %now, "starting trading cycle");

        self.executor.sync();
        self.reconcile_history();

        if !self.risk.bot_allowed(&self.history) {
            warn!("trading halted by the global risk gate");
            return Ok(());
        }

        for index in 0..self.symbols.len() {
            let symbol = self.symbols[index].clone();
            if let Err(err) = self.process_symbol(&symbol, now) {
                error!(
                    symbol = %symbol.name,
                    %err,
                    "cycle failed for symbol, continuing with the next"
                );
            }
        }

        Ok(())
    }

    /// Strategy registry holding the magic-number assignments of this engine.
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Closed-trade history accumulated so far, ordered as received from the broker.
    pub fn history(&self) -> &[TradeRecord] {
        &self.history
    }

    /// Pulls closed trades from the broker and appends the ones not seen before, deduplicated
    /// on `(entry_time, exit_time, symbol, strategy_name)`. Brokers without closed-trade
    /// retrieval leave the history unchanged.
    fn reconcile_history(&mut self) {
        match self.broker.get_closed_trades() {
            Ok(trades) => {
                for trade in trades {
                    if self.seen_trades.insert(trade.key()) {
                        debug!(
                            symbol = %trade.symbol,
                            strategy = %trade.strategy_name,
                            pnl = trade.pnl,
                            "closed trade appended to history"
                        );
                        self.history.push(trade);
                    }
                }
            }
            Err(BrokerError::Unsupported(operation)) => {
                debug!(operation, "broker does not report closed trades, history unchanged");
            }
            Err(err) => error!(%err, "failed to refresh trade history"),
        }
    }

    fn process_symbol(
        &mut self,
        symbol: &SymbolConfig,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !self.risk.symbol_allowed(&symbol.name, &self.history) {
            info!(symbol = %symbol.name, "symbol blocked by its drawdown limit");
            return Ok(());
        }

        let required = self.required_timeframes(symbol);
        if required.is_empty() {
            debug!(symbol = %symbol.name, "no producible timeframes required, skipping symbol");
            return Ok(());
        }

        let window = self.market_data.window_for(&required);
        let series_by_timeframe = self
            .market_data
            .get(symbol, &required, now - window, now)?;

        for index in 0..self.strategies.len() {
            if !strategy_is_eligible(self.strategies[index].as_ref(), &symbol.name) {
                debug!(
                    strategy = self.strategies[index].name(),
                    symbol = %symbol.name,
                    "strategy not eligible for symbol"
                );
                continue;
            }

            let name = self.strategies[index].name().to_owned();
            if !self.risk.strategy_allowed(&name, &self.history) {
                info!(strategy = %name, "strategy blocked by its drawdown limit");
                continue;
            }

            let signals = self.strategies[index].generate_signals(&series_by_timeframe);
            debug!(
                strategy = %name,
                symbol = %symbol.name,
                signals = signals.len(),
                "strategy produced signals"
            );

            let magic = match self.registry.magic_of(&name) {
                Some(magic) => magic,
                None => {
                    warn!(strategy = %name, "strategy missing from registry, registering lazily");
                    self.registry.register(&name)
                }
            };

            for signal in &signals {
                self.dispatch_signal(signal, magic)?;
            }
        }

        Ok(())
    }

    fn dispatch_signal(&mut self, signal: &Signal, magic: MagicNumber) -> Result<(), EngineError> {
        match signal.kind {
            SignalKind::Buy => self.dispatch_entry(signal, OrderKind::Buy, magic),
            SignalKind::Sell => self.dispatch_entry(signal, OrderKind::Sell, magic),
            SignalKind::Close => self.dispatch_close(signal, magic),
            SignalKind::Hold => {
                debug!(
                    symbol = %signal.symbol,
                    strategy = %signal.strategy_name,
                    "hold signal ignored"
                );
                Ok(())
            }
        }
    }

    fn dispatch_entry(
        &mut self,
        signal: &Signal,
        kind: OrderKind,
        magic: MagicNumber,
    ) -> Result<(), EngineError> {
        if self
            .executor
            .has_open_position(&signal.symbol, Some(&signal.strategy_name), Some(magic))
        {
            debug!(
                %kind,
                symbol = %signal.symbol,
                strategy = %signal.strategy_name,
                "signal ignored, position already open"
            );
            return Ok(());
        }

        let result = self.executor.execute(order_request(signal, kind, magic))?;
        if result.success {
            info!(
                order_id = result.order_id,
                symbol = %signal.symbol,
                strategy = %signal.strategy_name,
                "order executed"
            );
        }
        Ok(())
    }

    fn dispatch_close(&mut self, signal: &Signal, magic: MagicNumber) -> Result<(), EngineError> {
        if !self
            .executor
            .has_open_position(&signal.symbol, Some(&signal.strategy_name), Some(magic))
        {
            debug!(
                symbol = %signal.symbol,
                strategy = %signal.strategy_name,
                "close signal ignored, no open position"
            );
            return Ok(());
        }

        let result = self
            .executor
            .execute(order_request(signal, OrderKind::Close, magic))?;
        if result.success {
            info!(
                order_id = result.order_id,
                symbol = %signal.symbol,
                strategy = %signal.strategy_name,
                "position closed"
            );
        }
        Ok(())
    }

    /// Union of the timeframes required by strategies eligible for `symbol`, with anything finer
    /// than the symbol's base resolution dropped (it cannot be produced by resampling).
    fn required_timeframes(&self, symbol: &SymbolConfig) -> BTreeSet<Timeframe> {
        let mut required = BTreeSet::new();
        for strategy in &self.strategies {
            if strategy_is_eligible(strategy.as_ref(), &symbol.name) {
                required.extend(strategy.timeframes().iter().copied());
            }
        }

        let (producible, dropped): (BTreeSet<Timeframe>, BTreeSet<Timeframe>) = required
            .into_iter()
            .partition(|timeframe| *timeframe >= symbol.min_timeframe);
        if !dropped.is_empty() {
            warn!(
                symbol = %symbol.name,
                ?dropped,
                "dropping required timeframes finer than the symbol's base resolution"
            );
        }
        producible
    }
}

fn strategy_is_eligible(strategy: &dyn Strategy, symbol: &str) -> bool {
    strategy
        .allowed_symbols()
        .is_none_or(|symbols| symbols.iter().any(|allowed| allowed == symbol))
}

fn order_request(signal: &Signal, kind: OrderKind, magic: MagicNumber) -> OrderRequest {
    OrderRequest {
        symbol: signal.symbol.clone(),
        volume: signal.size,
        kind,
        stop_loss: signal.stop_loss,
        take_profit: signal.take_profit,
        comment: Some(format!("{}-{}", signal.strategy_name, signal.timeframe)),
        magic_number: Some(magic),
    }
}

/// Builder to construct [`TradingEngine`] instances.
pub struct TradingEngineBuilder<Broker> {
    broker: Option<Arc<Broker>>,
    symbols: Option<Vec<SymbolConfig>>,
    strategies: Option<Vec<Box<dyn Strategy>>>,
    risk_limits: Option<RiskLimits>,
    bar_caps: Option<BarCaps>,
}

impl<Broker> TradingEngineBuilder<Broker>
where
    Broker: BrokerClient,
{
    pub fn new() -> Self {
        Self {
            broker: None,
            symbols: None,
            strategies: None,
            risk_limits: None,
            bar_caps: None,
        }
    }

    pub fn broker(self, value: Arc<Broker>) -> Self {
        Self {
            broker: Some(value),
            ..self
        }
    }

    pub fn symbols(self, value: Vec<SymbolConfig>) -> Self {
        Self {
            symbols: Some(value),
            ..self
        }
    }

    pub fn strategies(self, value: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies: Some(value),
            ..self
        }
    }

    pub fn risk_limits(self, value: RiskLimits) -> Self {
        Self {
            risk_limits: Some(value),
            ..self
        }
    }

    pub fn bar_caps(self, value: BarCaps) -> Self {
        Self {
            bar_caps: Some(value),
            ..self
        }
    }

    /// Validates the configuration, registers every strategy, and constructs the engine.
    pub fn build(self) -> Result<TradingEngine<Broker>, EngineError> {
        let broker = self.broker.ok_or(EngineError::BuilderIncomplete)?;
        let symbols = self.symbols.ok_or(EngineError::BuilderIncomplete)?;
        let strategies = self.strategies.ok_or(EngineError::BuilderIncomplete)?;
        let risk_limits = self.risk_limits.ok_or(EngineError::BuilderIncomplete)?;
        let bar_caps = self.bar_caps.unwrap_or_default();

        if symbols.is_empty() {
            return Err(ConfigError::EmptySymbols.into());
        }
        if strategies.is_empty() {
            return Err(ConfigError::EmptyStrategies.into());
        }
        validate_risk_limits(&risk_limits)?;

        let mut registry = StrategyRegistry::new();
        for strategy in &strategies {
            registry.register(strategy.name());
        }

        let engine_id = Uuid::new_v4();
        info!(
            %engine_id,
            symbols = symbols.len(),
            strategies = strategies.len(),
            "constructed new TradingEngine instance"
        );

        Ok(TradingEngine {
            engine_id,
            market_data: MarketDataService::new(Arc::clone(&broker), bar_caps),
            executor: OrderExecutor::new(Arc::clone(&broker)),
            broker,
            risk: RiskEvaluator::new(risk_limits),
            strategies,
            symbols,
            registry,
            history: Vec::new(),
            seen_trades: HashSet::new(),
        })
    }
}

impl<Broker> Default for TradingEngineBuilder<Broker>
where
    Broker: BrokerClient,
{
    fn default() -> Self {
        Self::new()
    }
}
