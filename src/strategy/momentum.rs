use crate::SymbolId;
use crate::data::market::{OhlcvSeries, Timeframe};
use crate::strategy::{Signal, SignalKind, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Stop-loss placed 0.25% below the entry close.
const STOP_LOSS_FACTOR: f64 = 0.9975;
/// Take-profit placed 0.5% above the entry close.
const TAKE_PROFIT_FACTOR: f64 = 1.005;

/// Configuration for constructing a [`MomentumStrategy`] via the new() constructor method.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Config {
    pub name: String,
    pub timeframes: Vec<Timeframe>,
    pub allowed_symbols: Option<Vec<SymbolId>>,
    pub size: f64,
}

/// Example close-momentum strategy that implements [`Strategy`].
///
/// Watches its primary (first configured) timeframe and emits a BUY whenever the latest close
/// exceeds the previous one, protected by a fixed-percentage stop and target.
#[derive(Clone, PartialEq, Debug)]
pub struct MomentumStrategy {
    name: String,
    timeframes: Vec<Timeframe>,
    allowed_symbols: Option<Vec<SymbolId>>,
    size: f64,
}

impl MomentumStrategy {
    /// Constructs a new [`MomentumStrategy`] component.
    pub fn new(config: Config) -> Self {
        Self {
            name: config.name,
            timeframes: config.timeframes,
            allowed_symbols: config.allowed_symbols,
            size: config.size,
        }
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    fn allowed_symbols(&self) -> Option<&[SymbolId]> {
        self.allowed_symbols.as_deref()
    }

    fn generate_signals(
        &mut self,
        series_by_timeframe: &HashMap<Timeframe, OhlcvSeries>,
    ) -> Vec<Signal> {
        let Some(&timeframe) = self.timeframes.first() else {
            return Vec::new();
        };
        let Some(series) = series_by_timeframe.get(&timeframe) else {
            debug!(strategy = %self.name, %timeframe, "primary timeframe missing from input map");
            return Vec::new();
        };
        if series.len() < 2 {
            debug!(strategy = %self.name, %timeframe, "insufficient bars to generate a signal");
            return Vec::new();
        }
        // The engine only hands over eligible symbols, but stay safe standalone.
        if let Some(allowed) = &self.allowed_symbols
            && !allowed.contains(&series.symbol)
        {
            debug!(strategy = %self.name, symbol = %series.symbol, "symbol not in allowed set");
            return Vec::new();
        }

        let previous = series.bars[series.len() - 2].close;
        let latest = series.bars[series.len() - 1].close;
        if latest <= previous {
            return Vec::new();
        }

        debug!(strategy = %self.name, symbol = %series.symbol, %timeframe, "emitting BUY signal");
        vec![Signal {
            symbol: series.symbol.clone(),
            strategy_name: self.name.clone(),
            timeframe,
            kind: SignalKind::Buy,
            size: self.size,
            stop_loss: Some(latest * STOP_LOSS_FACTOR),
            take_profit: Some(latest * TAKE_PROFIT_FACTOR),
        }]
    }
}
