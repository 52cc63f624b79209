/// Example close-momentum strategy implementation.
pub mod momentum;

/// Registry assigning each strategy a stable broker-visible magic number.
pub mod registry;

use crate::SymbolId;
use crate::data::market::{OhlcvSeries, Timeframe};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generates trade [`Signal`]s from timeframe-indexed bar series.
///
/// A strategy declares the timeframes it needs and, optionally, the symbols it is restricted to;
/// the engine fetches data accordingly and only invokes the strategy for symbols it is eligible
/// for. Strategies are pure functions of their input map in the reference design; any state kept
/// across calls is their own responsibility.
pub trait Strategy: Send {
    /// Unique strategy name, stable for the process lifetime.
    fn name(&self) -> &str;

    /// Timeframes this strategy requires in its input map.
    fn timeframes(&self) -> &[Timeframe];

    /// Optional restriction of the symbols this strategy trades. `None` trades every symbol.
    fn allowed_symbols(&self) -> Option<&[SymbolId]> {
        None
    }

    /// Analyse the provided series and return zero or more signals.
    fn generate_signals(
        &mut self,
        series_by_timeframe: &HashMap<Timeframe, OhlcvSeries>,
    ) -> Vec<Signal>;
}

/// Describes the action a [`Signal`] is endorsing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum SignalKind {
    Buy,
    Sell,
    Close,
    Hold,
}

impl SignalKind {
    /// Determines if a [`SignalKind`] opens a new position (buy or sell).
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalKind::Buy | SignalKind::Sell)
    }
}

/// Trade intent produced by a strategy, consumed by the cycle engine within the same cycle.
/// Never persisted.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Signal {
    pub symbol: SymbolId,
    pub strategy_name: String,
    pub timeframe: Timeframe,
    pub kind: SignalKind,
    /// Order volume, always positive.
    pub size: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kinds_are_buy_and_sell() {
        assert!(SignalKind::Buy.is_entry());
        assert!(SignalKind::Sell.is_entry());
        assert!(!SignalKind::Close.is_entry());
        assert!(!SignalKind::Hold.is_entry());
    }
}
