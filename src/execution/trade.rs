use crate::SymbolId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completed round-trip trade carrying realised PnL; the input the risk evaluator works over.
/// `entry_time <= exit_time` holds for records produced by well-behaved brokers.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct TradeRecord {
    pub symbol: SymbolId,
    pub strategy_name: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub pnl: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// History-deduplication key. Brokers returning identical tuples for genuinely distinct trades
/// are deduplicated incorrectly; the 4-tuple is the contract and is deliberately not widened.
pub type TradeKey = (DateTime<Utc>, DateTime<Utc>, SymbolId, String);

impl TradeRecord {
    pub fn key(&self) -> TradeKey {
        (
            self.entry_time,
            self.exit_time,
            self.symbol.clone(),
            self.strategy_name.clone(),
        )
    }
}
