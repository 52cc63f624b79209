use crate::SymbolId;
use crate::strategy::registry::MagicNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currently-open broker position as mirrored locally.
///
/// Positions registered locally on an accepted BUY/SELL carry an `entry_price` of 0 until the
/// next sync overwrites it with the broker's authoritative fill price, so `entry_price` must not
/// feed P&L arithmetic before a sync has refreshed it.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Position {
    pub symbol: SymbolId,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub strategy_name: String,
    pub open_time: DateTime<Utc>,
    pub magic_number: Option<MagicNumber>,
}

impl Position {
    /// Mirror key this position is stored under.
    pub fn key(&self) -> PositionKey {
        PositionKey::new(&self.symbol, self.magic_number)
    }
}

/// Key of the local position mirror: `(symbol, magic number)` when the order carried a magic
/// number, the symbol alone otherwise. Tagged keys allow concurrent positions on one symbol
/// from distinct strategies.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum PositionKey {
    Tagged { symbol: SymbolId, magic: MagicNumber },
    Untagged(SymbolId),
}

impl PositionKey {
    pub fn new(symbol: &str, magic: Option<MagicNumber>) -> Self {
        match magic {
            Some(magic) => PositionKey::Tagged {
                symbol: symbol.to_owned(),
                magic,
            },
            None => PositionKey::Untagged(symbol.to_owned()),
        }
    }
}
