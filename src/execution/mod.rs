/// Cyclebot execution module specific errors.
pub mod error;

/// Dispatches market orders and owns the local position mirror.
pub mod executor;

/// Open broker positions and the mirror key scheme.
pub mod position;

/// Completed round-trip trade records.
pub mod trade;

use crate::SymbolId;
use crate::strategy::registry::MagicNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order action at the broker boundary. The broker is responsible for mapping [`OrderKind::Close`]
/// to an inverse order on the existing position identified by `(symbol, magic_number)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Buy,
    Sell,
    Close,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderKind::Buy => "BUY",
            OrderKind::Sell => "SELL",
            OrderKind::Close => "CLOSE",
        })
    }
}

/// Market order request sent to the broker.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct OrderRequest {
    pub symbol: SymbolId,
    /// Order volume, always positive.
    pub volume: f64,
    pub kind: OrderKind,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Free-form traceability comment; brokers may truncate it, which is why attribution relies
    /// on the magic number instead.
    pub comment: Option<String>,
    pub magic_number: Option<MagicNumber>,
}

/// Outcome of a broker dispatch. Rejections surface here (`success == false` plus a message)
/// rather than as transport errors.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct OrderResult {
    pub success: bool,
    pub order_id: Option<i64>,
    pub error_message: Option<String>,
}
