/// Simulated broker implementation for dry-trading & tests.
pub mod simulated;

use crate::data::market::{OhlcvSeries, Timeframe};
use crate::execution::position::Position;
use crate::execution::trade::TradeRecord;
use crate::execution::{OrderRequest, OrderResult};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Brokerage abstraction the engine trades through. Implementations own the concrete transport
/// (terminal session, REST, FIX, ...) and are responsible for reconnecting after transient
/// failures; the engine assumes the next call may succeed.
pub trait BrokerClient {
    /// Establishes the session with the brokerage.
    fn connect(&self) -> Result<(), BrokerError>;

    /// Returns an OHLCV series for `symbol` at `timeframe` over `[start, end]`, aligned to the
    /// timeframe and tagged with the symbol.
    fn get_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<OhlcvSeries, BrokerError>;

    /// Dispatches a market order. Broker rejections are reported inside the [`OrderResult`];
    /// transport failures surface as errors.
    fn send_market_order(&self, request: &OrderRequest) -> Result<OrderResult, BrokerError>;

    /// Returns the authoritative list of currently open positions.
    fn get_open_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Returns recently closed trades. Brokers without this endpoint signal
    /// [`BrokerError::Unsupported`], which the engine treats as "no new information".
    fn get_closed_trades(&self) -> Result<Vec<TradeRecord>, BrokerError>;
}

/// All errors generated at the broker boundary.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("broker connection failure: {0}")]
    Connection(String),

    #[error("broker data failure: {0}")]
    Data(String),

    #[error("broker does not support {0}")]
    Unsupported(&'static str),
}
