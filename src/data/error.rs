use crate::SymbolId;
use crate::broker::BrokerError;
use crate::data::market::Timeframe;
use thiserror::Error;

/// All errors generated in the cyclebot::data module. Data errors are per-symbol and non-fatal:
/// the cycle engine logs them and skips the symbol for the remainder of the cycle.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("fetching bars from the broker failed: {0}")]
    Fetch(#[from] BrokerError),

    #[error("broker returned no data for symbol {0}")]
    Empty(SymbolId),

    #[error("broker returned a misaligned {timeframe} series for symbol {symbol}")]
    Misaligned {
        symbol: SymbolId,
        timeframe: Timeframe,
    },
}
