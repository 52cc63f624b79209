use crate::broker::{BrokerClient, BrokerError};
use crate::data::market::{Bar, OhlcvSeries, Timeframe};
use crate::execution::position::Position;
use crate::execution::trade::TradeRecord;
use crate::execution::{OrderKind, OrderRequest, OrderResult};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Configuration for constructing a [`SimulatedBroker`] via the new() constructor method.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct Config {
    /// First close of every generated series.
    pub start_price: f64,
    /// Per-bar close increment; positive values produce a steadily rising tape.
    pub drift: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_price: 1.0,
            drift: 0.0001,
        }
    }
}

/// In-process [`BrokerClient`] that simulates a brokerage for dry-trading & tests.
///
/// Candles are synthesised on demand, aligned to the requested timeframe over the requested
/// window. Accepted BUY/SELL orders open positions keyed by `(symbol, magic number)`, CLOSE
/// removes them, and every request is recorded for inspection. Closed trades are whatever the
/// caller staged via [`stage_closed_trade`].
///
/// [`stage_closed_trade`]: SimulatedBroker::stage_closed_trade
#[derive(Debug, Default)]
pub struct SimulatedBroker {
    config: Config,
    state: Mutex<SimulatedState>,
}

#[derive(Debug, Default)]
struct SimulatedState {
    orders_sent: Vec<OrderRequest>,
    open_positions: Vec<Position>,
    closed_trades: Vec<TradeRecord>,
    next_order_id: i64,
}

impl SimulatedBroker {
    /// Constructs a new [`SimulatedBroker`] component.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(SimulatedState::default()),
        }
    }

    /// Stages a closed trade that future `get_closed_trades` calls will return.
    pub fn stage_closed_trade(&self, trade: TradeRecord) {
        self.state.lock().closed_trades.push(trade);
    }

    /// Snapshot of every order received so far, in dispatch order.
    pub fn orders_sent(&self) -> Vec<OrderRequest> {
        self.state.lock().orders_sent.clone()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().orders_sent.len()
    }

    /// Snapshot of the currently open simulated positions.
    pub fn open_positions(&self) -> Vec<Position> {
        self.state.lock().open_positions.clone()
    }
}

impl BrokerClient for SimulatedBroker {
    fn connect(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    fn get_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<OhlcvSeries, BrokerError> {
        let step = timeframe.duration();
        let step_secs = timeframe.minutes() * 60;

        // First aligned bar at or after `start`.
        let mut time = start - TimeDelta::seconds(start.timestamp().rem_euclid(step_secs));
        if time < start {
            time += step;
        }

        let mut bars = Vec::new();
        let mut close = self.config.start_price;
        while time <= end {
            let open = close;
            close += self.config.drift;
            bars.push(Bar {
                time,
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume: 1.0,
            });
            time += step;
        }

        Ok(OhlcvSeries::new(symbol, timeframe, bars))
    }

    fn send_market_order(&self, request: &OrderRequest) -> Result<OrderResult, BrokerError> {
        let mut state = self.state.lock();
        state.orders_sent.push(request.clone());
        state.next_order_id += 1;

        match request.kind {
            OrderKind::Buy | OrderKind::Sell => state.open_positions.push(Position {
                symbol: request.symbol.clone(),
                volume: request.volume,
                entry_price: self.config.start_price,
                stop_loss: request.stop_loss,
                take_profit: request.take_profit,
                strategy_name: request.comment.clone().unwrap_or_default(),
                open_time: Utc::now(),
                magic_number: request.magic_number,
            }),
            OrderKind::Close => state.open_positions.retain(|position| {
                position.symbol != request.symbol
                    || (request.magic_number.is_some()
                        && position.magic_number != request.magic_number)
            }),
        }

        Ok(OrderResult {
            success: true,
            order_id: Some(state.next_order_id),
            error_message: None,
        })
    }

    fn get_open_positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(self.state.lock().open_positions.clone())
    }

    fn get_closed_trades(&self) -> Result<Vec<TradeRecord>, BrokerError> {
        Ok(self.state.lock().closed_trades.clone())
    }
}
