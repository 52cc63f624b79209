use crate::broker::BrokerClient;
use crate::execution::error::ExecutionError;
use crate::execution::position::{Position, PositionKey};
use crate::execution::{OrderKind, OrderRequest, OrderResult};
use crate::strategy::registry::MagicNumber;
use chrono::Utc;
use fnv::FnvHashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owns the local mirror of open positions, sends market orders, and answers whether a position
/// already exists for a `(symbol, magic number)` pair.
///
/// The mirror is an optimistic cache: accepted orders update it immediately, and [`sync`]
/// replaces it wholesale with the broker's authoritative view at the start of every cycle.
///
/// [`sync`]: OrderExecutor::sync
#[derive(Debug)]
pub struct OrderExecutor<Broker> {
    broker: Arc<Broker>,
    open_positions: FnvHashMap<PositionKey, Position>,
}

impl<Broker> OrderExecutor<Broker>
where
    Broker: BrokerClient,
{
    /// Constructs a new [`OrderExecutor`] with an empty mirror.
    pub fn new(broker: Arc<Broker>) -> Self {
        Self {
            broker,
            open_positions: FnvHashMap::default(),
        }
    }

    /// Replaces the mirror with the broker's authoritative position list.
    ///
    /// On broker error the mirror is left untouched: a transient outage must not produce false
    /// negatives in duplicate checks.
    pub fn sync(&mut self) {
        match self.broker.get_open_positions() {
            Ok(positions) => {
                self.open_positions.clear();
                for position in positions {
                    self.open_positions.insert(position.key(), position);
                }
                debug!(
                    open_positions = self.open_positions.len(),
                    "position mirror synchronised with broker"
                );
            }
            Err(err) => {
                error!(%err, "failed to synchronise positions, keeping local mirror");
            }
        }
    }

    /// Dispatches `request` to the broker and applies an accepted outcome to the mirror:
    /// BUY/SELL registers a position (entry price 0 until the next sync), CLOSE removes the
    /// matching entry. Rejections leave the mirror unchanged and surface in the returned
    /// [`OrderResult`]; transport failures propagate.
    pub fn execute(&mut self, request: OrderRequest) -> Result<OrderResult, ExecutionError> {
        info!(
            symbol = %request.symbol,
            kind = %request.kind,
            volume = request.volume,
            magic = request.magic_number,
            "sending market order"
        );

        let result = self.broker.send_market_order(&request)?;
        if !result.success {
            error!(
                symbol = %request.symbol,
                reason = result.error_message.as_deref().unwrap_or("unknown"),
                "order rejected by broker"
            );
            return Ok(result);
        }
        debug!(order_id = result.order_id, "order accepted");

        match request.kind {
            OrderKind::Buy | OrderKind::Sell => self.register_position(&request),
            OrderKind::Close => self.remove_position(&request.symbol, request.magic_number),
        }

        Ok(result)
    }

    /// Is there an open position for `symbol`? Supplying the magic number makes this a direct
    /// key probe; without it the mirror is scanned by symbol and optional strategy-name prefix,
    /// the legacy fallback for positions opened before magic numbers were attached.
    pub fn has_open_position(
        &self,
        symbol: &str,
        strategy_name: Option<&str>,
        magic_number: Option<MagicNumber>,
    ) -> bool {
        if let Some(magic) = magic_number {
            return self
                .open_positions
                .contains_key(&PositionKey::new(symbol, Some(magic)));
        }

        self.open_positions.values().any(|position| {
            position.symbol == symbol
                && strategy_name.is_none_or(|name| position.strategy_name.starts_with(name))
        })
    }

    pub fn open_position_count(&self) -> usize {
        self.open_positions.len()
    }

    /// Mirrored positions, in no particular order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.open_positions.values()
    }

    fn register_position(&mut self, request: &OrderRequest) {
        let position = Position {
            symbol: request.symbol.clone(),
            volume: request.volume,
            // Placeholder until the next sync restores the broker's fill price.
            entry_price: 0.0,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            strategy_name: request
                .comment
                .clone()
                .unwrap_or_else(|| String::from("unknown")),
            open_time: Utc::now(),
            magic_number: request.magic_number,
        };
        let key = position.key();
        debug!(?key, "position registered locally");
        self.open_positions.insert(key, position);
    }

    fn remove_position(&mut self, symbol: &str, magic_number: Option<MagicNumber>) {
        match magic_number {
            Some(magic) => {
                let key = PositionKey::new(symbol, Some(magic));
                if self.open_positions.remove(&key).is_none() {
                    warn!(symbol, magic, "no position found to remove");
                }
            }
            None => {
                // Fallback when attribution is unavailable: drop every entry on the symbol.
                self.open_positions
                    .retain(|_, position| position.symbol != symbol);
                debug!(symbol, "positions removed for symbol");
            }
        }
    }
}
