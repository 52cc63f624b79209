/// Equity-curve max drawdown calculation.
pub mod drawdown;

use crate::SymbolId;
use crate::execution::trade::TradeRecord;
use crate::risk::drawdown::max_drawdown_pct;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Layered drawdown limits applied to the bot. All drawdown fields are percentages in [0, 100];
/// an unset or absent limit disables that gate. `initial_balance` seeds the equity curve and
/// must be positive.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct RiskLimits {
    /// Maximum drawdown tolerated across the whole account.
    pub dd_global: Option<f64>,
    /// Maximum drawdown tolerated per symbol.
    #[serde(default)]
    pub dd_per_symbol: HashMap<SymbolId, f64>,
    /// Maximum drawdown tolerated per strategy.
    #[serde(default)]
    pub dd_per_strategy: HashMap<String, f64>,
    /// Account balance the equity curve starts from.
    pub initial_balance: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            dd_global: None,
            dd_per_symbol: HashMap::new(),
            dd_per_strategy: HashMap::new(),
            initial_balance: 10_000.0,
        }
    }
}

/// Decides whether the bot, a symbol, or a strategy may open new orders.
///
/// All evaluations are pure over the provided trade history, which is assumed chronologically
/// ordered by exit time ascending. Gate failures are reported through the returned boolean; the
/// evaluator never raises and never mutates state.
#[derive(Clone, PartialEq, Debug)]
pub struct RiskEvaluator {
    limits: RiskLimits,
}

impl RiskEvaluator {
    /// Constructs a new [`RiskEvaluator`] from the provided limits.
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// `true` if no global limit is configured or the account drawdown stays within it.
    pub fn bot_allowed(&self, trades: &[TradeRecord]) -> bool {
        let Some(limit) = self.limits.dd_global else {
            return true;
        };
        let drawdown = max_drawdown_pct(
            self.limits.initial_balance,
            trades.iter().map(|trade| trade.pnl),
        );
        let allowed = drawdown <= limit;
        if !allowed {
            warn!(drawdown, limit, "global drawdown limit exceeded");
        }
        allowed
    }

    /// `true` if no limit is configured for `symbol` or its trade subset stays within it.
    pub fn symbol_allowed(&self, symbol: &str, trades: &[TradeRecord]) -> bool {
        let Some(&limit) = self.limits.dd_per_symbol.get(symbol) else {
            return true;
        };
        let drawdown = max_drawdown_pct(
            self.limits.initial_balance,
            trades
                .iter()
                .filter(|trade| trade.symbol == symbol)
                .map(|trade| trade.pnl),
        );
        let allowed = drawdown <= limit;
        if !allowed {
            warn!(symbol, drawdown, limit, "symbol drawdown limit exceeded");
        }
        allowed
    }

    /// `true` if no limit is configured for `strategy` or its trade subset stays within it.
    pub fn strategy_allowed(&self, strategy: &str, trades: &[TradeRecord]) -> bool {
        let Some(&limit) = self.limits.dd_per_strategy.get(strategy) else {
            return true;
        };
        let drawdown = max_drawdown_pct(
            self.limits.initial_balance,
            trades
                .iter()
                .filter(|trade| trade.strategy_name == strategy)
                .map(|trade| trade.pnl),
        );
        let allowed = drawdown <= limit;
        if !allowed {
            warn!(strategy, drawdown, limit, "strategy drawdown limit exceeded");
        }
        allowed
    }
}
