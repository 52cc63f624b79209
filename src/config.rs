use crate::SymbolId;
use crate::data::handler::BarCaps;
use crate::data::market::Timeframe;
use crate::risk::RiskLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration of one tradable instrument. Immutable after construction.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SymbolConfig {
    /// Symbol/ticker name at the broker.
    pub name: SymbolId,
    /// Finest resolution the broker can deliver for this instrument; resampling produces any
    /// coarser timeframe from it.
    pub min_timeframe: Timeframe,
    /// Default lot size for orders on this instrument.
    pub lot_size: f64,
}

impl SymbolConfig {
    /// Constructs a new [`SymbolConfig`] for the provided instrument.
    pub fn new(name: impl Into<SymbolId>, min_timeframe: Timeframe, lot_size: f64) -> Self {
        Self {
            name: name.into(),
            min_timeframe,
            lot_size,
        }
    }
}

/// Loop driver selection.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    /// Run a cycle, sleep a fixed number of seconds, repeat. No drift compensation.
    Interval { sleep_seconds: u64 },
    /// Run a cycle shortly after every candle-close boundary.
    CandleAligned {
        timeframe_minutes: u32,
        wait_after_close_seconds: u32,
    },
}

/// Complete configuration surface the engine recognises.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Config {
    pub symbols: Vec<SymbolConfig>,
    pub risk: RiskLimits,
    pub schedule: Schedule,
    #[serde(default)]
    pub bar_caps: BarCaps,
    /// Consumed by the bootstrap to choose between the live transport and the simulated broker.
    #[serde(default)]
    pub use_real_broker: bool,
}

impl Config {
    /// Validates the startup invariants. Violations are fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::EmptySymbols);
        }
        validate_risk_limits(&self.risk)
    }
}

pub(crate) fn validate_risk_limits(limits: &RiskLimits) -> Result<(), ConfigError> {
    if limits.initial_balance <= 0.0 {
        return Err(ConfigError::NonPositiveInitialBalance(
            limits.initial_balance,
        ));
    }
    for pct in limits
        .dd_global
        .iter()
        .chain(limits.dd_per_symbol.values())
        .chain(limits.dd_per_strategy.values())
        .copied()
    {
        if !(0.0..=100.0).contains(&pct) {
            return Err(ConfigError::InvalidDrawdownLimit(pct));
        }
    }
    Ok(())
}

/// All errors generated while validating configuration. Fatal at startup.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum ConfigError {
    #[error("unknown timeframe: '{0}'")]
    UnknownTimeframe(String),

    #[error("initial balance must be positive, got {0}")]
    NonPositiveInitialBalance(f64),

    #[error("drawdown limits are percentages in [0, 100], got {0}")]
    InvalidDrawdownLimit(f64),

    #[error("no symbols configured")]
    EmptySymbols,

    #[error("no strategies configured")]
    EmptyStrategies,
}
