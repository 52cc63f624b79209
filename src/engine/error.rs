use crate::config::ConfigError;
use crate::data::error::DataError;
use crate::execution::error::ExecutionError;
use thiserror::Error;

/// All errors generated in the cyclebot::engine module.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to build struct due to incomplete attributes provided")]
    BuilderIncomplete,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("market data unavailable: {0}")]
    Data(#[from] DataError),

    #[error("order dispatch failed: {0}")]
    Execution(#[from] ExecutionError),
}
