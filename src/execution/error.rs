use crate::broker::BrokerError;
use thiserror::Error;

/// All errors generated in the cyclebot::execution module. Broker rejections are not errors and
/// surface in the returned OrderResult instead.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("broker transport failure during order dispatch: {0}")]
    Transport(#[from] BrokerError),
}
