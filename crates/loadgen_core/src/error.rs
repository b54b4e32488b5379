//! Top-level error of the simulation engine.
//!
//! Every variant is fatal to a run: the remote dispatch system and the
//! engine's view of it can no longer be trusted to agree. Recoverable
//! conditions (no free rider, failed cancellation) never surface here.

use crate::backend::BackendError;
use crate::orders::OrderId;
use crate::params::ParamsError;
use crate::sampling::SamplingError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid simulation parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("trip sampling failed: {0}")]
    Sampling(#[from] SamplingError),

    #[error("dispatch backend call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("backend returned order id {0}, which is already active")]
    DuplicateOrder(OrderId),
}
