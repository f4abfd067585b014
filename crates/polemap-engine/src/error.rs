use polemap_core::{InventoryError, LedgerError, PoleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Only raised by exact-identifier search.
    #[error("no pole holds identifier {0:?}")]
    NotFound(String),

    /// A conditional write lost the race. Retry once against the refreshed
    /// record, then surface the conflict to the user.
    #[error("pole {0} was updated concurrently, retry the merge")]
    Conflict(PoleId),

    /// The attempt's dimensions are self-contradictory; the caller must
    /// correct the input. No partial score is ever returned.
    #[error("invalid attempt: {0}")]
    InvalidAttempt(String),

    #[error(transparent)]
    Inventory(InventoryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<InventoryError> for EngineError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Conflict(id) => EngineError::Conflict(id),
            other => EngineError::Inventory(other),
        }
    }
}
