//! Collaborator contracts at the engine boundary.
//!
//! The engine is a library; persistence, sessions, and HTTP all live in the
//! surrounding application. These traits are the whole surface it needs from
//! that application: a pole inventory with conditional writes and an
//! insert-if-absent score ledger. Both are synchronous and request-scoped —
//! no background work happens inside the engine.

use thiserror::Error;

use crate::geo::GeoPoint;
use crate::types::{BonusType, NewPole, PoleId, PolePatch, PoleRecord};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("pole {0} not found")]
    NotFound(PoleId),

    /// The record's version moved under a conditional write. Retryable.
    #[error("version conflict on pole {0}")]
    Conflict(PoleId),

    #[error("inventory backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Read/write access to the pole inventory.
///
/// `within_radius` may return candidates in any order; the matcher sorts.
/// `write_if_version` must apply the patch atomically iff the stored version
/// still equals `version`, and bump the version on success.
pub trait PoleInventory {
    fn read(&self, id: PoleId) -> Result<Option<PoleRecord>, InventoryError>;

    /// All records whose location lies within `radius_m` metres of `center`,
    /// paired with their great-circle distance.
    fn within_radius(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<(PoleRecord, f64)>, InventoryError>;

    /// Exact canonical-identifier lookup. No radius, no fuzziness.
    fn find_by_identifier(&self, canonical: &str) -> Result<Option<PoleRecord>, InventoryError>;

    fn insert(&self, pole: NewPole) -> Result<PoleRecord, InventoryError>;

    fn write_if_version(
        &self,
        id: PoleId,
        version: u64,
        patch: PolePatch,
    ) -> Result<PoleRecord, InventoryError>;
}

/// Idempotency key for one payout: a bonus type within one contribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub contribution_id: String,
    pub bonus_type: BonusType,
}

impl LedgerKey {
    pub fn new(contribution_id: impl Into<String>, bonus_type: BonusType) -> Self {
        Self {
            contribution_id: contribution_id.into(),
            bonus_type,
        }
    }
}

/// Outcome of an insert-if-absent append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Accepted,
    /// The key was already present; the payout has happened before.
    AlreadyExists,
}

/// Append-only score ledger with at-most-once semantics per key.
pub trait ScoreLedger {
    fn try_append(&self, key: LedgerKey, points: u32) -> Result<LedgerOutcome, LedgerError>;
}
