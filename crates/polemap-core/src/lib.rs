pub mod contracts;
pub mod geo;
pub mod normalize;
pub mod types;

pub use contracts::{
    InventoryError, LedgerError, LedgerKey, LedgerOutcome, PoleInventory, ScoreLedger,
};
pub use geo::{GeoPoint, distance_m};
pub use normalize::normalize;
pub use types::{
    AttemptKind, BonusAward, BonusType, CompletionCondition, EvidenceFlags, Identifier,
    LocationSource, NewPole, PendingBonus, PoleId, PolePatch, PoleRecord, RegistrationAttempt,
    ScoreBreakdown,
};
