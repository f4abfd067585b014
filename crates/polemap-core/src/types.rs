//! Shared domain types for the pole registry.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::normalize::normalize;

// ── Identity ──

/// Stable id of a pole record, assigned by the inventory collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoleId(pub u64);

impl fmt::Display for PoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pole-{}", self.0)
    }
}

/// An identifier as printed on a pole's plate.
///
/// `raw` is what the contributor typed; `canonical` is its normalized form.
/// Equality, ordering, and hashing are defined on `canonical` only — the sole
/// identifier-matching key in the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    pub raw: String,
    pub canonical: String,
}

impl Identifier {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let canonical = normalize(&raw);
        Self { raw, canonical }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

// ── Evidence ──

/// Photo evidence attached to a pole or an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFlags {
    /// Close-up of the identification plate.
    pub plate: bool,
    /// Full/overview shot showing the whole pole.
    pub full: bool,
    /// Detail shot (fittings, damage, etc.).
    pub detail: bool,
}

impl EvidenceFlags {
    pub const NONE: Self = Self {
        plate: false,
        full: false,
        detail: false,
    };

    pub fn any_photo(&self) -> bool {
        self.plate || self.full || self.detail
    }

    /// Set union with another evidence set.
    pub fn union(self, other: Self) -> Self {
        Self {
            plate: self.plate || other.plate,
            full: self.full || other.full,
            detail: self.detail || other.detail,
        }
    }
}

// ── Records ──

/// A registered pole, owned by the inventory collaborator.
///
/// Created on an accepted "new" decision, mutated only by merges on accepted
/// "same" decisions and by verification bookkeeping. Never deleted by this
/// engine; removal is an external moderation concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoleRecord {
    pub id: PoleId,
    pub location: GeoPoint,
    /// Source of the registering attempt's location; verification rewards
    /// depend on it for the lifetime of the record.
    pub location_source: LocationSource,
    pub identifiers: BTreeSet<Identifier>,
    pub evidence: EvidenceFlags,
    pub verification_count: u32,
    pub last_verified_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency token; bumped on every successful write.
    pub version: u64,
}

/// Payload for creating a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPole {
    pub location: GeoPoint,
    pub location_source: LocationSource,
    pub identifiers: BTreeSet<Identifier>,
    pub evidence: EvidenceFlags,
}

/// Conditional patch applied through `write_if_version`.
///
/// All fields are additive: identifiers and evidence are unioned into the
/// record, a verification stamps the clock and bumps the counter. A patch is
/// applied atomically or not at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolePatch {
    pub add_identifiers: BTreeSet<Identifier>,
    pub add_evidence: EvidenceFlags,
    pub record_verification: Option<DateTime<Utc>>,
}

// ── Attempts ──

/// Where the attempt's location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Device geolocation at capture time.
    Gps,
    /// Placed by hand on a map.
    Manual,
}

/// What kind of contribution this attempt is.
///
/// An explicit tagged variant instead of an `is_additional` flag, so invalid
/// dimension combinations are unrepresentable or rejected up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptKind {
    /// First registration of a pole.
    NewPole,
    /// Photo added to an already-registered pole.
    SupplementPhoto { target: PoleId },
    /// Additional plate identifier on a co-mounted pole.
    SupplementIdentifier { target: PoleId },
    /// Manual supply of an identifier for a pole registered without one.
    CompleteIdentifier { target: PoleId },
}

impl AttemptKind {
    /// The existing record this attempt supplements, if any.
    pub fn target(&self) -> Option<PoleId> {
        match *self {
            Self::NewPole => None,
            Self::SupplementPhoto { target }
            | Self::SupplementIdentifier { target }
            | Self::CompleteIdentifier { target } => Some(target),
        }
    }
}

/// One contribution, as received from the web layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationAttempt {
    pub kind: AttemptKind,
    pub location: GeoPoint,
    pub location_source: LocationSource,
    /// Raw plate strings; may be empty when the pole carries no plate.
    pub identifiers: Vec<String>,
    pub plate_count: u32,
    pub photo_evidence: EvidenceFlags,
    /// Caller-supplied idempotency key for all payouts of this contribution.
    pub contribution_id: String,
}

impl RegistrationAttempt {
    /// Normalized, deduplicated identifiers of this attempt.
    pub fn canonical_identifiers(&self) -> BTreeSet<Identifier> {
        self.identifiers.iter().map(Identifier::new).collect()
    }

    pub fn has_identifier(&self) -> bool {
        !self.identifiers.is_empty()
    }
}

// ── Scoring output ──

/// Kinds of ledger entries a contribution can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    /// The base award itself, when appended to the external ledger.
    Base,
    /// Full/overview photo bonus.
    FullPhoto,
    /// Contributor's completion bonus, paid once whichever condition fires first.
    Completion,
    /// Verifier's reward for a confirming observation.
    Verification,
    /// +1 to the actor who gave a like.
    LikeGiven,
    /// +1 to the photo owner who received a like.
    LikeReceived,
}

/// A bonus that has been paid (ledger accepted the key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusAward {
    pub bonus_type: BonusType,
    pub points: u32,
    pub awarded_at: DateTime<Utc>,
}

/// What has to happen later for a pending completion bonus to pay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCondition {
    /// A supplementary photo is added to the pole.
    SupplementaryPhoto,
    /// Three independent verifications accumulate.
    ThreeVerifications,
}

/// A bonus the contributor can still earn once a condition is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingBonus {
    pub bonus_type: BonusType,
    pub points: u32,
    pub condition: CompletionCondition,
}

/// Point award for one contribution.
///
/// `total` covers base plus *paid* bonuses; pending bonuses pay later through
/// their own ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_points: u32,
    pub bonuses: Vec<BonusAward>,
    pub pending: Vec<PendingBonus>,
    pub total: u32,
}
