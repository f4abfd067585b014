//! Pole identity resolution.
//!
//! Decides whether an incoming registration attempt refers to a pole already
//! in the inventory or to a new one. Per attempt the flow is
//! `Unchecked → AutoNew` when nothing is nearby, otherwise
//! `Unchecked → AwaitingDecision → {Merged | New}` — the engine never guesses
//! between co-located poles. "Awaiting" is not a blocking wait: the candidate
//! list is returned to the caller, who re-invokes [`ProximityMatcher::resolve`]
//! with the human decision.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use polemap_core::{
    GeoPoint, InventoryError, NewPole, PoleId, PoleInventory, PolePatch, PoleRecord,
    RegistrationAttempt, normalize,
};

use crate::error::EngineError;
use crate::validate::validate_attempt;

/// Radii for dedup and verification eligibility, in metres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Candidates inside this radius trigger the human decision step.
    pub dedup_radius_m: f64,
    /// Records inside this radius are eligible targets for verification.
    pub verification_radius_m: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            dedup_radius_m: 5.0,
            verification_radius_m: 50.0,
        }
    }
}

/// A nearby record, paired with its distance from the attempt's location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub record: PoleRecord,
    pub distance_m: f64,
}

/// The human caller's answer to a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// The attempt observes the existing pole `target`.
    Same { target: PoleId },
    /// A distinct pole, even though it stands inside the dedup radius.
    Different,
}

/// Outcome of one `resolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// A fresh record was created.
    New { record: PoleRecord },
    /// The attempt was merged into an existing record.
    Merged { record: PoleRecord },
    /// Nearby records exist; the caller must decide and re-invoke.
    AwaitingDecision { candidates: Vec<Candidate> },
}

/// Identity resolution over a pole inventory.
pub struct ProximityMatcher<'a, I: PoleInventory> {
    inventory: &'a I,
    config: MatcherConfig,
}

impl<'a, I: PoleInventory> ProximityMatcher<'a, I> {
    pub fn new(inventory: &'a I, config: MatcherConfig) -> Self {
        Self { inventory, config }
    }

    /// All records within `radius_m` of `location`, sorted ascending by
    /// distance with ties broken by lowest record id.
    ///
    /// The ordering is deterministic: repeated calls on unchanged data return
    /// the same list.
    pub fn match_candidates(
        &self,
        location: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Candidate>, EngineError> {
        let mut candidates: Vec<Candidate> = self
            .inventory
            .within_radius(location, radius_m)?
            .into_iter()
            .map(|(record, distance_m)| Candidate { record, distance_m })
            .collect();
        candidates.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then(a.record.id.cmp(&b.record.id))
        });
        Ok(candidates)
    }

    /// Resolve one registration attempt.
    ///
    /// For a `NewPole` attempt this runs the dedup flow; supplement and
    /// completion attempts merge straight into their named target. `decision`
    /// is only consulted when candidates were found on a previous call.
    pub fn resolve(
        &self,
        attempt: &RegistrationAttempt,
        decision: Option<Decision>,
    ) -> Result<Resolution, EngineError> {
        validate_attempt(attempt)?;

        if let Some(target) = attempt.kind.target() {
            let record = self.merge_into(target, attempt)?;
            return Ok(Resolution::Merged { record });
        }

        let candidates = self.match_candidates(attempt.location, self.config.dedup_radius_m)?;
        if candidates.is_empty() {
            let record = self.create(attempt)?;
            info!(id = %record.id, "no candidates in dedup radius, auto-created");
            return Ok(Resolution::New { record });
        }

        match decision {
            None => {
                debug!(
                    count = candidates.len(),
                    "candidates found, awaiting caller decision"
                );
                Ok(Resolution::AwaitingDecision { candidates })
            }
            Some(Decision::Different) => {
                // Co-located poles of different ownership are legal.
                let record = self.create(attempt)?;
                info!(id = %record.id, "caller decided different, created alongside");
                Ok(Resolution::New { record })
            }
            Some(Decision::Same { target }) => {
                // The decision must answer the candidate list that was
                // surfaced, not name an arbitrary record.
                if !candidates.iter().any(|c| c.record.id == target) {
                    return Err(EngineError::InvalidAttempt(format!(
                        "decision target {target} is not a dedup candidate here"
                    )));
                }
                let record = self.merge_into(target, attempt)?;
                Ok(Resolution::Merged { record })
            }
        }
    }

    /// Records whose location makes them eligible for verification from
    /// `location`. Identifier-independent; never enters the dedup flow.
    pub fn verification_eligible(
        &self,
        location: GeoPoint,
    ) -> Result<Vec<Candidate>, EngineError> {
        self.match_candidates(location, self.config.verification_radius_m)
    }

    /// Exact canonical-identifier search.
    ///
    /// The query is normalized before lookup (normalization is idempotent, so
    /// already-canonical input is unchanged). No radius, no fuzziness.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<PoleRecord, EngineError> {
        let canonical = normalize(identifier);
        self.inventory
            .find_by_identifier(&canonical)?
            .ok_or(EngineError::NotFound(canonical))
    }

    fn create(&self, attempt: &RegistrationAttempt) -> Result<PoleRecord, EngineError> {
        let record = self.inventory.insert(NewPole {
            location: attempt.location,
            location_source: attempt.location_source,
            identifiers: attempt.canonical_identifiers(),
            evidence: attempt.photo_evidence,
        })?;
        Ok(record)
    }

    /// Read-modify-write merge under optimistic concurrency.
    ///
    /// The patch is conditional on the version read here; a losing write
    /// surfaces as [`EngineError::Conflict`] with the record untouched.
    fn merge_into(
        &self,
        target: PoleId,
        attempt: &RegistrationAttempt,
    ) -> Result<PoleRecord, EngineError> {
        let current = self
            .inventory
            .read(target)?
            .ok_or(InventoryError::NotFound(target))?;

        let patch = PolePatch {
            add_identifiers: attempt.canonical_identifiers(),
            add_evidence: attempt.photo_evidence,
            record_verification: None,
        };
        let merged = self
            .inventory
            .write_if_version(target, current.version, patch)
            .inspect_err(|e| {
                if matches!(e, InventoryError::Conflict(_)) {
                    info!(id = %target, "merge lost conditional write");
                }
            })?;
        debug!(id = %target, version = merged.version, "merged attempt into record");
        Ok(merged)
    }
}
