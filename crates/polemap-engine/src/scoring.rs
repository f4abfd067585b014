//! Contribution scoring.
//!
//! `RewardCalculator::compute_points` is a pure function of the attempt's
//! dimensions (location source × photo evidence × identifier presence ×
//! attempt kind) plus one insert-if-absent check against the score ledger for
//! each bonus payout. A ledger `AlreadyExists` answer means the bonus was
//! paid on an earlier submission of the same contribution; it is omitted from
//! the breakdown, never an error.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use polemap_core::{
    AttemptKind, BonusAward, BonusType, CompletionCondition, LedgerKey, LedgerOutcome,
    LocationSource, PendingBonus, PoleRecord, RegistrationAttempt, ScoreBreakdown, ScoreLedger,
};

use crate::error::EngineError;
use crate::validate::validate_attempt;

/// Single source of truth for every point constant.
pub mod points {
    /// GPS-sourced registration with at least one photo.
    pub const GPS_WITH_PHOTO: u32 = 10;
    /// GPS-sourced registration without a photo (completion pending).
    pub const GPS_NO_PHOTO: u32 = 6;
    /// Manually-placed registration with a photo (completion pending).
    pub const MANUAL_WITH_PHOTO: u32 = 3;
    /// Manually-placed registration without a photo.
    pub const MANUAL_NO_PHOTO: u32 = 0;
    /// Registration of a pole carrying no plate (placeholder identifier).
    pub const NO_IDENTIFIER_PLACEHOLDER: u32 = 6;
    /// Manually supplying the identifier of a previously plate-less record.
    pub const IDENTIFIER_COMPLETED: u32 = 10;
    /// Photo added to an existing record.
    pub const PHOTO_SUPPLEMENT: u32 = 3;
    /// Additional plate identifier on a co-mounted pole.
    pub const IDENTIFIER_SUPPLEMENT: u32 = 10;
    /// Full/overview photo bonus, immediate or standalone.
    pub const FULL_PHOTO_BONUS: u32 = 2;

    /// Contributor completion bonus per original scenario.
    pub const COMPLETION_GPS_NO_PHOTO: u32 = 4;
    pub const COMPLETION_MANUAL_WITH_PHOTO: u32 = 2;
    pub const COMPLETION_MANUAL_NO_PHOTO_BY_PHOTO: u32 = 2;
    pub const COMPLETION_MANUAL_NO_PHOTO_BY_VERIFICATION: u32 = 3;

    /// Verifier reward per scenario being verified.
    pub const VERIFY_GPS_WITH_PHOTO: u32 = 2;
    pub const VERIFY_GPS_NO_PHOTO: u32 = 3;
    pub const VERIFY_MANUAL_WITH_PHOTO: u32 = 3;
    pub const VERIFY_MANUAL_NO_PHOTO: u32 = 4;

    /// One point each way per like.
    pub const LIKE_POINT: u32 = 1;
}

/// Tunables around the fixed point table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// A verification inside this window of the pole's previous verification
    /// pays the verifier nothing.
    pub cool_down_days: i64,
    /// Likes a single actor may give per day before likes stop paying.
    pub like_daily_cap: u32,
    /// Independent verifications that complete a pending bonus.
    pub completion_verifications: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cool_down_days: 60,
            like_daily_cap: 10,
            completion_verifications: 3,
        }
    }
}

/// Points for one like: one to the liker, one to the photo owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeAward {
    pub liker_points: u32,
    pub owner_points: u32,
}

pub struct RewardCalculator<'a, L: ScoreLedger> {
    ledger: &'a L,
    config: ScoringConfig,
}

impl<'a, L: ScoreLedger> RewardCalculator<'a, L> {
    pub fn new(ledger: &'a L, config: ScoringConfig) -> Self {
        Self { ledger, config }
    }

    /// Score one accepted registration attempt.
    ///
    /// Base points and immediately-payable bonuses go into the breakdown's
    /// `total`; pending bonuses list what the contributor can still earn and
    /// under which condition.
    pub fn compute_points(
        &self,
        attempt: &RegistrationAttempt,
        now: DateTime<Utc>,
    ) -> Result<ScoreBreakdown, EngineError> {
        validate_attempt(attempt)?;

        let (base_points, pending) = self.base_and_pending(attempt);

        let mut bonuses = Vec::new();
        if attempt.photo_evidence.full
            && let Some(award) = self.try_pay(
                &attempt.contribution_id,
                BonusType::FullPhoto,
                points::FULL_PHOTO_BONUS,
                now,
            )?
        {
            bonuses.push(award);
        }

        let total = base_points + bonuses.iter().map(|b| b.points).sum::<u32>();
        debug!(
            contribution = %attempt.contribution_id,
            base = base_points,
            total,
            pending = pending.len(),
            "scored attempt"
        );
        Ok(ScoreBreakdown {
            base_points,
            bonuses,
            pending,
            total,
        })
    }

    fn base_and_pending(&self, attempt: &RegistrationAttempt) -> (u32, Vec<PendingBonus>) {
        match attempt.kind {
            AttemptKind::SupplementPhoto { .. } => (points::PHOTO_SUPPLEMENT, Vec::new()),
            AttemptKind::SupplementIdentifier { .. } => {
                (points::IDENTIFIER_SUPPLEMENT, Vec::new())
            }
            AttemptKind::CompleteIdentifier { .. } => (points::IDENTIFIER_COMPLETED, Vec::new()),
            AttemptKind::NewPole => {
                if !attempt.has_identifier() {
                    // No plate on the pole; a placeholder identifier is
                    // generated outside the engine.
                    return (points::NO_IDENTIFIER_PLACEHOLDER, Vec::new());
                }
                let has_photo = attempt.photo_evidence.any_photo();
                match (attempt.location_source, has_photo) {
                    (LocationSource::Gps, true) => (points::GPS_WITH_PHOTO, Vec::new()),
                    (LocationSource::Gps, false) => (
                        points::GPS_NO_PHOTO,
                        completion_pending(
                            points::COMPLETION_GPS_NO_PHOTO,
                            points::COMPLETION_GPS_NO_PHOTO,
                        ),
                    ),
                    (LocationSource::Manual, true) => (
                        points::MANUAL_WITH_PHOTO,
                        completion_pending(
                            points::COMPLETION_MANUAL_WITH_PHOTO,
                            points::COMPLETION_MANUAL_WITH_PHOTO,
                        ),
                    ),
                    (LocationSource::Manual, false) => (
                        points::MANUAL_NO_PHOTO,
                        completion_pending(
                            points::COMPLETION_MANUAL_NO_PHOTO_BY_PHOTO,
                            points::COMPLETION_MANUAL_NO_PHOTO_BY_VERIFICATION,
                        ),
                    ),
                }
            }
        }
    }

    /// Pay a pending completion bonus, at most once per contribution.
    ///
    /// Called when either completion condition fires; the
    /// `(contribution_id, Completion)` ledger key guarantees that whichever
    /// condition fires second pays nothing.
    pub fn completion_award(
        &self,
        contribution_id: &str,
        pending: PendingBonus,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusAward>, EngineError> {
        self.try_pay(contribution_id, pending.bonus_type, pending.points, now)
    }

    /// Reward a verifier for a confirming observation of `record`.
    ///
    /// Returns `None` when the pole's previous verification is inside the
    /// cool-down window — the observation still counts toward the
    /// three-verification completion threshold, it just does not pay.
    pub fn verification_award(
        &self,
        contribution_id: &str,
        record: &PoleRecord,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusAward>, EngineError> {
        if let Some(last) = record.last_verified_at
            && now - last < Duration::days(self.config.cool_down_days)
        {
            info!(
                pole = %record.id,
                "verification inside cool-down window, no verifier payout"
            );
            return Ok(None);
        }

        let pts = match (record.location_source, record.evidence.any_photo()) {
            (LocationSource::Gps, true) => points::VERIFY_GPS_WITH_PHOTO,
            (LocationSource::Gps, false) => points::VERIFY_GPS_NO_PHOTO,
            (LocationSource::Manual, true) => points::VERIFY_MANUAL_WITH_PHOTO,
            (LocationSource::Manual, false) => points::VERIFY_MANUAL_NO_PHOTO,
        };
        self.try_pay(contribution_id, BonusType::Verification, pts, now)
    }

    /// Whether `record` has accumulated enough verifications to satisfy the
    /// three-verification completion condition.
    pub fn verification_complete(&self, record: &PoleRecord) -> bool {
        record.verification_count >= self.config.completion_verifications
    }

    /// Points for one like, given how many likes the actor has already given
    /// today. Past the daily cap the like pays neither party.
    pub fn like_award(&self, likes_given_today: u32) -> LikeAward {
        if likes_given_today >= self.config.like_daily_cap {
            return LikeAward {
                liker_points: 0,
                owner_points: 0,
            };
        }
        LikeAward {
            liker_points: points::LIKE_POINT,
            owner_points: points::LIKE_POINT,
        }
    }

    fn try_pay(
        &self,
        contribution_id: &str,
        bonus_type: BonusType,
        pts: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusAward>, EngineError> {
        let key = LedgerKey::new(contribution_id, bonus_type);
        match self.ledger.try_append(key, pts)? {
            LedgerOutcome::Accepted => Ok(Some(BonusAward {
                bonus_type,
                points: pts,
                awarded_at: now,
            })),
            LedgerOutcome::AlreadyExists => {
                debug!(
                    contribution = contribution_id,
                    ?bonus_type,
                    "bonus already paid, omitting"
                );
                Ok(None)
            }
        }
    }
}

/// The two ways a pending completion bonus can later be satisfied, with the
/// amount each path pays. Whichever fires first wins the single
/// `(contribution_id, Completion)` ledger slot.
fn completion_pending(by_photo: u32, by_verification: u32) -> Vec<PendingBonus> {
    vec![
        PendingBonus {
            bonus_type: BonusType::Completion,
            points: by_photo,
            condition: CompletionCondition::SupplementaryPhoto,
        },
        PendingBonus {
            bonus_type: BonusType::Completion,
            points: by_verification,
            condition: CompletionCondition::ThreeVerifications,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;
    use polemap_core::{EvidenceFlags, GeoPoint, PoleId};
    use polemap_store::MemoryLedger;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap()
    }

    fn attempt(
        source: LocationSource,
        photo: bool,
        identifier: Option<&str>,
        contribution: &str,
    ) -> RegistrationAttempt {
        let identifiers: Vec<String> = identifier.map(String::from).into_iter().collect();
        RegistrationAttempt {
            kind: AttemptKind::NewPole,
            location: GeoPoint::new(35.69, 139.70),
            location_source: source,
            plate_count: identifiers.len() as u32,
            identifiers,
            photo_evidence: EvidenceFlags {
                plate: photo,
                ..EvidenceFlags::NONE
            },
            contribution_id: contribution.into(),
        }
    }

    fn record(source: LocationSource, photo: bool) -> PoleRecord {
        PoleRecord {
            id: PoleId(0),
            location: GeoPoint::new(35.69, 139.70),
            location_source: source,
            identifiers: BTreeSet::new(),
            evidence: EvidenceFlags {
                plate: photo,
                ..EvidenceFlags::NONE
            },
            verification_count: 0,
            last_verified_at: None,
            version: 1,
        }
    }

    #[test]
    fn gps_with_photo_scores_ten() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(&attempt(LocationSource::Gps, true, Some("A1"), "c-1"), now())
            .unwrap();
        assert_eq!(breakdown.base_points, 10);
        assert!(breakdown.bonuses.is_empty());
        assert!(breakdown.pending.is_empty());
        assert_eq!(breakdown.total, 10);
    }

    #[test]
    fn gps_with_full_photo_scores_twelve() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, Some("A1"), "c-1");
        a.photo_evidence.full = true;
        let breakdown = calc.compute_points(&a, now()).unwrap();
        assert_eq!(breakdown.base_points, 10);
        assert_eq!(breakdown.bonuses.len(), 1);
        assert_eq!(breakdown.bonuses[0].bonus_type, BonusType::FullPhoto);
        assert_eq!(breakdown.total, 12);
    }

    #[test]
    fn gps_without_photo_scores_six_with_pending_four() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(&attempt(LocationSource::Gps, false, Some("A1"), "c-1"), now())
            .unwrap();
        assert_eq!(breakdown.base_points, 6);
        assert_eq!(breakdown.total, 6);
        assert!(breakdown.pending.iter().all(|p| p.points == 4));
        assert_eq!(breakdown.pending.len(), 2);
    }

    #[test]
    fn manual_with_photo_scores_three_with_pending_two() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(
                &attempt(LocationSource::Manual, true, Some("A1"), "c-1"),
                now(),
            )
            .unwrap();
        assert_eq!(breakdown.base_points, 3);
        assert!(breakdown.pending.iter().all(|p| p.points == 2));
    }

    #[test]
    fn manual_without_photo_scores_zero_with_two_path_pending() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(
                &attempt(LocationSource::Manual, false, Some("A1"), "c-1"),
                now(),
            )
            .unwrap();
        assert_eq!(breakdown.base_points, 0);
        assert_eq!(breakdown.total, 0);

        let by_photo = breakdown
            .pending
            .iter()
            .find(|p| p.condition == CompletionCondition::SupplementaryPhoto)
            .unwrap();
        let by_verification = breakdown
            .pending
            .iter()
            .find(|p| p.condition == CompletionCondition::ThreeVerifications)
            .unwrap();
        assert_eq!(by_photo.points, 2);
        assert_eq!(by_verification.points, 3);
    }

    #[test]
    fn placeholder_registration_scores_six() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(&attempt(LocationSource::Gps, true, None, "c-1"), now())
            .unwrap();
        assert_eq!(breakdown.base_points, 6);
    }

    #[test]
    fn completing_an_identifier_scores_ten() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, Some("A1"), "c-1");
        a.kind = AttemptKind::CompleteIdentifier {
            target: PoleId(0),
        };
        let breakdown = calc.compute_points(&a, now()).unwrap();
        assert_eq!(breakdown.base_points, 10);
    }

    #[test]
    fn photo_supplement_scores_three() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, None, "c-1");
        a.kind = AttemptKind::SupplementPhoto {
            target: PoleId(0),
        };
        let breakdown = calc.compute_points(&a, now()).unwrap();
        assert_eq!(breakdown.base_points, 3);
        assert_eq!(breakdown.total, 3);
    }

    #[test]
    fn co_mounted_identifier_scores_ten() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, Some("B2"), "c-1");
        a.kind = AttemptKind::SupplementIdentifier {
            target: PoleId(0),
        };
        let breakdown = calc.compute_points(&a, now()).unwrap();
        assert_eq!(breakdown.base_points, 10);
    }

    #[test]
    fn resubmission_does_not_double_pay_full_photo() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, Some("A1"), "c-1");
        a.photo_evidence.full = true;

        let first = calc.compute_points(&a, now()).unwrap();
        assert_eq!(first.total, 12);

        // Same contribution id submitted again: bonus is omitted, not an error.
        let second = calc.compute_points(&a, now()).unwrap();
        assert_eq!(second.base_points, 10);
        assert!(second.bonuses.is_empty());
        assert_eq!(second.total, 10);
        assert_eq!(ledger.total_for("c-1"), 2);
    }

    #[test]
    fn completion_pays_once_whichever_path_fires_first() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let breakdown = calc
            .compute_points(
                &attempt(LocationSource::Manual, false, Some("A1"), "c-1"),
                now(),
            )
            .unwrap();

        let by_photo = breakdown.pending[0];
        let by_verification = breakdown.pending[1];

        let paid = calc.completion_award("c-1", by_photo, now()).unwrap();
        assert_eq!(paid.unwrap().points, 2);

        // Three verifications accumulate later; the slot is already taken.
        let second = calc.completion_award("c-1", by_verification, now()).unwrap();
        assert!(second.is_none());
        assert_eq!(ledger.total_for("c-1"), 2);
    }

    #[test]
    fn verifier_reward_depends_on_scenario() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let cases = [
            (LocationSource::Gps, true, 2),
            (LocationSource::Gps, false, 3),
            (LocationSource::Manual, true, 3),
            (LocationSource::Manual, false, 4),
        ];
        for (i, (source, photo, expected)) in cases.into_iter().enumerate() {
            let award = calc
                .verification_award(&format!("v-{i}"), &record(source, photo), now())
                .unwrap()
                .unwrap();
            assert_eq!(award.points, expected);
            assert_eq!(award.bonus_type, BonusType::Verification);
        }
    }

    #[test]
    fn verification_inside_cool_down_pays_nothing() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut rec = record(LocationSource::Gps, true);
        rec.last_verified_at = Some(now() - Duration::days(10));

        let award = calc.verification_award("v-1", &rec, now()).unwrap();
        assert!(award.is_none());
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn verification_after_cool_down_pays_again() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut rec = record(LocationSource::Gps, true);
        rec.last_verified_at = Some(now() - Duration::days(61));

        let award = calc.verification_award("v-1", &rec, now()).unwrap();
        assert_eq!(award.unwrap().points, 2);
    }

    #[test]
    fn cooled_down_verification_still_counts_toward_completion() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut rec = record(LocationSource::Manual, false);
        rec.verification_count = 3;
        rec.last_verified_at = Some(now() - Duration::days(1));
        assert!(calc.verification_complete(&rec));
    }

    #[test]
    fn like_cap_applies_to_giver() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let under = calc.like_award(9);
        assert_eq!((under.liker_points, under.owner_points), (1, 1));
        let over = calc.like_award(10);
        assert_eq!((over.liker_points, over.owner_points), (0, 0));
    }

    #[test]
    fn contradictory_attempt_is_rejected_without_partial_score() {
        let ledger = MemoryLedger::new();
        let calc = RewardCalculator::new(&ledger, ScoringConfig::default());
        let mut a = attempt(LocationSource::Gps, true, Some("A1"), "c-1");
        a.plate_count = 0;
        a.photo_evidence.full = true;

        let err = calc.compute_points(&a, now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAttempt(_)));
        // Rejection must not have touched the ledger.
        assert!(ledger.entries().is_empty());
    }
}
