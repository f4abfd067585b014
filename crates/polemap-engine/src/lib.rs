//! Pole identity resolution and contribution scoring.
//!
//! A synchronous library invoked by the web layer: it normalizes plate
//! identifiers, decides whether an observation targets an existing pole, and
//! computes deterministic point awards. Persistence, HTTP, sessions, and
//! image handling all live behind the collaborator traits in `polemap-core`.

pub mod error;
pub mod matcher;
pub mod scoring;
pub mod validate;

pub use error::EngineError;
pub use matcher::{Candidate, Decision, MatcherConfig, ProximityMatcher, Resolution};
pub use scoring::{LikeAward, RewardCalculator, ScoringConfig, points};
pub use validate::validate_attempt;
