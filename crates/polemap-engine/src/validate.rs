//! Boundary validation of registration attempts.
//!
//! The web layer hands over whatever the client sent; anything whose
//! dimensions contradict each other is rejected here as `InvalidAttempt`
//! before the matcher or the calculator look at it.

use polemap_core::{AttemptKind, RegistrationAttempt};

use crate::error::EngineError;

pub fn validate_attempt(attempt: &RegistrationAttempt) -> Result<(), EngineError> {
    if attempt.plate_count == 0 && !attempt.identifiers.is_empty() {
        return Err(EngineError::InvalidAttempt(
            "identifiers supplied but plate_count is 0".into(),
        ));
    }
    if attempt.identifiers.len() as u32 > attempt.plate_count {
        return Err(EngineError::InvalidAttempt(format!(
            "{} identifiers exceed plate_count {}",
            attempt.identifiers.len(),
            attempt.plate_count
        )));
    }
    if attempt.contribution_id.is_empty() {
        return Err(EngineError::InvalidAttempt(
            "contribution_id must not be empty".into(),
        ));
    }

    match attempt.kind {
        AttemptKind::NewPole => Ok(()),
        AttemptKind::SupplementPhoto { .. } => {
            if !attempt.photo_evidence.any_photo() {
                return Err(EngineError::InvalidAttempt(
                    "photo supplement carries no photo evidence".into(),
                ));
            }
            Ok(())
        }
        AttemptKind::SupplementIdentifier { .. } | AttemptKind::CompleteIdentifier { .. } => {
            if attempt.identifiers.is_empty() {
                return Err(EngineError::InvalidAttempt(
                    "identifier contribution carries no identifiers".into(),
                ));
            }
            Ok(())
        }
    }
}
