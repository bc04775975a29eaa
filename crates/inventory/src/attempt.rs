//! Lifecycle of a single transformation attempt.
//!
//! ```text
//! Requested ─validate─▶ Validated ─write both─▶ Committed ─audit─▶ Recorded
//!     │                  │  ▲  │
//!     ▼                  │  └──┘ (re-validated after a concurrent change)
//!  Rejected ◀────────────┘     └──▶ Failed
//! ```
//!
//! `Requested -> Failed` covers a store that cannot even be read.

use koperasi_core::{DomainError, DomainResult};

use crate::error::ErrorKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransformationStage {
    Requested,
    Validated,
    Rejected(ErrorKind),
    Committed,
    Failed,
    Recorded,
}

impl TransformationStage {
    pub fn can_transition_to(self, next: TransformationStage) -> bool {
        use TransformationStage::*;

        matches!(
            (self, next),
            (Requested, Validated)
                | (Requested, Rejected(_))
                | (Requested, Failed)
                | (Validated, Validated)
                | (Validated, Rejected(_))
                | (Validated, Committed)
                | (Validated, Failed)
                | (Committed, Recorded)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransformationStage::Rejected(_) | TransformationStage::Failed | TransformationStage::Recorded
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransformationStage::Requested => "requested",
            TransformationStage::Validated => "validated",
            TransformationStage::Rejected(_) => "rejected",
            TransformationStage::Committed => "committed",
            TransformationStage::Failed => "failed",
            TransformationStage::Recorded => "recorded",
        }
    }
}

/// Tracks the stages one attempt passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationAttempt {
    history: Vec<TransformationStage>,
}

impl TransformationAttempt {
    pub fn new() -> Self {
        Self {
            history: vec![TransformationStage::Requested],
        }
    }

    pub fn stage(&self) -> TransformationStage {
        // `history` is never empty: `new` seeds it and `advance` only pushes.
        self.history
            .last()
            .copied()
            .unwrap_or(TransformationStage::Requested)
    }

    pub fn history(&self) -> &[TransformationStage] {
        &self.history
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: TransformationStage) -> DomainResult<()> {
        let current = self.stage();
        if !current.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "illegal transformation stage change: {} -> {}",
                current.as_str(),
                next.as_str()
            )));
        }
        self.history.push(next);
        Ok(())
    }
}

impl Default for TransformationAttempt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_recorded() {
        let mut attempt = TransformationAttempt::new();
        attempt.advance(TransformationStage::Validated).unwrap();
        attempt.advance(TransformationStage::Committed).unwrap();
        attempt.advance(TransformationStage::Recorded).unwrap();

        assert_eq!(attempt.stage(), TransformationStage::Recorded);
        assert!(attempt.stage().is_terminal());
        assert_eq!(attempt.history().len(), 4);
    }

    #[test]
    fn revalidation_can_reject_before_commit() {
        let mut attempt = TransformationAttempt::new();
        attempt.advance(TransformationStage::Validated).unwrap();
        attempt.advance(TransformationStage::Validated).unwrap();
        attempt
            .advance(TransformationStage::Rejected(ErrorKind::InsufficientStock))
            .unwrap();

        assert_eq!(
            attempt.stage(),
            TransformationStage::Rejected(ErrorKind::InsufficientStock)
        );
    }

    #[test]
    fn cannot_commit_without_validation() {
        let mut attempt = TransformationAttempt::new();
        let err = attempt.advance(TransformationStage::Committed).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(attempt.stage(), TransformationStage::Requested);
    }

    #[test]
    fn terminal_stages_accept_nothing() {
        let mut attempt = TransformationAttempt::new();
        attempt.advance(TransformationStage::Validated).unwrap();
        attempt.advance(TransformationStage::Failed).unwrap();

        assert!(attempt.advance(TransformationStage::Committed).is_err());
        assert!(attempt.advance(TransformationStage::Validated).is_err());
    }
}
