//! Settled batch results.
//!
//! `apply_batch` never throws for a per-command failure; it always
//! hands back one of these so the caller can say "3 of 5 commands
//! applied" instead of interrupting the sequential flow.

use sage_command::{Intent, Target};

use crate::apply::ApplyError;

/// How one batch went, in aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every surviving command applied cleanly.
    Applied,
    /// Some commands applied, some were dropped or failed.
    PartiallyApplied,
    /// Nothing changed in the document.
    NothingApplied,
    /// The collaborator needs an answer before anything can apply.
    ClarificationNeeded,
}

/// One command that resolved or persisted badly.
#[derive(Debug)]
pub struct CommandFailure {
    /// Position in the applied batch.
    pub index: usize,
    /// The command's intent.
    pub intent: Intent,
    /// The command's target.
    pub target: Target,
    /// Why it was skipped.
    pub reason: ApplyError,
}

/// The settled result of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Commands that reached the applier.
    pub attempted: usize,
    /// Commands whose store writes all succeeded.
    pub applied: usize,
    /// Commands dropped earlier, at validation.
    pub dropped: usize,
    /// Commands skipped during application, with reasons.
    pub failures: Vec<CommandFailure>,
    /// Collaborator's summary of the batch, also tagging the undo slot.
    pub summary: Option<String>,
    /// Question to surface when the batch is a clarification round.
    pub clarification: Option<String>,
    /// True when the refetched document differs from the pre-batch
    /// snapshot. A bundle that lands some sub-edits before failing
    /// counts as zero applied commands but still mutates the store;
    /// this flag is what notices.
    pub mutated: bool,
}

impl BatchReport {
    /// The aggregate outcome.
    #[must_use]
    pub fn outcome(&self) -> BatchOutcome {
        if self.clarification.is_some() {
            BatchOutcome::ClarificationNeeded
        } else if self.applied == 0 && !self.mutated {
            BatchOutcome::NothingApplied
        } else if self.failures.is_empty() && self.dropped == 0 && self.applied > 0 {
            BatchOutcome::Applied
        } else {
            BatchOutcome::PartiallyApplied
        }
    }

    /// Commands that could not be applied, dropped and failed together.
    /// This is the "N commands could not be applied" number.
    #[must_use]
    pub fn not_applied(&self) -> usize {
        self.dropped + self.failures.len()
    }

    /// True when the document changed, counting partial bundles.
    #[must_use]
    pub fn changed_document(&self) -> bool {
        self.applied > 0 || self.mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_reflects_the_counts() {
        let mut report = BatchReport {
            attempted: 2,
            applied: 2,
            ..BatchReport::default()
        };
        assert_eq!(report.outcome(), BatchOutcome::Applied);

        report.dropped = 1;
        assert_eq!(report.outcome(), BatchOutcome::PartiallyApplied);
        assert_eq!(report.not_applied(), 1);

        report.applied = 0;
        assert_eq!(report.outcome(), BatchOutcome::NothingApplied);
        assert!(!report.changed_document());

        report.clarification = Some("which step?".to_owned());
        assert_eq!(report.outcome(), BatchOutcome::ClarificationNeeded);
    }

    #[test]
    fn half_landed_bundle_still_reads_as_a_change() {
        let report = BatchReport {
            attempted: 1,
            applied: 0,
            mutated: true,
            failures: vec![CommandFailure {
                index: 0,
                intent: Intent::Add,
                target: Target::Multiple,
                reason: ApplyError::IncompletePayload { field: "label" },
            }],
            ..BatchReport::default()
        };
        assert_eq!(report.outcome(), BatchOutcome::PartiallyApplied);
        assert!(report.changed_document());
        assert_eq!(report.not_applied(), 1);
    }
}
