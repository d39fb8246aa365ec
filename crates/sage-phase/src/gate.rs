//! Navigation rules over the phase sequence.
//!
//! Two moves exist: advance to the next phase, and jump to an arbitrary
//! phase. Backward moves are always free. Forward moves are guarded by
//! the completion predicate of every phase being skipped over. Nothing
//! here persists anything; callers own the store write.

use thiserror::Error;

use sage_document::{Document, DocumentKind, Phase};

use crate::predicate::{phase_complete, unmet_requirements};

/// Why a navigation request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Advance was requested from the terminal phase.
    #[error("document is already complete")]
    AlreadyComplete,

    /// The phase does not belong to this document kind's sequence.
    #[error("phase {phase} is not part of a {kind} document")]
    ForeignPhase {
        /// The out-of-sequence phase.
        phase: Phase,
        /// The document's kind.
        kind: DocumentKind,
    },

    /// A phase on the way forward is not finished.
    #[error("phase {phase} is not complete")]
    NotSatisfied {
        /// The first unfinished phase.
        phase: Phase,
        /// What still blocks it, in user-readable terms.
        unmet: Vec<String>,
    },
}

/// The phase to persist if the session advances one phase forward.
pub fn advance(document: &Document) -> Result<Phase, GateError> {
    let kind = document.kind;
    let current = document.current_phase;
    let Some(next) = current.next_in(kind) else {
        if current.is_terminal() {
            return Err(GateError::AlreadyComplete);
        }
        return Err(GateError::ForeignPhase {
            phase: current,
            kind,
        });
    };
    if !phase_complete(document, current) {
        return Err(GateError::NotSatisfied {
            phase: current,
            unmet: unmet_requirements(document, current),
        });
    }
    Ok(next)
}

/// The phase to persist if the session jumps straight to `to`.
///
/// Jumping backward (or staying put) is unguarded. Jumping forward is
/// allowed only when every phase from the current one up to, but not
/// including, `to` is complete.
pub fn jump(document: &Document, to: Phase) -> Result<Phase, GateError> {
    let kind = document.kind;
    let phases = kind.phases();
    let target = phases
        .iter()
        .position(|phase| *phase == to)
        .ok_or(GateError::ForeignPhase { phase: to, kind })?;
    let current = phases
        .iter()
        .position(|phase| *phase == document.current_phase)
        .ok_or(GateError::ForeignPhase {
            phase: document.current_phase,
            kind,
        })?;

    if target <= current {
        return Ok(to);
    }
    for phase in &phases[current..target] {
        if !phase_complete(document, *phase) {
            return Err(GateError::NotSatisfied {
                phase: *phase,
                unmet: unmet_requirements(document, *phase),
            });
        }
    }
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_document::{
        Control, ControlDraft, Document, DocumentKind, Hazard, HazardDraft, Likelihood,
        RiskRating, Severity, Step, StepDraft,
    };

    fn controlled_hazard(step: &mut Step, label: &str) {
        let mut hazard = Hazard::from_draft(
            step.id,
            HazardDraft {
                label: label.to_owned(),
                description: None,
                category_code: Some("GEN-01".to_owned()),
            },
        );
        hazard.rating = RiskRating::new(Severity::Minor, Likelihood::Possible);
        hazard.controls.push(Control::from_draft(
            hazard.id,
            ControlDraft {
                description: "standing procedure".to_owned(),
                kind: None,
                existing: true,
            },
        ));
        step.hazards.push(hazard);
    }

    fn ready_document() -> Document {
        let mut doc = Document::new(DocumentKind::RiskAssessment, "bench work");
        let mut step = Step::from_draft(StepDraft {
            activity: "set up bench".to_owned(),
            notes: None,
        });
        controlled_hazard(&mut step, "sharp edges");
        doc.steps.push(step);
        doc
    }

    #[test]
    fn advance_walks_forward_when_complete() {
        let mut doc = ready_document();
        assert_eq!(advance(&doc), Ok(Phase::HazardIdentification));

        doc.current_phase = Phase::HazardIdentification;
        assert_eq!(advance(&doc), Ok(Phase::RiskRating));
    }

    #[test]
    fn advance_blocks_on_incomplete_phase() {
        let mut doc = ready_document();
        doc.current_phase = Phase::HazardIdentification;
        doc.steps[0].hazards[0].controls.clear();

        let err = advance(&doc).unwrap_err();
        match err {
            GateError::NotSatisfied { phase, unmet } => {
                assert_eq!(phase, Phase::HazardIdentification);
                assert!(!unmet.is_empty());
            }
            other => panic!("wrong error: {other:?}"),
        }

        // Appending an existing control unblocks immediately.
        let hazard_id = doc.steps[0].hazards[0].id;
        doc.steps[0].hazards[0].controls.push(Control::from_draft(
            hazard_id,
            ControlDraft {
                description: "guard rail".to_owned(),
                kind: None,
                existing: true,
            },
        ));
        assert_eq!(advance(&doc), Ok(Phase::RiskRating));
    }

    #[test]
    fn advance_from_complete_is_refused() {
        let mut doc = ready_document();
        doc.current_phase = Phase::Complete;
        assert_eq!(advance(&doc), Err(GateError::AlreadyComplete));
    }

    #[test]
    fn backward_jump_is_never_guarded() {
        let mut doc = Document::new(DocumentKind::RiskAssessment, "empty");
        doc.current_phase = Phase::Actions;
        // Nothing is complete, yet going back is free.
        assert_eq!(jump(&doc, Phase::ProcessSteps), Ok(Phase::ProcessSteps));
        assert_eq!(jump(&doc, Phase::Actions), Ok(Phase::Actions));
    }

    #[test]
    fn forward_jump_checks_every_skipped_phase() {
        let mut doc = ready_document();
        doc.steps[0].hazards[0].rating = RiskRating::default();

        // Process steps and hazard identification pass, risk rating
        // does not, so a jump over it is refused.
        let err = jump(&doc, Phase::ControlDiscussion).unwrap_err();
        match err {
            GateError::NotSatisfied { phase, .. } => assert_eq!(phase, Phase::RiskRating),
            other => panic!("wrong error: {other:?}"),
        }

        doc.steps[0].hazards[0].rating =
            RiskRating::new(Severity::Serious, Likelihood::Unlikely);
        assert_eq!(jump(&doc, Phase::ControlDiscussion), Ok(Phase::ControlDiscussion));
    }

    #[test]
    fn foreign_phase_is_refused() {
        let doc = Document::new(DocumentKind::JobHazardAnalysis, "jha");
        assert_eq!(
            jump(&doc, Phase::ResidualRisk),
            Err(GateError::ForeignPhase {
                phase: Phase::ResidualRisk,
                kind: DocumentKind::JobHazardAnalysis,
            })
        );
    }
}
