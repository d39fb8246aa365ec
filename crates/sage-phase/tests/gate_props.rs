use proptest::prelude::*;

use sage_document::{
    Control, ControlDraft, Document, DocumentKind, Hazard, HazardDraft, Likelihood, Phase,
    RiskRating, Severity, Step, StepDraft,
};
use sage_phase::{advance, jump, phase_complete, GateError};

fn kind_strategy() -> impl Strategy<Value = DocumentKind> {
    prop_oneof![
        Just(DocumentKind::RiskAssessment),
        Just(DocumentKind::JobHazardAnalysis),
        Just(DocumentKind::IncidentInvestigation),
    ]
}

/// Builds a document with a variable amount of content so predicates
/// land on both sides.
fn document_strategy() -> impl Strategy<Value = Document> {
    (
        kind_strategy(),
        0usize..4,                   // steps
        0usize..3,                   // hazards per step
        prop::bool::ANY,             // categorized
        prop::bool::ANY,             // has existing control
        prop::bool::ANY,             // rated
    )
        .prop_map(|(kind, steps, hazards, categorized, controlled, rated)| {
            let mut doc = Document::new(kind, "generated");
            for s in 0..steps {
                let mut step = Step::from_draft(StepDraft {
                    activity: format!("step {s}"),
                    notes: None,
                });
                for h in 0..hazards {
                    let mut hazard = Hazard::from_draft(
                        step.id,
                        HazardDraft {
                            label: format!("hazard {s}.{h}"),
                            description: None,
                            category_code: categorized.then(|| "GEN-01".to_owned()),
                        },
                    );
                    if controlled {
                        hazard.controls.push(Control::from_draft(
                            hazard.id,
                            ControlDraft {
                                description: "procedure".to_owned(),
                                kind: None,
                                existing: true,
                            },
                        ));
                    }
                    if rated {
                        hazard.rating = RiskRating::new(Severity::Minor, Likelihood::Unlikely);
                        hazard.residual_rating =
                            RiskRating::new(Severity::Negligible, Likelihood::Rare);
                    }
                    step.hazards.push(hazard);
                }
                doc.steps.push(step);
            }
            doc
        })
}

fn phase_strategy(doc: &Document) -> impl Strategy<Value = Phase> {
    let phases = doc.kind.phases().to_vec();
    (0..phases.len()).prop_map(move |i| phases[i])
}

proptest! {
    /// Going backward, or staying put, never fails.
    #[test]
    fn backward_jump_always_succeeds(doc in document_strategy(), steps_back in 0usize..7) {
        let phases = doc.kind.phases();
        let mut doc = doc;
        // Park the document somewhere in its sequence.
        let at = phases.len() - 1;
        doc.current_phase = phases[at];
        let target = phases[at.saturating_sub(steps_back)];
        prop_assert_eq!(jump(&doc, target), Ok(target));
    }

    /// Advance succeeds exactly when the current predicate holds (and
    /// there is somewhere to go).
    #[test]
    fn advance_agrees_with_predicate(doc in document_strategy()) {
        let result = advance(&doc);
        let complete = phase_complete(&doc, doc.current_phase);
        match result {
            Ok(next) => {
                prop_assert!(complete);
                prop_assert_eq!(Some(next), doc.current_phase.next_in(doc.kind));
            }
            Err(GateError::NotSatisfied { phase, unmet }) => {
                prop_assert!(!complete);
                prop_assert_eq!(phase, doc.current_phase);
                prop_assert!(!unmet.is_empty());
            }
            Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
        }
    }

    /// A forward jump that succeeds implies every skipped phase was
    /// complete.
    #[test]
    fn forward_jump_implies_skipped_phases_complete(
        (doc, to) in document_strategy().prop_flat_map(|doc| {
            let phases = phase_strategy(&doc);
            (Just(doc), phases)
        })
    ) {
        let phases = doc.kind.phases();
        let current = phases
            .iter()
            .position(|p| *p == doc.current_phase)
            .expect("fresh documents start inside their own sequence");
        if jump(&doc, to).is_ok() {
            let target = phases.iter().position(|p| *p == to).expect("phase from sequence");
            for phase in &phases[current..target.max(current)] {
                prop_assert!(phase_complete(&doc, *phase), "skipped {phase} while incomplete");
            }
        }
    }
}
