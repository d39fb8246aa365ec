//! Completion predicates, one per phase.
//!
//! A predicate looks at the live document and answers "is there
//! anything left to do in this phase". Predicates gate forward
//! navigation only; no predicate ever blocks an edit.

use sage_document::{Document, Phase};

/// True when the phase has nothing left to do for this document.
#[must_use]
pub fn phase_complete(document: &Document, phase: Phase) -> bool {
    unmet_requirements(document, phase).is_empty()
}

/// What still blocks completion of `phase`, in user-readable terms.
/// Empty means complete.
#[must_use]
pub fn unmet_requirements(document: &Document, phase: Phase) -> Vec<String> {
    let mut unmet = Vec::new();
    match phase {
        Phase::ProcessSteps | Phase::Timeline => {
            if document.steps.is_empty() {
                unmet.push(match phase {
                    Phase::Timeline => "no timeline events recorded".to_owned(),
                    _ => "no process steps recorded".to_owned(),
                });
            }
            for step in &document.steps {
                if step.activity.trim().is_empty() {
                    unmet.push(format!("step {} has no activity text", step.order_index + 1));
                }
            }
        }
        Phase::HazardIdentification => {
            if document.hazards().count() == 0 {
                unmet.push("no hazards identified".to_owned());
            }
            for hazard in document.hazards() {
                if hazard.category_code.is_none() {
                    unmet.push(format!("hazard {:?} has no category", hazard.label));
                }
                if !hazard.controls.iter().any(|control| control.existing) {
                    unmet.push(format!("hazard {:?} has no existing control", hazard.label));
                }
            }
        }
        Phase::CauseAnalysis => {
            if document.hazards().count() == 0 {
                unmet.push("no causes identified".to_owned());
            }
            for cause in document.hazards() {
                if cause.category_code.is_none() {
                    unmet.push(format!("cause {:?} has no category", cause.label));
                }
            }
        }
        Phase::RiskRating => {
            for hazard in document.hazards() {
                if !hazard.rating.is_complete() {
                    unmet.push(format!("hazard {:?} is not fully rated", hazard.label));
                }
            }
        }
        Phase::ControlDiscussion => {
            for hazard in document.hazards() {
                if hazard.controls.is_empty() {
                    unmet.push(format!("hazard {:?} has no controls", hazard.label));
                }
                for control in &hazard.controls {
                    if control.description.trim().is_empty() {
                        unmet.push(format!(
                            "a control on hazard {:?} has no description",
                            hazard.label
                        ));
                    }
                }
            }
        }
        Phase::ResidualRisk => {
            for hazard in document.hazards() {
                if !hazard.residual_rating.is_complete() {
                    unmet.push(format!("hazard {:?} has no residual rating", hazard.label));
                }
            }
        }
        Phase::Actions | Phase::CorrectiveActions => {
            for action in &document.actions {
                if action.owner.is_none() {
                    unmet.push(format!("action {:?} has no owner", action.description));
                }
                if action.due_date.is_none() {
                    unmet.push(format!("action {:?} has no due date", action.description));
                }
            }
            for hazard in document.hazards() {
                let needs_action = hazard
                    .effective_rating()
                    .level()
                    .is_some_and(|level| level.requires_action());
                if needs_action && document.actions_for(hazard.id).next().is_none() {
                    unmet.push(format!(
                        "hazard {:?} is rated high or critical but has no action",
                        hazard.label
                    ));
                }
            }
        }
        Phase::Complete => {}
    }
    unmet
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_document::{
        Action, ActionDraft, Control, ControlDraft, Document, DocumentKind, Hazard, HazardDraft,
        Likelihood, RiskRating, Severity, Step, StepDraft,
    };

    fn doc_with_hazard() -> Document {
        let mut doc = Document::new(DocumentKind::RiskAssessment, "conveyor maintenance");
        let mut step = Step::from_draft(StepDraft {
            activity: "clear jam".to_owned(),
            notes: None,
        });
        let hazard = Hazard::from_draft(
            step.id,
            HazardDraft {
                label: "moving belt".to_owned(),
                description: None,
                category_code: Some("MEC-02".to_owned()),
            },
        );
        step.hazards.push(hazard);
        doc.steps.push(step);
        doc
    }

    #[test]
    fn empty_document_fails_process_steps() {
        let doc = Document::new(DocumentKind::RiskAssessment, "blank");
        assert!(!phase_complete(&doc, Phase::ProcessSteps));
        assert!(phase_complete(&doc_with_hazard(), Phase::ProcessSteps));
    }

    #[test]
    fn hazard_identification_needs_an_existing_control() {
        let mut doc = doc_with_hazard();
        assert!(!phase_complete(&doc, Phase::HazardIdentification));

        // A proposed control is not enough.
        let hazard_id = doc.steps[0].hazards[0].id;
        doc.steps[0].hazards[0].controls.push(Control::from_draft(
            hazard_id,
            ControlDraft {
                description: "fit interlock".to_owned(),
                kind: None,
                existing: false,
            },
        ));
        assert!(!phase_complete(&doc, Phase::HazardIdentification));

        doc.steps[0].hazards[0].controls.push(Control::from_draft(
            hazard_id,
            ControlDraft {
                description: "isolation procedure".to_owned(),
                kind: None,
                existing: true,
            },
        ));
        assert!(phase_complete(&doc, Phase::HazardIdentification));
    }

    #[test]
    fn control_discussion_rejects_blank_descriptions() {
        let mut doc = doc_with_hazard();
        assert!(!phase_complete(&doc, Phase::ControlDiscussion));

        let hazard_id = doc.steps[0].hazards[0].id;
        doc.steps[0].hazards[0].controls.push(Control::from_draft(
            hazard_id,
            ControlDraft {
                description: "   ".to_owned(),
                kind: None,
                existing: false,
            },
        ));
        let unmet = unmet_requirements(&doc, Phase::ControlDiscussion);
        assert_eq!(unmet.len(), 1);
        assert!(unmet[0].contains("no description"));

        doc.steps[0].hazards[0].controls[0].description = "fit a guard rail".to_owned();
        assert!(phase_complete(&doc, Phase::ControlDiscussion));
    }

    #[test]
    fn risk_rating_needs_both_halves() {
        let mut doc = doc_with_hazard();
        assert!(!phase_complete(&doc, Phase::RiskRating));
        doc.steps[0].hazards[0].rating.severity = Some(Severity::Serious);
        assert!(!phase_complete(&doc, Phase::RiskRating));
        doc.steps[0].hazards[0].rating.likelihood = Some(Likelihood::Possible);
        assert!(phase_complete(&doc, Phase::RiskRating));
    }

    #[test]
    fn high_rated_hazard_demands_an_action() {
        let mut doc = doc_with_hazard();
        doc.steps[0].hazards[0].rating =
            RiskRating::new(Severity::Severe, Likelihood::Likely);
        assert!(!phase_complete(&doc, Phase::Actions));

        let hazard_id = doc.steps[0].hazards[0].id;
        let mut action = Action::from_draft(ActionDraft {
            hazard_id,
            description: "install light curtain".to_owned(),
            owner: None,
            due_date: None,
        });
        doc.actions.push(action.clone());
        // Present but unowned is still incomplete.
        assert!(!phase_complete(&doc, Phase::Actions));

        action.owner = Some("maintenance lead".to_owned());
        action.due_date = Some(chrono::NaiveDate::from_ymd_opt(2026, 9, 30).unwrap());
        doc.actions[0] = action;
        assert!(phase_complete(&doc, Phase::Actions));
    }

    #[test]
    fn unmet_list_names_the_blockers() {
        let doc = doc_with_hazard();
        let unmet = unmet_requirements(&doc, Phase::HazardIdentification);
        assert_eq!(unmet.len(), 1);
        assert!(unmet[0].contains("moving belt"));
        assert!(unmet[0].contains("existing control"));
    }
}
