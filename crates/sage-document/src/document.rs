//! The document aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Action, Control, Hazard, Step};
use crate::ids::{ActionId, ControlId, DocumentId, HazardId, StepId};
use crate::order::is_contiguous;
use crate::phase::{DocumentKind, Phase};

/// A structured safety-assessment document.
///
/// Steps and actions are the document's two top-level ordered scopes;
/// hazards and controls nest inside steps. `revision` counts persisted
/// writes and is bumped by the store, never by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable id.
    pub id: DocumentId,
    /// Which template the document follows.
    pub kind: DocumentKind,
    /// Human title.
    pub title: String,
    /// Where the guided session currently stands.
    pub current_phase: Phase,
    /// Monotonic write counter maintained by the store.
    pub revision: u64,
    /// Last persisted write, maintained by the store.
    pub updated_at: DateTime<Utc>,
    /// Process steps (or timeline events), in order.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Follow-up actions, in order, each tied to a hazard.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Document {
    /// A fresh, empty document in the kind's first phase.
    #[must_use]
    pub fn new(kind: DocumentKind, title: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            kind,
            title: title.into(),
            current_phase: kind.first_phase(),
            revision: 0,
            updated_at: Utc::now(),
            steps: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Marks a persisted write: bumps the revision and the timestamp.
    pub fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    /// Looks up a step by id.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Mutable step lookup by id.
    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|step| step.id == id)
    }

    /// Looks up a step by its position in the document.
    #[must_use]
    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Looks up a hazard anywhere in the document.
    #[must_use]
    pub fn hazard(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards().find(|hazard| hazard.id == id)
    }

    /// Mutable hazard lookup anywhere in the document.
    pub fn hazard_mut(&mut self, id: HazardId) -> Option<&mut Hazard> {
        self.steps
            .iter_mut()
            .flat_map(|step| step.hazards.iter_mut())
            .find(|hazard| hazard.id == id)
    }

    /// The step that owns a hazard.
    #[must_use]
    pub fn step_of_hazard(&self, id: HazardId) -> Option<&Step> {
        self.steps.iter().find(|step| step.hazard(id).is_some())
    }

    /// Looks up a control anywhere in the document.
    #[must_use]
    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.hazards()
            .flat_map(|hazard| hazard.controls.iter())
            .find(|control| control.id == id)
    }

    /// The hazard that owns a control.
    #[must_use]
    pub fn hazard_of_control(&self, id: ControlId) -> Option<&Hazard> {
        self.hazards().find(|hazard| hazard.control(id).is_some())
    }

    /// Looks up an action by id.
    #[must_use]
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|action| action.id == id)
    }

    /// Mutable action lookup by id.
    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|action| action.id == id)
    }

    /// Every hazard in the document, in step-then-hazard order.
    pub fn hazards(&self) -> impl Iterator<Item = &Hazard> {
        self.steps.iter().flat_map(|step| step.hazards.iter())
    }

    /// The actions that address a hazard, in document order.
    pub fn actions_for(&self, hazard: HazardId) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(move |action| action.hazard_id == hazard)
    }

    /// True when every ordered scope is contiguous from zero.
    #[must_use]
    pub fn ordering_is_contiguous(&self) -> bool {
        if !is_contiguous(&self.steps) || !is_contiguous(&self.actions) {
            return false;
        }
        self.steps.iter().all(|step| {
            is_contiguous(&step.hazards)
                && step
                    .hazards
                    .iter()
                    .all(|hazard| is_contiguous(&hazard.controls))
        })
    }

    /// Compares document content, ignoring the bookkeeping fields the
    /// store maintains (`revision`, `updated_at`).
    ///
    /// Undo restores content, not write history, so this is the
    /// equality that undo round-trips are judged by.
    #[must_use]
    pub fn content_eq(&self, other: &Document) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.title == other.title
            && self.current_phase == other.current_phase
            && self.steps == other.steps
            && self.actions == other.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{HazardDraft, StepDraft};
    use crate::order::renumber;

    fn doc_with_two_steps() -> Document {
        let mut doc = Document::new(DocumentKind::RiskAssessment, "pump change-out");
        doc.steps.push(Step::from_draft(StepDraft {
            activity: "drain line".to_owned(),
            notes: None,
        }));
        doc.steps.push(Step::from_draft(StepDraft {
            activity: "remove pump".to_owned(),
            notes: None,
        }));
        renumber(&mut doc.steps);
        doc
    }

    #[test]
    fn new_document_starts_in_first_phase() {
        let doc = Document::new(DocumentKind::IncidentInvestigation, "forklift strike");
        assert_eq!(doc.current_phase, Phase::Timeline);
        assert_eq!(doc.revision, 0);
        assert!(doc.ordering_is_contiguous());
    }

    #[test]
    fn nested_lookups_find_hazards_and_owners() {
        let mut doc = doc_with_two_steps();
        let step_id = doc.steps[1].id;
        let hazard = Hazard::from_draft(
            step_id,
            HazardDraft {
                label: "stored pressure".to_owned(),
                ..HazardDraft::default()
            },
        );
        let hazard_id = hazard.id;
        doc.steps[1].hazards.push(hazard);

        assert_eq!(doc.hazard(hazard_id).unwrap().label, "stored pressure");
        assert_eq!(doc.step_of_hazard(hazard_id).unwrap().id, step_id);
        assert_eq!(doc.hazards().count(), 1);
    }

    #[test]
    fn content_eq_ignores_store_bookkeeping() {
        let doc = doc_with_two_steps();
        let mut written = doc.clone();
        written.touch();
        written.touch();
        assert_ne!(doc, written);
        assert!(doc.content_eq(&written));

        let mut edited = doc.clone();
        edited.steps[0].activity = "vent and drain line".to_owned();
        assert!(!doc.content_eq(&edited));
    }
}
