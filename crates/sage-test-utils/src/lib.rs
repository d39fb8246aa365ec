//! Testing utilities for the SAGE workspace
//!
//! Canned documents, command builders, and a fault-injecting store
//! wrapper shared across crate test suites and the demo CLI.

#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sage_command::{
    AssessmentData, Command, CommandData, Intent, Location, ReorderData, Target,
};
use sage_document::{
    renumber, Action, ActionDraft, ActionId, ActionPatch, Control, ControlDraft, ControlId,
    ControlPatch, Document, DocumentId, DocumentKind, EntityId, Hazard, HazardDraft, HazardId,
    HazardPatch, Likelihood, Patch, Phase, RatingPatch, RatingStage, RiskRating, Severity, Step,
    StepDraft, StepId, StepPatch,
};
use sage_store::{DocumentStore, MemoryStore, StoreError};

/// The scenario most engine tests start from: steps `[S1, S2]` with one
/// hazard `H1` on `S1`, categorized and backed by an existing control.
pub fn two_step_document() -> Document {
    let mut doc = Document::new(DocumentKind::RiskAssessment, "pump change-out");

    let mut first = Step::from_draft(StepDraft {
        activity: "isolate and drain the line".to_owned(),
        notes: None,
    });
    let mut hazard = Hazard::from_draft(
        first.id,
        HazardDraft {
            label: "stored energy".to_owned(),
            description: Some("line may hold residual pressure".to_owned()),
            category_code: Some("MEC-03".to_owned()),
        },
    );
    hazard.controls.push(Control::from_draft(
        hazard.id,
        ControlDraft {
            description: "double block and bleed".to_owned(),
            kind: None,
            existing: true,
        },
    ));
    first.hazards.push(hazard);

    let second = Step::from_draft(StepDraft {
        activity: "remove the pump".to_owned(),
        notes: None,
    });

    doc.steps.push(first);
    doc.steps.push(second);
    renumber(&mut doc.steps);
    doc
}

/// A document far enough along to exercise ratings, actions, and the
/// later phase predicates.
pub fn rated_risk_assessment() -> Document {
    let mut doc = two_step_document();
    let hazard = &mut doc.steps[0].hazards[0];
    hazard.rating = RiskRating::new(Severity::Severe, Likelihood::Likely);
    hazard.residual_rating = RiskRating::new(Severity::Minor, Likelihood::Unlikely);
    let hazard_id = hazard.id;

    doc.actions.push(Action::from_draft(ActionDraft {
        hazard_id,
        description: "fit a bleed point gauge".to_owned(),
        owner: Some("maintenance lead".to_owned()),
        due_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 15),
    }));
    renumber(&mut doc.actions);
    doc
}

/// An incident document in its first phase, with one timeline event.
pub fn incident_document() -> Document {
    let mut doc = Document::new(DocumentKind::IncidentInvestigation, "forklift strike");
    doc.steps.push(Step::from_draft(StepDraft {
        activity: "forklift reversed out of bay 4".to_owned(),
        notes: None,
    }));
    renumber(&mut doc.steps);
    assert_eq!(doc.current_phase, Phase::Timeline);
    doc
}

/// Seeds a fresh in-memory store with one prepared document.
pub async fn seeded(document: Document) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.seed(document).await;
    Arc::new(store)
}

// --- command builders -------------------------------------------------

pub fn add_step(activity: &str) -> Command {
    Command {
        intent: Intent::Add,
        target: Target::Step,
        location: Location::default(),
        data: CommandData::Step(StepPatch {
            activity: Patch::Set(activity.to_owned()),
            notes: Patch::Keep,
        }),
        explanation: None,
    }
}

pub fn insert_step_after(anchor: impl Into<EntityId>, activity: &str) -> Command {
    let mut command = add_step(activity);
    command.intent = Intent::Insert;
    command.location.insert_after = Some(anchor.into());
    command
}

pub fn modify_step_activity(id: StepId, activity: &str) -> Command {
    Command {
        intent: Intent::Modify,
        target: Target::Step,
        location: Location {
            step: Some(id),
            ..Location::default()
        },
        data: CommandData::Step(StepPatch {
            activity: Patch::Set(activity.to_owned()),
            notes: Patch::Keep,
        }),
        explanation: None,
    }
}

pub fn delete_step(id: StepId) -> Command {
    Command {
        intent: Intent::Delete,
        target: Target::Step,
        location: Location {
            step: Some(id),
            ..Location::default()
        },
        data: CommandData::None,
        explanation: None,
    }
}

pub fn add_hazard(step: StepId, label: &str) -> Command {
    Command {
        intent: Intent::Add,
        target: Target::Hazard,
        location: Location {
            step: Some(step),
            ..Location::default()
        },
        data: CommandData::Hazard(HazardPatch {
            label: Patch::Set(label.to_owned()),
            ..HazardPatch::default()
        }),
        explanation: None,
    }
}

pub fn modify_hazard_label(id: HazardId, label: &str) -> Command {
    Command {
        intent: Intent::Modify,
        target: Target::Hazard,
        location: Location {
            hazard: Some(id),
            ..Location::default()
        },
        data: CommandData::Hazard(HazardPatch {
            label: Patch::Set(label.to_owned()),
            ..HazardPatch::default()
        }),
        explanation: None,
    }
}

pub fn set_hazard_category(id: HazardId, code: &str) -> Command {
    Command {
        intent: Intent::Modify,
        target: Target::Hazard,
        location: Location {
            hazard: Some(id),
            ..Location::default()
        },
        data: CommandData::Hazard(HazardPatch {
            category_code: Patch::Set(code.to_owned()),
            ..HazardPatch::default()
        }),
        explanation: None,
    }
}

pub fn delete_hazard(id: HazardId) -> Command {
    Command {
        intent: Intent::Delete,
        target: Target::Hazard,
        location: Location {
            hazard: Some(id),
            ..Location::default()
        },
        data: CommandData::None,
        explanation: None,
    }
}

pub fn add_control(hazard: HazardId, description: &str, existing: bool) -> Command {
    Command {
        intent: Intent::Add,
        target: Target::Control,
        location: Location {
            hazard: Some(hazard),
            ..Location::default()
        },
        data: CommandData::Control(ControlPatch {
            description: Patch::Set(description.to_owned()),
            kind: Patch::Keep,
            existing: Patch::Set(existing),
        }),
        explanation: None,
    }
}

pub fn add_action(hazard: HazardId, description: &str) -> Command {
    Command {
        intent: Intent::Add,
        target: Target::Action,
        location: Location {
            hazard: Some(hazard),
            ..Location::default()
        },
        data: CommandData::Action(ActionPatch {
            description: Patch::Set(description.to_owned()),
            ..ActionPatch::default()
        }),
        explanation: None,
    }
}

pub fn rate_hazard(
    id: HazardId,
    stage: RatingStage,
    severity: Severity,
    likelihood: Likelihood,
) -> Command {
    Command {
        intent: Intent::Modify,
        target: Target::Assessment,
        location: Location {
            hazard: Some(id),
            ..Location::default()
        },
        data: CommandData::Assessment(AssessmentData {
            stage,
            rating: RatingPatch {
                severity: Patch::Set(severity),
                likelihood: Patch::Set(likelihood),
            },
        }),
        explanation: None,
    }
}

pub fn reorder_steps(ordered: Vec<EntityId>) -> Command {
    Command {
        intent: Intent::Reorder,
        target: Target::Step,
        location: Location {
            // Reorder requires a location; index 0 addresses the scope.
            step_index: Some(0),
            ..Location::default()
        },
        data: CommandData::Reorder(ReorderData {
            ordered_ids: ordered,
        }),
        explanation: None,
    }
}

// --- fault injection --------------------------------------------------

/// A store wrapper that fails scripted calls, for driving the
/// partial-failure and restore-failure paths deterministically.
///
/// Each `fail_next("create_step")` arms exactly one failure for that
/// method; unscripted calls pass straight through to the inner store.
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    scripted: Mutex<Vec<&'static str>>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            scripted: Mutex::new(Vec::new()),
        }
    }

    /// Arms one injected failure for the named store method.
    pub fn fail_next(&self, op: &'static str) {
        self.scripted.lock().expect("script lock").push(op);
    }

    /// The wrapped store, for seeding around the fault layer.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn trip(&self, op: &'static str) -> Result<(), StoreError> {
        let mut scripted = self.scripted.lock().expect("script lock");
        if let Some(found) = scripted.iter().position(|armed| *armed == op) {
            scripted.remove(found);
            return Err(StoreError::Http {
                status: 503,
                path: op.to_owned(),
                message: "injected failure".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FlakyStore<S> {
    async fn create_document(
        &self,
        kind: DocumentKind,
        title: String,
    ) -> Result<Document, StoreError> {
        self.trip("create_document")?;
        self.inner.create_document(kind, title).await
    }

    async fn fetch_document(&self, document: DocumentId) -> Result<Document, StoreError> {
        self.trip("fetch_document")?;
        self.inner.fetch_document(document).await
    }

    async fn replace_document(&self, document: Document) -> Result<Document, StoreError> {
        self.trip("replace_document")?;
        self.inner.replace_document(document).await
    }

    async fn set_phase(&self, document: DocumentId, phase: Phase) -> Result<(), StoreError> {
        self.trip("set_phase")?;
        self.inner.set_phase(document, phase).await
    }

    async fn create_step(
        &self,
        document: DocumentId,
        position: usize,
        draft: StepDraft,
    ) -> Result<Step, StoreError> {
        self.trip("create_step")?;
        self.inner.create_step(document, position, draft).await
    }

    async fn update_step(
        &self,
        document: DocumentId,
        step: StepId,
        patch: StepPatch,
    ) -> Result<Step, StoreError> {
        self.trip("update_step")?;
        self.inner.update_step(document, step, patch).await
    }

    async fn delete_step(&self, document: DocumentId, step: StepId) -> Result<(), StoreError> {
        self.trip("delete_step")?;
        self.inner.delete_step(document, step).await
    }

    async fn reorder_steps(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.trip("reorder_steps")?;
        self.inner.reorder_steps(document, ordered).await
    }

    async fn create_hazard(
        &self,
        document: DocumentId,
        step: StepId,
        position: usize,
        draft: HazardDraft,
    ) -> Result<Hazard, StoreError> {
        self.trip("create_hazard")?;
        self.inner.create_hazard(document, step, position, draft).await
    }

    async fn update_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
        patch: HazardPatch,
    ) -> Result<Hazard, StoreError> {
        self.trip("update_hazard")?;
        self.inner.update_hazard(document, hazard, patch).await
    }

    async fn delete_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
    ) -> Result<(), StoreError> {
        self.trip("delete_hazard")?;
        self.inner.delete_hazard(document, hazard).await
    }

    async fn reorder_hazards(
        &self,
        document: DocumentId,
        step: StepId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.trip("reorder_hazards")?;
        self.inner.reorder_hazards(document, step, ordered).await
    }

    async fn update_rating(
        &self,
        document: DocumentId,
        hazard: HazardId,
        stage: RatingStage,
        patch: RatingPatch,
    ) -> Result<Hazard, StoreError> {
        self.trip("update_rating")?;
        self.inner.update_rating(document, hazard, stage, patch).await
    }

    async fn create_control(
        &self,
        document: DocumentId,
        hazard: HazardId,
        position: usize,
        draft: ControlDraft,
    ) -> Result<Control, StoreError> {
        self.trip("create_control")?;
        self.inner
            .create_control(document, hazard, position, draft)
            .await
    }

    async fn update_control(
        &self,
        document: DocumentId,
        control: ControlId,
        patch: ControlPatch,
    ) -> Result<Control, StoreError> {
        self.trip("update_control")?;
        self.inner.update_control(document, control, patch).await
    }

    async fn delete_control(
        &self,
        document: DocumentId,
        control: ControlId,
    ) -> Result<(), StoreError> {
        self.trip("delete_control")?;
        self.inner.delete_control(document, control).await
    }

    async fn reorder_controls(
        &self,
        document: DocumentId,
        hazard: HazardId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.trip("reorder_controls")?;
        self.inner.reorder_controls(document, hazard, ordered).await
    }

    async fn create_action(
        &self,
        document: DocumentId,
        position: usize,
        draft: ActionDraft,
    ) -> Result<Action, StoreError> {
        self.trip("create_action")?;
        self.inner.create_action(document, position, draft).await
    }

    async fn update_action(
        &self,
        document: DocumentId,
        action: ActionId,
        patch: ActionPatch,
    ) -> Result<Action, StoreError> {
        self.trip("update_action")?;
        self.inner.update_action(document, action, patch).await
    }

    async fn delete_action(
        &self,
        document: DocumentId,
        action: ActionId,
    ) -> Result<(), StoreError> {
        self.trip("delete_action")?;
        self.inner.delete_action(document, action).await
    }

    async fn reorder_actions(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.trip("reorder_actions")?;
        self.inner.reorder_actions(document, ordered).await
    }
}
