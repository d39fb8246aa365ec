//! The canonical document store interface.

use async_trait::async_trait;

use sage_document::{
    Action, ActionDraft, ActionId, ActionPatch, Control, ControlDraft, ControlId, ControlPatch,
    Document, DocumentId, DocumentKind, EntityId, Hazard, HazardDraft, HazardId, HazardPatch,
    Phase, RatingPatch, RatingStage, Step, StepDraft, StepId, StepPatch,
};

use crate::error::StoreError;

/// Server-side custody of assessment documents.
///
/// The contract is uniform per entity type: create takes a parent and a
/// position, update takes a partial patch, delete cascades to direct
/// children, reorder takes the full new order of one sibling scope.
/// `replace_document` is the bulk restore used only by undo.
///
/// Every call is one request/response round trip; callers sequence
/// their own calls and refetch the whole document when they need an
/// authoritative view.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates an empty document in its kind's first phase.
    async fn create_document(
        &self,
        kind: DocumentKind,
        title: String,
    ) -> Result<Document, StoreError>;

    /// Fetches the authoritative document.
    async fn fetch_document(&self, document: DocumentId) -> Result<Document, StoreError>;

    /// Overwrites the whole document. Returns the stored result, whose
    /// revision continues from the store's counter rather than the
    /// caller's copy.
    async fn replace_document(&self, document: Document) -> Result<Document, StoreError>;

    /// Persists a phase change.
    async fn set_phase(&self, document: DocumentId, phase: Phase) -> Result<(), StoreError>;

    /// Creates a step at `position` among the document's steps.
    async fn create_step(
        &self,
        document: DocumentId,
        position: usize,
        draft: StepDraft,
    ) -> Result<Step, StoreError>;

    /// Patches a step.
    async fn update_step(
        &self,
        document: DocumentId,
        step: StepId,
        patch: StepPatch,
    ) -> Result<Step, StoreError>;

    /// Deletes a step, its hazards, and every action those hazards own.
    async fn delete_step(&self, document: DocumentId, step: StepId) -> Result<(), StoreError>;

    /// Re-sequences the document's steps.
    async fn reorder_steps(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError>;

    /// Creates a hazard at `position` under a step.
    async fn create_hazard(
        &self,
        document: DocumentId,
        step: StepId,
        position: usize,
        draft: HazardDraft,
    ) -> Result<Hazard, StoreError>;

    /// Patches a hazard's descriptive fields.
    async fn update_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
        patch: HazardPatch,
    ) -> Result<Hazard, StoreError>;

    /// Deletes a hazard, its controls, its ratings, and its actions.
    async fn delete_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
    ) -> Result<(), StoreError>;

    /// Re-sequences the hazards of one step.
    async fn reorder_hazards(
        &self,
        document: DocumentId,
        step: StepId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError>;

    /// Patches one of a hazard's two ratings.
    async fn update_rating(
        &self,
        document: DocumentId,
        hazard: HazardId,
        stage: RatingStage,
        patch: RatingPatch,
    ) -> Result<Hazard, StoreError>;

    /// Creates a control at `position` under a hazard.
    async fn create_control(
        &self,
        document: DocumentId,
        hazard: HazardId,
        position: usize,
        draft: ControlDraft,
    ) -> Result<Control, StoreError>;

    /// Patches a control.
    async fn update_control(
        &self,
        document: DocumentId,
        control: ControlId,
        patch: ControlPatch,
    ) -> Result<Control, StoreError>;

    /// Deletes a control.
    async fn delete_control(
        &self,
        document: DocumentId,
        control: ControlId,
    ) -> Result<(), StoreError>;

    /// Re-sequences the controls of one hazard.
    async fn reorder_controls(
        &self,
        document: DocumentId,
        hazard: HazardId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError>;

    /// Creates an action at `position` in the document's action list.
    /// The draft's hazard must exist.
    async fn create_action(
        &self,
        document: DocumentId,
        position: usize,
        draft: ActionDraft,
    ) -> Result<Action, StoreError>;

    /// Patches an action.
    async fn update_action(
        &self,
        document: DocumentId,
        action: ActionId,
        patch: ActionPatch,
    ) -> Result<Action, StoreError>;

    /// Deletes an action.
    async fn delete_action(
        &self,
        document: DocumentId,
        action: ActionId,
    ) -> Result<(), StoreError>;

    /// Re-sequences the document's actions.
    async fn reorder_actions(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError>;
}
