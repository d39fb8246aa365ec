//! In-memory store backend.
//!
//! Used by tests and the demo CLI. Behaves like the real service:
//! assigns ids, keeps sibling order contiguous, cascades deletes, and
//! bumps the revision on every successful write.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use sage_document::{
    apply_order, insert_renumbered, remove_renumbered, renumber, Action, ActionDraft, ActionId,
    ActionPatch, Control, ControlDraft, ControlId, ControlPatch, Document, DocumentId,
    DocumentKind, EntityId, Hazard, HazardDraft, HazardId, HazardPatch, Phase, RatingPatch,
    RatingStage, Step, StepDraft, StepId, StepPatch,
};

use crate::error::StoreError;
use crate::store::DocumentStore;

/// A store holding every document in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document as-is, keeping its id and revision. Lets
    /// tests and the CLI start from a prepared tree.
    pub async fn seed(&self, document: Document) {
        self.documents.write().await.insert(document.id, document);
    }

    /// Ids of every document currently held.
    pub async fn document_ids(&self) -> Vec<DocumentId> {
        self.documents.read().await.keys().copied().collect()
    }

    async fn mutate<T: Send>(
        &self,
        id: DocumentId,
        op: impl FnOnce(&mut Document) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        let out = op(document)?;
        // Failed ops return above and leave the revision untouched.
        document.touch();
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        kind: DocumentKind,
        title: String,
    ) -> Result<Document, StoreError> {
        let document = Document::new(kind, title);
        let mut documents = self.documents.write().await;
        documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn fetch_document(&self, document: DocumentId) -> Result<Document, StoreError> {
        self.documents
            .read()
            .await
            .get(&document)
            .cloned()
            .ok_or(StoreError::DocumentNotFound(document))
    }

    async fn replace_document(&self, document: Document) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get_mut(&document.id)
            .ok_or(StoreError::DocumentNotFound(document.id))?;
        // The revision keeps counting from the store's value so it
        // never runs backwards after a restore.
        let next_revision = stored.revision + 1;
        *stored = document;
        stored.revision = next_revision;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_phase(&self, document: DocumentId, phase: Phase) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            doc.current_phase = phase;
            Ok(())
        })
        .await
    }

    async fn create_step(
        &self,
        document: DocumentId,
        position: usize,
        draft: StepDraft,
    ) -> Result<Step, StoreError> {
        self.mutate(document, |doc| {
            let position = position.min(doc.steps.len());
            insert_renumbered(&mut doc.steps, position, Step::from_draft(draft));
            Ok(doc.steps[position].clone())
        })
        .await
    }

    async fn update_step(
        &self,
        document: DocumentId,
        step: StepId,
        patch: StepPatch,
    ) -> Result<Step, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .step_mut(step)
                .ok_or(StoreError::missing("step", step, document))?;
            patch.apply(found)?;
            Ok(found.clone())
        })
        .await
    }

    async fn delete_step(&self, document: DocumentId, step: StepId) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            let removed = remove_renumbered(&mut doc.steps, step.into())
                .ok_or(StoreError::missing("step", step, document))?;
            // Actions belonging to the removed subtree go with it.
            let orphaned: Vec<HazardId> = removed.hazards.iter().map(|h| h.id).collect();
            doc.actions
                .retain(|action| !orphaned.contains(&action.hazard_id));
            renumber(&mut doc.actions);
            Ok(())
        })
        .await
    }

    async fn reorder_steps(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            apply_order(&mut doc.steps, &ordered)?;
            Ok(())
        })
        .await
    }

    async fn create_hazard(
        &self,
        document: DocumentId,
        step: StepId,
        position: usize,
        draft: HazardDraft,
    ) -> Result<Hazard, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .step_mut(step)
                .ok_or(StoreError::missing("step", step, document))?;
            let position = position.min(found.hazards.len());
            insert_renumbered(&mut found.hazards, position, Hazard::from_draft(step, draft));
            Ok(found.hazards[position].clone())
        })
        .await
    }

    async fn update_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
        patch: HazardPatch,
    ) -> Result<Hazard, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .hazard_mut(hazard)
                .ok_or(StoreError::missing("hazard", hazard, document))?;
            patch.apply(found)?;
            Ok(found.clone())
        })
        .await
    }

    async fn delete_hazard(
        &self,
        document: DocumentId,
        hazard: HazardId,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            let owner = doc
                .steps
                .iter_mut()
                .find(|step| step.hazard(hazard).is_some())
                .ok_or(StoreError::missing("hazard", hazard, document))?;
            let _ = remove_renumbered(&mut owner.hazards, hazard.into());
            doc.actions.retain(|action| action.hazard_id != hazard);
            renumber(&mut doc.actions);
            Ok(())
        })
        .await
    }

    async fn reorder_hazards(
        &self,
        document: DocumentId,
        step: StepId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .step_mut(step)
                .ok_or(StoreError::missing("step", step, document))?;
            apply_order(&mut found.hazards, &ordered)?;
            Ok(())
        })
        .await
    }

    async fn update_rating(
        &self,
        document: DocumentId,
        hazard: HazardId,
        stage: RatingStage,
        patch: RatingPatch,
    ) -> Result<Hazard, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .hazard_mut(hazard)
                .ok_or(StoreError::missing("hazard", hazard, document))?;
            patch.apply(found.rating_for_mut(stage));
            Ok(found.clone())
        })
        .await
    }

    async fn create_control(
        &self,
        document: DocumentId,
        hazard: HazardId,
        position: usize,
        draft: ControlDraft,
    ) -> Result<Control, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .hazard_mut(hazard)
                .ok_or(StoreError::missing("hazard", hazard, document))?;
            let position = position.min(found.controls.len());
            insert_renumbered(
                &mut found.controls,
                position,
                Control::from_draft(hazard, draft),
            );
            Ok(found.controls[position].clone())
        })
        .await
    }

    async fn update_control(
        &self,
        document: DocumentId,
        control: ControlId,
        patch: ControlPatch,
    ) -> Result<Control, StoreError> {
        self.mutate(document, |doc| {
            let owner = doc
                .steps
                .iter_mut()
                .flat_map(|step| step.hazards.iter_mut())
                .find(|hazard| hazard.control(control).is_some())
                .ok_or(StoreError::missing("control", control, document))?;
            let found = owner
                .control_mut(control)
                .ok_or(StoreError::missing("control", control, document))?;
            patch.apply(found)?;
            Ok(found.clone())
        })
        .await
    }

    async fn delete_control(
        &self,
        document: DocumentId,
        control: ControlId,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            let owner = doc
                .steps
                .iter_mut()
                .flat_map(|step| step.hazards.iter_mut())
                .find(|hazard| hazard.control(control).is_some())
                .ok_or(StoreError::missing("control", control, document))?;
            let _ = remove_renumbered(&mut owner.controls, control.into());
            Ok(())
        })
        .await
    }

    async fn reorder_controls(
        &self,
        document: DocumentId,
        hazard: HazardId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .hazard_mut(hazard)
                .ok_or(StoreError::missing("hazard", hazard, document))?;
            apply_order(&mut found.controls, &ordered)?;
            Ok(())
        })
        .await
    }

    async fn create_action(
        &self,
        document: DocumentId,
        position: usize,
        draft: ActionDraft,
    ) -> Result<Action, StoreError> {
        self.mutate(document, |doc| {
            if doc.hazard(draft.hazard_id).is_none() {
                return Err(StoreError::missing("hazard", draft.hazard_id, document));
            }
            let position = position.min(doc.actions.len());
            insert_renumbered(&mut doc.actions, position, Action::from_draft(draft));
            Ok(doc.actions[position].clone())
        })
        .await
    }

    async fn update_action(
        &self,
        document: DocumentId,
        action: ActionId,
        patch: ActionPatch,
    ) -> Result<Action, StoreError> {
        self.mutate(document, |doc| {
            let found = doc
                .action_mut(action)
                .ok_or(StoreError::missing("action", action, document))?;
            patch.apply(found)?;
            Ok(found.clone())
        })
        .await
    }

    async fn delete_action(
        &self,
        document: DocumentId,
        action: ActionId,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            remove_renumbered(&mut doc.actions, action.into())
                .map(|_| ())
                .ok_or(StoreError::missing("action", action, document))
        })
        .await
    }

    async fn reorder_actions(
        &self,
        document: DocumentId,
        ordered: Vec<EntityId>,
    ) -> Result<(), StoreError> {
        self.mutate(document, |doc| {
            apply_order(&mut doc.actions, &ordered)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_document::Patch;

    async fn store_with_document() -> (MemoryStore, DocumentId) {
        let store = MemoryStore::new();
        let doc = store
            .create_document(DocumentKind::RiskAssessment, "test".to_owned())
            .await
            .unwrap();
        (store, doc.id)
    }

    #[tokio::test]
    async fn create_assigns_position_and_bumps_revision() {
        let (store, doc_id) = store_with_document().await;
        let first = store
            .create_step(doc_id, 0, StepDraft {
                activity: "a".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        let second = store
            .create_step(doc_id, 99, StepDraft {
                activity: "b".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(first.order_index, 0);
        assert_eq!(second.order_index, 1);

        let doc = store.fetch_document(doc_id).await.unwrap();
        assert_eq!(doc.revision, 2);
        assert!(doc.ordering_is_contiguous());
    }

    #[tokio::test]
    async fn failed_write_leaves_revision_alone() {
        let (store, doc_id) = store_with_document().await;
        let err = store
            .update_step(doc_id, StepId::new(), StepPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.fetch_document(doc_id).await.unwrap().revision, 0);
    }

    #[tokio::test]
    async fn deleting_a_hazard_takes_its_actions() {
        let (store, doc_id) = store_with_document().await;
        let step = store
            .create_step(doc_id, 0, StepDraft {
                activity: "grind weld".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        let hazard = store
            .create_hazard(doc_id, step.id, 0, HazardDraft {
                label: "sparks".to_owned(),
                ..HazardDraft::default()
            })
            .await
            .unwrap();
        let other = store
            .create_hazard(doc_id, step.id, 1, HazardDraft {
                label: "noise".to_owned(),
                ..HazardDraft::default()
            })
            .await
            .unwrap();
        store
            .create_action(doc_id, 0, ActionDraft {
                hazard_id: hazard.id,
                description: "fit screens".to_owned(),
                owner: None,
                due_date: None,
            })
            .await
            .unwrap();
        store
            .create_action(doc_id, 1, ActionDraft {
                hazard_id: other.id,
                description: "issue ear defenders".to_owned(),
                owner: None,
                due_date: None,
            })
            .await
            .unwrap();

        store.delete_hazard(doc_id, hazard.id).await.unwrap();

        let doc = store.fetch_document(doc_id).await.unwrap();
        assert_eq!(doc.hazards().count(), 1);
        assert_eq!(doc.actions.len(), 1);
        assert_eq!(doc.actions[0].hazard_id, other.id);
        assert_eq!(doc.actions[0].order_index, 0);
    }

    #[tokio::test]
    async fn deleting_a_step_cascades_the_subtree() {
        let (store, doc_id) = store_with_document().await;
        let step = store
            .create_step(doc_id, 0, StepDraft {
                activity: "open panel".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        let keeper = store
            .create_step(doc_id, 1, StepDraft {
                activity: "test circuits".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        let hazard = store
            .create_hazard(doc_id, step.id, 0, HazardDraft {
                label: "live parts".to_owned(),
                ..HazardDraft::default()
            })
            .await
            .unwrap();
        store
            .create_control(doc_id, hazard.id, 0, ControlDraft {
                description: "prove dead".to_owned(),
                kind: None,
                existing: true,
            })
            .await
            .unwrap();
        store
            .create_action(doc_id, 0, ActionDraft {
                hazard_id: hazard.id,
                description: "replace cover".to_owned(),
                owner: None,
                due_date: None,
            })
            .await
            .unwrap();

        store.delete_step(doc_id, step.id).await.unwrap();

        let doc = store.fetch_document(doc_id).await.unwrap();
        assert_eq!(doc.steps.len(), 1);
        assert_eq!(doc.steps[0].id, keeper.id);
        assert_eq!(doc.steps[0].order_index, 0);
        assert!(doc.actions.is_empty());
    }

    #[tokio::test]
    async fn replace_keeps_revision_monotonic() {
        let (store, doc_id) = store_with_document().await;
        let snapshot = store.fetch_document(doc_id).await.unwrap();

        for n in 0..3 {
            store
                .create_step(doc_id, n, StepDraft {
                    activity: format!("step {n}"),
                    notes: None,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.fetch_document(doc_id).await.unwrap().revision, 3);

        let restored = store.replace_document(snapshot.clone()).await.unwrap();
        assert!(restored.content_eq(&snapshot));
        assert_eq!(restored.revision, 4);
    }

    #[tokio::test]
    async fn rating_patch_touches_one_stage() {
        use sage_document::{Likelihood, Severity};

        let (store, doc_id) = store_with_document().await;
        let step = store
            .create_step(doc_id, 0, StepDraft {
                activity: "lift motor".to_owned(),
                notes: None,
            })
            .await
            .unwrap();
        let hazard = store
            .create_hazard(doc_id, step.id, 0, HazardDraft {
                label: "suspended load".to_owned(),
                ..HazardDraft::default()
            })
            .await
            .unwrap();

        let updated = store
            .update_rating(doc_id, hazard.id, RatingStage::Initial, RatingPatch {
                severity: Patch::Set(Severity::Severe),
                likelihood: Patch::Set(Likelihood::Possible),
            })
            .await
            .unwrap();
        assert!(updated.rating.is_complete());
        assert!(updated.residual_rating.is_empty());
    }
}
