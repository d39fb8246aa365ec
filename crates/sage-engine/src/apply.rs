//! The command applier.
//!
//! One command becomes exactly one logical edit against the store. The
//! applier reads the cached document for resolution but never writes to
//! it; the session refetches after the batch so the cache catches up in
//! one step. Failures come back as values, never panics, so the batch
//! loop can record them and move on.

use thiserror::Error;

use sage_command::{Command, CommandData, Intent, Location, ReorderData, Target};
use sage_document::{
    ActionDraft, ActionPatch, ControlDraft, ControlPatch, Document, HazardDraft, HazardId,
    HazardPatch, StepDraft, StepId, StepPatch,
};
use sage_store::{DocumentStore, StoreError};

use crate::config::{EngineConfig, StepDeletePolicy};
use crate::resolve::{self, ResolveError, APPEND};

/// Why one command was skipped while the batch continued.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The location matched nothing in the current document.
    #[error(transparent)]
    Reference(#[from] ResolveError),

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Step delete was refused because hazards are still attached and
    /// the policy forbids cascading.
    #[error("step {step} still has {hazards} hazards attached")]
    StepNotEmpty {
        /// The addressed step.
        step: StepId,
        /// How many hazards block the delete.
        hazards: usize,
    },

    /// The intent/target pair names no edit the applier performs.
    #[error("{intent} {target} is not an applicable edit")]
    Unsupported {
        /// The command's intent.
        intent: Intent,
        /// The command's target.
        target: Target,
    },

    /// A create payload reached the applier without a field the entity
    /// cannot exist without.
    #[error("create payload is missing {field:?}")]
    IncompletePayload {
        /// The absent field.
        field: &'static str,
    },

    /// One sub-edit of a MULTIPLE command failed; the rest of the
    /// bundle was skipped.
    #[error("sub-edit {index} failed: {source}")]
    SubEdit {
        /// Position of the failed sub-edit in the bundle.
        index: usize,
        /// What went wrong.
        #[source]
        source: Box<ApplyError>,
    },
}

/// Applies one command against the store.
///
/// A MULTIPLE command applies its sub-edits in order and stops at the
/// first failure; the snapshot taken before the batch is what makes
/// the half-applied bundle recoverable.
pub async fn apply_one<S: DocumentStore + ?Sized>(
    store: &S,
    document: &Document,
    config: &EngineConfig,
    command: &Command,
) -> Result<(), ApplyError> {
    match &command.data {
        CommandData::Multiple(commands) => {
            for (index, sub) in commands.iter().enumerate() {
                apply_leaf(store, document, config, sub)
                    .await
                    .map_err(|source| ApplyError::SubEdit {
                        index,
                        source: Box::new(source),
                    })?;
            }
            Ok(())
        }
        _ => apply_leaf(store, document, config, command).await,
    }
}

async fn apply_leaf<S: DocumentStore + ?Sized>(
    store: &S,
    document: &Document,
    config: &EngineConfig,
    command: &Command,
) -> Result<(), ApplyError> {
    let location = &command.location;
    match (command.intent, &command.data) {
        // Clarify batches are intercepted by the session; a stray
        // clarify command inside a mixed batch mutates nothing.
        (Intent::Clarify, _) | (_, CommandData::Clarify { .. }) => Ok(()),

        (Intent::Add | Intent::Insert, CommandData::Step(patch)) => {
            let position = create_position(command.intent, || {
                resolve::step_slot(document, location)
            });
            let draft = step_draft(patch)?;
            store.create_step(document.id, position, draft).await?;
            Ok(())
        }
        (Intent::Modify, CommandData::Step(patch)) => {
            let id = resolve::step(document, location)?;
            store.update_step(document.id, id, patch.clone()).await?;
            Ok(())
        }

        (Intent::Add | Intent::Insert, CommandData::Hazard(patch)) => {
            let parent = resolve::hazard_parent(document, location)?;
            let position = create_position(command.intent, || {
                document
                    .step(parent)
                    .map_or(APPEND, |step| resolve::hazard_slot(step, location))
            });
            let draft = hazard_draft(patch)?;
            store
                .create_hazard(document.id, parent, position, draft)
                .await?;
            Ok(())
        }
        (Intent::Modify, CommandData::Hazard(patch)) => {
            let id = resolve::hazard(document, location)?;
            store.update_hazard(document.id, id, patch.clone()).await?;
            Ok(())
        }

        (Intent::Add | Intent::Insert, CommandData::Control(patch)) => {
            let parent = resolve::control_parent(document, location)?;
            let position = create_position(command.intent, || {
                document
                    .hazard(parent)
                    .map_or(APPEND, |hazard| {
                        resolve::control_slot(&hazard.controls, location)
                    })
            });
            let draft = control_draft(patch)?;
            store
                .create_control(document.id, parent, position, draft)
                .await?;
            Ok(())
        }
        (Intent::Modify, CommandData::Control(patch)) => {
            let id = resolve::control(document, location)?;
            store.update_control(document.id, id, patch.clone()).await?;
            Ok(())
        }

        (Intent::Add | Intent::Insert, CommandData::Action(patch)) => {
            let hazard = resolve::hazard(document, location)?;
            let position = create_position(command.intent, || {
                resolve::action_slot(document, location)
            });
            let draft = action_draft(hazard, patch)?;
            store.create_action(document.id, position, draft).await?;
            Ok(())
        }
        (Intent::Modify, CommandData::Action(patch)) => {
            let id = resolve::action(document, location)?;
            store.update_action(document.id, id, patch.clone()).await?;
            Ok(())
        }

        // Rating edits, including DELETE ASSESSMENT, are one patch on
        // one of the hazard's two rating stages.
        (_, CommandData::Assessment(data)) => {
            let id = resolve::hazard(document, location)?;
            store
                .update_rating(document.id, id, data.stage, data.rating.clone())
                .await?;
            Ok(())
        }

        (Intent::Delete, CommandData::None) => {
            delete(store, document, config, command.target, location).await
        }

        (Intent::Reorder, CommandData::Reorder(data)) => {
            reorder(store, document, command.target, location, data).await
        }

        _ => Err(ApplyError::Unsupported {
            intent: command.intent,
            target: command.target,
        }),
    }
    .map(|()| {
        tracing::debug!(
            intent = %command.intent,
            target = %command.target,
            "command applied"
        );
    })
}

async fn delete<S: DocumentStore + ?Sized>(
    store: &S,
    document: &Document,
    config: &EngineConfig,
    target: Target,
    location: &Location,
) -> Result<(), ApplyError> {
    match target {
        Target::Step => {
            let id = resolve::step(document, location)?;
            let hazards = document.step(id).map_or(0, |step| step.hazards.len());
            if hazards > 0 && config.step_delete == StepDeletePolicy::RefuseNonEmpty {
                return Err(ApplyError::StepNotEmpty { step: id, hazards });
            }
            store.delete_step(document.id, id).await?;
            Ok(())
        }
        Target::Hazard => {
            let id = resolve::hazard(document, location)?;
            store.delete_hazard(document.id, id).await?;
            Ok(())
        }
        Target::Control => {
            let id = resolve::control(document, location)?;
            store.delete_control(document.id, id).await?;
            Ok(())
        }
        Target::Action => {
            let id = resolve::action(document, location)?;
            store.delete_action(document.id, id).await?;
            Ok(())
        }
        Target::Assessment | Target::Multiple => Err(ApplyError::Unsupported {
            intent: Intent::Delete,
            target,
        }),
    }
}

async fn reorder<S: DocumentStore + ?Sized>(
    store: &S,
    document: &Document,
    target: Target,
    location: &Location,
    data: &ReorderData,
) -> Result<(), ApplyError> {
    let ordered = data.ordered_ids.clone();
    match target {
        Target::Step => {
            store.reorder_steps(document.id, ordered).await?;
            Ok(())
        }
        Target::Hazard => {
            let scope = resolve::hazard_scope(document, location, &data.ordered_ids)?;
            store.reorder_hazards(document.id, scope, ordered).await?;
            Ok(())
        }
        Target::Control => {
            let scope = resolve::control_scope(document, location, &data.ordered_ids)?;
            store.reorder_controls(document.id, scope, ordered).await?;
            Ok(())
        }
        Target::Action => {
            store.reorder_actions(document.id, ordered).await?;
            Ok(())
        }
        Target::Assessment | Target::Multiple => Err(ApplyError::Unsupported {
            intent: Intent::Reorder,
            target,
        }),
    }
}

/// ADD always appends; INSERT asks the resolver where to land.
fn create_position(intent: Intent, slot: impl FnOnce() -> usize) -> usize {
    if intent == Intent::Add {
        APPEND
    } else {
        slot()
    }
}

fn step_draft(patch: &StepPatch) -> Result<StepDraft, ApplyError> {
    Ok(StepDraft {
        activity: required(patch.activity.as_set(), "activity")?,
        notes: patch.notes.as_set().cloned(),
    })
}

fn hazard_draft(patch: &HazardPatch) -> Result<HazardDraft, ApplyError> {
    Ok(HazardDraft {
        label: required(patch.label.as_set(), "label")?,
        description: patch.description.as_set().cloned(),
        category_code: patch.category_code.as_set().cloned(),
    })
}

fn control_draft(patch: &ControlPatch) -> Result<ControlDraft, ApplyError> {
    Ok(ControlDraft {
        description: required(patch.description.as_set(), "description")?,
        kind: patch.kind.as_set().copied(),
        // Unstated means proposed; the collaborator flags controls that
        // are already in place explicitly.
        existing: patch.existing.as_set().copied().unwrap_or(false),
    })
}

fn action_draft(hazard_id: HazardId, patch: &ActionPatch) -> Result<ActionDraft, ApplyError> {
    Ok(ActionDraft {
        hazard_id,
        description: required(patch.description.as_set(), "description")?,
        owner: patch.owner.as_set().cloned(),
        due_date: patch.due_date.as_set().copied(),
    })
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, ApplyError> {
    value
        .cloned()
        .ok_or(ApplyError::IncompletePayload { field })
}
