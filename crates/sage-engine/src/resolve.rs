//! Reference resolution: location bags to concrete entities.
//!
//! Resolution always runs against the session's cached document, never
//! a snapshot. The order is fixed: an explicit id wins when it matches
//! something; otherwise the positional field is tried; a stale
//! `insertAfter` anchor degrades to appending rather than failing.
//! Nothing in this module creates or mutates an entity.

use thiserror::Error;

use sage_command::Location;
use sage_document::{
    ActionId, Control, ControlId, Document, EntityId, HazardId, Orderable, Step, StepId,
};

/// Position marker for "end of scope".
///
/// Stores clamp create positions to the live scope length, so encoding
/// append this way keeps back-to-back adds in arrival order even though
/// the cached document lags behind earlier commands in the same batch.
pub const APPEND: usize = usize::MAX;

/// A location that matches nothing usable in the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no {0} matches the location")]
pub struct ResolveError(pub &'static str);

/// The step a location points at.
pub fn step(document: &Document, location: &Location) -> Result<StepId, ResolveError> {
    if let Some(id) = location.step {
        if document.step(id).is_some() {
            return Ok(id);
        }
    }
    if let Some(index) = location.step_index {
        if let Some(found) = document.step_at(index as usize) {
            return Ok(found.id);
        }
    }
    Err(ResolveError("step"))
}

/// The hazard a location points at.
pub fn hazard(document: &Document, location: &Location) -> Result<HazardId, ResolveError> {
    if let Some(id) = location.hazard {
        if document.hazard(id).is_some() {
            return Ok(id);
        }
    }
    if let Some(index) = location.hazard_index {
        let owner = step(document, location).map_err(|_| ResolveError("hazard"))?;
        if let Some(found) = document
            .step(owner)
            .and_then(|step| step.hazards.get(index as usize))
        {
            return Ok(found.id);
        }
    }
    Err(ResolveError("hazard"))
}

/// The control a location points at.
pub fn control(document: &Document, location: &Location) -> Result<ControlId, ResolveError> {
    if let Some(id) = location.control {
        if document.control(id).is_some() {
            return Ok(id);
        }
    }
    if let Some(index) = location.control_index {
        let owner = hazard(document, location).map_err(|_| ResolveError("control"))?;
        if let Some(found) = document
            .hazard(owner)
            .and_then(|hazard| hazard.controls.get(index as usize))
        {
            return Ok(found.id);
        }
    }
    Err(ResolveError("control"))
}

/// The action a location points at.
pub fn action(document: &Document, location: &Location) -> Result<ActionId, ResolveError> {
    if let Some(id) = location.action {
        if document.action(id).is_some() {
            return Ok(id);
        }
    }
    if let Some(index) = location.action_index {
        if let Some(found) = document.actions.get(index as usize) {
            return Ok(found.id);
        }
    }
    Err(ResolveError("action"))
}

/// The step that will own a created hazard.
///
/// Falls back to the step owning the `insertAfter` anchor, so "add a
/// hazard after this one" works without the parser repeating the step.
pub fn hazard_parent(document: &Document, location: &Location) -> Result<StepId, ResolveError> {
    if let Ok(found) = step(document, location) {
        return Ok(found);
    }
    if let Some(anchor) = location.insert_after {
        if let Some(owner) = document
            .steps
            .iter()
            .find(|step| step.hazards.iter().any(|hazard| hazard.id == anchor))
        {
            return Ok(owner.id);
        }
    }
    Err(ResolveError("step"))
}

/// The hazard that will own a created control.
pub fn control_parent(document: &Document, location: &Location) -> Result<HazardId, ResolveError> {
    if let Ok(found) = hazard(document, location) {
        return Ok(found);
    }
    if let Some(anchor) = location.insert_after {
        if let Some(owner) = document
            .hazards()
            .find(|hazard| hazard.controls.iter().any(|control| control.id == anchor))
        {
            return Ok(owner.id);
        }
    }
    Err(ResolveError("hazard"))
}

/// The step whose hazards a reorder list re-sequences.
///
/// When the location names no step, the owner of the first listed
/// hazard decides the scope.
pub fn hazard_scope(
    document: &Document,
    location: &Location,
    ordered: &[EntityId],
) -> Result<StepId, ResolveError> {
    if let Ok(found) = step(document, location) {
        return Ok(found);
    }
    if let Some(first) = ordered.first() {
        if let Some(owner) = document
            .steps
            .iter()
            .find(|step| step.hazards.iter().any(|hazard| hazard.id == *first))
        {
            return Ok(owner.id);
        }
    }
    Err(ResolveError("step"))
}

/// The hazard whose controls a reorder list re-sequences.
pub fn control_scope(
    document: &Document,
    location: &Location,
    ordered: &[EntityId],
) -> Result<HazardId, ResolveError> {
    if let Ok(found) = hazard(document, location) {
        return Ok(found);
    }
    if let Some(first) = ordered.first() {
        if let Some(owner) = document
            .hazards()
            .find(|hazard| hazard.controls.iter().any(|control| control.id == *first))
        {
            return Ok(owner.id);
        }
    }
    Err(ResolveError("hazard"))
}

/// Where an inserted step lands among the document's steps.
pub fn step_slot(document: &Document, location: &Location) -> usize {
    slot(&document.steps, location.insert_after, location.step_index)
}

/// Where an inserted hazard lands among one step's hazards.
pub fn hazard_slot(step: &Step, location: &Location) -> usize {
    slot(&step.hazards, location.insert_after, location.hazard_index)
}

/// Where an inserted control lands among one hazard's controls.
pub fn control_slot(controls: &[Control], location: &Location) -> usize {
    slot(controls, location.insert_after, location.control_index)
}

/// Where an inserted action lands in the document's action list.
pub fn action_slot(document: &Document, location: &Location) -> usize {
    slot(
        &document.actions,
        location.insert_after,
        location.action_index,
    )
}

/// Shared slot rule: after the anchor when it matches, at the explicit
/// index otherwise, at the end when neither helps. A stale anchor
/// appends instead of failing the edit.
fn slot<T: Orderable>(items: &[T], anchor: Option<EntityId>, index: Option<u32>) -> usize {
    if let Some(anchor) = anchor {
        return items
            .iter()
            .position(|item| item.entity_id() == anchor)
            .map_or(APPEND, |found| found + 1);
    }
    match index {
        Some(index) => index as usize,
        None => APPEND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_document::{Hazard, HazardDraft, StepDraft};
    use uuid::Uuid;

    fn doc_with_steps() -> Document {
        let mut doc = Document::new(sage_document::DocumentKind::RiskAssessment, "resolver");
        for activity in ["isolate", "drain", "dismantle"] {
            let mut step = Step::from_draft(StepDraft {
                activity: activity.to_owned(),
                notes: None,
            });
            step.order_index = doc.steps.len() as u32;
            doc.steps.push(step);
        }
        let step_id = doc.steps[1].id;
        doc.steps[1].hazards.push(Hazard::from_draft(
            step_id,
            HazardDraft {
                label: "residual pressure".to_owned(),
                ..HazardDraft::default()
            },
        ));
        doc
    }

    #[test]
    fn id_wins_over_index() {
        let doc = doc_with_steps();
        let location = Location {
            step: Some(doc.steps[2].id),
            step_index: Some(0),
            ..Location::default()
        };
        assert_eq!(step(&doc, &location), Ok(doc.steps[2].id));
    }

    #[test]
    fn stale_id_falls_back_to_index() {
        let doc = doc_with_steps();
        let location = Location {
            step: Some(StepId::new()),
            step_index: Some(1),
            ..Location::default()
        };
        assert_eq!(step(&doc, &location), Ok(doc.steps[1].id));
    }

    #[test]
    fn stale_id_without_index_fails() {
        let doc = doc_with_steps();
        let location = Location {
            step: Some(StepId::new()),
            ..Location::default()
        };
        assert_eq!(step(&doc, &location), Err(ResolveError("step")));
    }

    #[test]
    fn hazard_resolves_by_step_plus_index() {
        let doc = doc_with_steps();
        let location = Location {
            step_index: Some(1),
            hazard_index: Some(0),
            ..Location::default()
        };
        assert_eq!(hazard(&doc, &location), Ok(doc.steps[1].hazards[0].id));
    }

    #[test]
    fn anchor_slot_lands_after_the_anchor() {
        let doc = doc_with_steps();
        let location = Location {
            insert_after: Some(doc.steps[0].id.into()),
            ..Location::default()
        };
        assert_eq!(step_slot(&doc, &location), 1);
    }

    #[test]
    fn stale_anchor_appends() {
        let doc = doc_with_steps();
        let location = Location {
            insert_after: Some(EntityId::from_uuid(Uuid::new_v4())),
            ..Location::default()
        };
        assert_eq!(step_slot(&doc, &location), APPEND);
    }

    #[test]
    fn hazard_parent_follows_the_anchor_home() {
        let doc = doc_with_steps();
        let location = Location {
            insert_after: Some(doc.steps[1].hazards[0].id.into()),
            ..Location::default()
        };
        assert_eq!(hazard_parent(&doc, &location), Ok(doc.steps[1].id));
    }
}
