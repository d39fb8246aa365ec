//! The nested entities of an assessment document.
//!
//! Steps own hazards, hazards own controls. Actions are document-level
//! but always point back at a hazard. Each entity type pairs with a
//! draft (creation payload, ids assigned by the store) and a patch
//! (partial update).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::ids::{ActionId, ControlId, EntityId, HazardId, StepId};
use crate::order::Orderable;
use crate::patch::Patch;
use crate::rating::{RatingStage, RiskRating};

/// One step of the work being assessed (or, for an incident document,
/// one event on the timeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Stable id.
    pub id: StepId,
    /// Zero-based position among the document's steps.
    pub order_index: u32,
    /// What happens in this step.
    pub activity: String,
    /// Free-form facilitator notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Hazards identified for this step, in discussion order.
    #[serde(default)]
    pub hazards: Vec<Hazard>,
}

impl Step {
    /// Builds a step from a draft. The caller renumbers the scope.
    #[must_use]
    pub fn from_draft(draft: StepDraft) -> Self {
        Self {
            id: StepId::new(),
            order_index: 0,
            activity: draft.activity,
            notes: draft.notes,
            hazards: Vec::new(),
        }
    }

    /// Looks up a hazard owned by this step.
    #[must_use]
    pub fn hazard(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards.iter().find(|hazard| hazard.id == id)
    }

    /// Mutable hazard lookup.
    pub fn hazard_mut(&mut self, id: HazardId) -> Option<&mut Hazard> {
        self.hazards.iter_mut().find(|hazard| hazard.id == id)
    }
}

impl Orderable for Step {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn order_index(&self) -> u32 {
        self.order_index
    }

    fn set_order_index(&mut self, index: u32) {
        self.order_index = index;
    }
}

/// Creation payload for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    /// What happens in this step.
    pub activity: String,
    /// Free-form facilitator notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepPatch {
    /// Activity change. Clearing is rejected, every step needs one.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub activity: Patch<String>,
    /// Notes change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

impl StepPatch {
    /// True when the patch would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.activity.is_keep() && self.notes.is_keep()
    }

    /// Applies the patch in place.
    pub fn apply(&self, step: &mut Step) -> Result<(), DocumentError> {
        self.activity.apply_required(&mut step.activity, "activity")?;
        self.notes.apply_to(&mut step.notes);
        Ok(())
    }
}

/// A hazard raised against a step (or, for an incident document, a
/// contributing cause).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hazard {
    /// Stable id.
    pub id: HazardId,
    /// Owning step.
    pub step_id: StepId,
    /// Zero-based position among the step's hazards.
    pub order_index: u32,
    /// Short name used when talking about the hazard.
    pub label: String,
    /// Longer description of the harm scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Taxonomy code, chosen from the tenant's hazard catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_code: Option<String>,
    /// Pre-control rating.
    #[serde(default)]
    pub rating: RiskRating,
    /// Rating with controls in place.
    #[serde(default)]
    pub residual_rating: RiskRating,
    /// Controls discussed for this hazard, in discussion order.
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl Hazard {
    /// Builds a hazard from a draft. The caller renumbers the scope.
    #[must_use]
    pub fn from_draft(step_id: StepId, draft: HazardDraft) -> Self {
        Self {
            id: HazardId::new(),
            step_id,
            order_index: 0,
            label: draft.label,
            description: draft.description,
            category_code: draft.category_code,
            rating: RiskRating::default(),
            residual_rating: RiskRating::default(),
            controls: Vec::new(),
        }
    }

    /// Looks up a control owned by this hazard.
    #[must_use]
    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|control| control.id == id)
    }

    /// Mutable control lookup.
    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.id == id)
    }

    /// The rating for a given stage.
    #[must_use]
    pub fn rating_for(&self, stage: RatingStage) -> &RiskRating {
        match stage {
            RatingStage::Initial => &self.rating,
            RatingStage::Residual => &self.residual_rating,
        }
    }

    /// Mutable rating access for a given stage.
    pub fn rating_for_mut(&mut self, stage: RatingStage) -> &mut RiskRating {
        match stage {
            RatingStage::Initial => &mut self.rating,
            RatingStage::Residual => &mut self.residual_rating,
        }
    }

    /// The rating that currently best describes the hazard: residual
    /// once scored, otherwise initial.
    #[must_use]
    pub fn effective_rating(&self) -> &RiskRating {
        if self.residual_rating.is_complete() {
            &self.residual_rating
        } else {
            &self.rating
        }
    }
}

impl Orderable for Hazard {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn order_index(&self) -> u32 {
        self.order_index
    }

    fn set_order_index(&mut self, index: u32) {
        self.order_index = index;
    }
}

/// Creation payload for a hazard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardDraft {
    /// Short name used when talking about the hazard.
    pub label: String,
    /// Longer description of the harm scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Taxonomy code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_code: Option<String>,
}

/// Partial update for a hazard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HazardPatch {
    /// Label change. Clearing is rejected.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub label: Patch<String>,
    /// Description change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    /// Category change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub category_code: Patch<String>,
}

impl HazardPatch {
    /// True when the patch would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.label.is_keep() && self.description.is_keep() && self.category_code.is_keep()
    }

    /// Applies the patch in place.
    pub fn apply(&self, hazard: &mut Hazard) -> Result<(), DocumentError> {
        self.label.apply_required(&mut hazard.label, "label")?;
        self.description.apply_to(&mut hazard.description);
        self.category_code.apply_to(&mut hazard.category_code);
        Ok(())
    }
}

/// Where a control sits in the hierarchy of controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Remove the hazard entirely.
    Elimination,
    /// Swap in something less hazardous.
    Substitution,
    /// Isolate people from the hazard.
    Engineering,
    /// Change how people work.
    Administrative,
    /// Personal protective equipment.
    Ppe,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ControlKind::Elimination => "elimination",
            ControlKind::Substitution => "substitution",
            ControlKind::Engineering => "engineering",
            ControlKind::Administrative => "administrative",
            ControlKind::Ppe => "ppe",
        };
        f.write_str(label)
    }
}

impl FromStr for ControlKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elimination" => Ok(ControlKind::Elimination),
            "substitution" => Ok(ControlKind::Substitution),
            "engineering" => Ok(ControlKind::Engineering),
            "administrative" => Ok(ControlKind::Administrative),
            "ppe" => Ok(ControlKind::Ppe),
            other => Err(format!("unknown control kind {other:?}")),
        }
    }
}

/// A control that reduces a hazard's risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Stable id.
    pub id: ControlId,
    /// Owning hazard.
    pub hazard_id: HazardId,
    /// Zero-based position among the hazard's controls.
    pub order_index: u32,
    /// What the control is.
    pub description: String,
    /// Hierarchy classification, when discussed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ControlKind>,
    /// True for controls already in place, false for proposed ones.
    #[serde(default)]
    pub existing: bool,
}

impl Control {
    /// Builds a control from a draft. The caller renumbers the scope.
    #[must_use]
    pub fn from_draft(hazard_id: HazardId, draft: ControlDraft) -> Self {
        Self {
            id: ControlId::new(),
            hazard_id,
            order_index: 0,
            description: draft.description,
            kind: draft.kind,
            existing: draft.existing,
        }
    }
}

impl Orderable for Control {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn order_index(&self) -> u32 {
        self.order_index
    }

    fn set_order_index(&mut self, index: u32) {
        self.order_index = index;
    }
}

/// Creation payload for a control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDraft {
    /// What the control is.
    pub description: String,
    /// Hierarchy classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ControlKind>,
    /// True for controls already in place.
    #[serde(default)]
    pub existing: bool,
}

/// Partial update for a control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlPatch {
    /// Description change. Clearing is rejected.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    /// Hierarchy classification change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub kind: Patch<ControlKind>,
    /// Existing/proposed flag change. Clearing is rejected.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub existing: Patch<bool>,
}

impl ControlPatch {
    /// True when the patch would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.description.is_keep() && self.kind.is_keep() && self.existing.is_keep()
    }

    /// Applies the patch in place.
    pub fn apply(&self, control: &mut Control) -> Result<(), DocumentError> {
        self.description
            .apply_required(&mut control.description, "description")?;
        self.kind.apply_to(&mut control.kind);
        self.existing.apply_required(&mut control.existing, "existing")?;
        Ok(())
    }
}

/// A follow-up action tracked at document level (or, for an incident
/// document, a corrective action).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Stable id.
    pub id: ActionId,
    /// The hazard the action addresses.
    pub hazard_id: HazardId,
    /// Zero-based position in the document's action list.
    pub order_index: u32,
    /// What has to be done.
    pub description: String,
    /// Who owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// When it is due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Completion flag.
    #[serde(default)]
    pub done: bool,
}

impl Action {
    /// Builds an action from a draft. The caller renumbers the scope.
    #[must_use]
    pub fn from_draft(draft: ActionDraft) -> Self {
        Self {
            id: ActionId::new(),
            hazard_id: draft.hazard_id,
            order_index: 0,
            description: draft.description,
            owner: draft.owner,
            due_date: draft.due_date,
            done: false,
        }
    }
}

impl Orderable for Action {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn order_index(&self) -> u32 {
        self.order_index
    }

    fn set_order_index(&mut self, index: u32) {
        self.order_index = index;
    }
}

/// Creation payload for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDraft {
    /// The hazard the action addresses.
    pub hazard_id: HazardId,
    /// What has to be done.
    pub description: String,
    /// Who owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// When it is due.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Partial update for an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPatch {
    /// Description change. Clearing is rejected.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    /// Owner change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub owner: Patch<String>,
    /// Due date change.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub due_date: Patch<NaiveDate>,
    /// Completion flag change. Clearing is rejected.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub done: Patch<bool>,
}

impl ActionPatch {
    /// True when the patch would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.description.is_keep()
            && self.owner.is_keep()
            && self.due_date.is_keep()
            && self.done.is_keep()
    }

    /// Applies the patch in place.
    pub fn apply(&self, action: &mut Action) -> Result<(), DocumentError> {
        self.description
            .apply_required(&mut action.description, "description")?;
        self.owner.apply_to(&mut action.owner);
        self.due_date.apply_to(&mut action.due_date);
        self.done.apply_required(&mut action.done, "done")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{Likelihood, Severity};

    #[test]
    fn step_patch_keeps_unmentioned_fields() {
        let mut step = Step::from_draft(StepDraft {
            activity: "isolate power".to_owned(),
            notes: Some("lockout kit in bay 3".to_owned()),
        });
        StepPatch {
            activity: Patch::Set("isolate and tag power".to_owned()),
            notes: Patch::Keep,
        }
        .apply(&mut step)
        .unwrap();
        assert_eq!(step.activity, "isolate and tag power");
        assert_eq!(step.notes.as_deref(), Some("lockout kit in bay 3"));
    }

    #[test]
    fn clearing_a_required_field_fails_without_mutating() {
        let mut control = Control::from_draft(
            HazardId::new(),
            ControlDraft {
                description: "machine guard".to_owned(),
                kind: Some(ControlKind::Engineering),
                existing: true,
            },
        );
        let err = ControlPatch {
            description: Patch::Clear,
            ..ControlPatch::default()
        }
        .apply(&mut control)
        .unwrap_err();
        assert_eq!(
            err,
            DocumentError::RequiredFieldCleared {
                field: "description"
            }
        );
        assert_eq!(control.description, "machine guard");
    }

    #[test]
    fn effective_rating_prefers_complete_residual() {
        let mut hazard = Hazard::from_draft(
            StepId::new(),
            HazardDraft {
                label: "pinch point".to_owned(),
                ..HazardDraft::default()
            },
        );
        hazard.rating = RiskRating::new(Severity::Severe, Likelihood::Likely);
        assert_eq!(hazard.effective_rating(), &hazard.rating);

        hazard.residual_rating.severity = Some(Severity::Minor);
        // Half a residual rating is not yet trusted.
        assert_eq!(hazard.effective_rating(), &hazard.rating);

        hazard.residual_rating.likelihood = Some(Likelihood::Unlikely);
        assert_eq!(hazard.effective_rating(), &hazard.residual_rating);
    }

    #[test]
    fn hazard_patch_can_clear_optional_fields() {
        let mut hazard = Hazard::from_draft(
            StepId::new(),
            HazardDraft {
                label: "noise".to_owned(),
                description: Some("impact wrench".to_owned()),
                category_code: Some("PHY-04".to_owned()),
            },
        );
        HazardPatch {
            label: Patch::Keep,
            description: Patch::Clear,
            category_code: Patch::Set("PHY-01".to_owned()),
        }
        .apply(&mut hazard)
        .unwrap();
        assert_eq!(hazard.description, None);
        assert_eq!(hazard.category_code.as_deref(), Some("PHY-01"));
    }
}
