//! The typed command model.
//!
//! Everything here has already survived validation: intents and
//! targets are real enum members, ids are well-formed, and `data` has
//! been narrowed to the payload shape its target demands. The applier
//! never touches raw JSON.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use sage_document::{
    ActionId, ActionPatch, ControlId, ControlPatch, EntityId, HazardId, HazardPatch, RatingPatch,
    RatingStage, StepId, StepPatch,
};

/// What a command wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Create at the end of the scope.
    Add,
    /// Patch fields of an existing entity.
    Modify,
    /// Remove an entity.
    Delete,
    /// Create at a specific position.
    Insert,
    /// Re-sequence a sibling scope.
    Reorder,
    /// Stop and ask the user a question.
    Clarify,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intent::Add => "ADD",
            Intent::Modify => "MODIFY",
            Intent::Delete => "DELETE",
            Intent::Insert => "INSERT",
            Intent::Reorder => "REORDER",
            Intent::Clarify => "CLARIFY",
        };
        f.write_str(label)
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADD" => Ok(Intent::Add),
            "MODIFY" => Ok(Intent::Modify),
            "DELETE" => Ok(Intent::Delete),
            "INSERT" => Ok(Intent::Insert),
            "REORDER" => Ok(Intent::Reorder),
            "CLARIFY" => Ok(Intent::Clarify),
            other => Err(other.to_owned()),
        }
    }
}

/// What a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Target {
    /// A process step or timeline event.
    Step,
    /// A hazard or contributing cause.
    Hazard,
    /// A control under a hazard.
    Control,
    /// A follow-up or corrective action.
    Action,
    /// A severity/likelihood rating on a hazard.
    Assessment,
    /// A bundle of sub-edits applied as one unit.
    Multiple,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Target::Step => "STEP",
            Target::Hazard => "HAZARD",
            Target::Control => "CONTROL",
            Target::Action => "ACTION",
            Target::Assessment => "ASSESSMENT",
            Target::Multiple => "MULTIPLE",
        };
        f.write_str(label)
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STEP" => Ok(Target::Step),
            "HAZARD" => Ok(Target::Hazard),
            "CONTROL" => Ok(Target::Control),
            "ACTION" => Ok(Target::Action),
            "ASSESSMENT" => Ok(Target::Assessment),
            "MULTIPLE" => Ok(Target::Multiple),
            other => Err(other.to_owned()),
        }
    }
}

/// A validated location bag with typed ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Step by id.
    #[serde(rename = "stepId", skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    /// Hazard by id.
    #[serde(rename = "hazardId", skip_serializing_if = "Option::is_none")]
    pub hazard: Option<HazardId>,
    /// Control by id.
    #[serde(rename = "controlId", skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlId>,
    /// Action by id.
    #[serde(rename = "actionId", skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionId>,
    /// Step by position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<u32>,
    /// Hazard by position within its step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard_index: Option<u32>,
    /// Control by position within its hazard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_index: Option<u32>,
    /// Action by position in the document list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_index: Option<u32>,
    /// Sibling to insert after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<EntityId>,
}

impl Location {
    /// True when no field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Location::default()
    }
}

/// Rating payload for `ASSESSMENT` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentData {
    /// Which of the hazard's two ratings to change.
    pub stage: RatingStage,
    /// The severity/likelihood changes themselves.
    pub rating: RatingPatch,
}

/// Payload for `REORDER` commands: the full new order of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderData {
    /// Sibling ids in their new order.
    pub ordered_ids: Vec<EntityId>,
}

/// The payload of a command, narrowed per target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandData {
    /// No payload (DELETE).
    None,
    /// Step fields (ADD/INSERT drafts and MODIFY patches share shape).
    Step(StepPatch),
    /// Hazard fields.
    Hazard(HazardPatch),
    /// Control fields.
    Control(ControlPatch),
    /// Action fields.
    Action(ActionPatch),
    /// Rating change.
    Assessment(AssessmentData),
    /// New sibling order.
    Reorder(ReorderData),
    /// Sub-edits applied as one unit.
    Multiple(Vec<Command>),
    /// Question for the user.
    Clarify {
        /// What to ask.
        prompt: Option<String>,
    },
}

/// One validated edit command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// What to do.
    pub intent: Intent,
    /// What to do it to.
    pub target: Target,
    /// Where to do it.
    pub location: Location,
    /// Target-specific payload.
    pub data: CommandData,
    /// Human-readable justification, surfaced but never interpreted.
    pub explanation: Option<String>,
}

impl Command {
    /// A clarification command carrying the collaborator's question.
    #[must_use]
    pub fn clarify(prompt: Option<String>) -> Self {
        Self {
            intent: Intent::Clarify,
            target: Target::Multiple,
            location: Location::default(),
            data: CommandData::Clarify { prompt },
            explanation: None,
        }
    }

    /// True when applying the command could change the document.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        match &self.data {
            CommandData::Clarify { .. } => false,
            CommandData::Multiple(inner) => inner.iter().any(Command::is_mutating),
            _ => self.intent != Intent::Clarify,
        }
    }

    /// The clarification prompt, when this is a clarify command.
    #[must_use]
    pub fn clarification_prompt(&self) -> Option<&str> {
        match &self.data {
            CommandData::Clarify { prompt } => prompt.as_deref().or(self.explanation.as_deref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_parses_any_case() {
        assert_eq!("modify".parse::<Intent>().unwrap(), Intent::Modify);
        assert_eq!(" REORDER ".parse::<Intent>().unwrap(), Intent::Reorder);
        assert!("UPSERT".parse::<Intent>().is_err());
    }

    #[test]
    fn target_round_trips_display() {
        for target in [
            Target::Step,
            Target::Hazard,
            Target::Control,
            Target::Action,
            Target::Assessment,
            Target::Multiple,
        ] {
            assert_eq!(target.to_string().parse::<Target>().unwrap(), target);
        }
    }

    #[test]
    fn clarify_commands_never_mutate() {
        let cmd = Command::clarify(Some("which step did you mean?".to_owned()));
        assert!(!cmd.is_mutating());
        assert_eq!(
            cmd.clarification_prompt(),
            Some("which step did you mean?")
        );
    }
}
