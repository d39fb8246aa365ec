//! Wire form of the text-understanding collaborator's output.
//!
//! The collaborator is an external service and its output is only a
//! contract, so this layer is deliberately loose: intents and targets
//! arrive as strings, ids as strings, payloads as raw JSON. One
//! malformed element must not sink the rest of the batch, which is why
//! `commands` is parsed element by element rather than as a typed list.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CommandError;

/// One parse round from the collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOutput {
    /// Proposed edit commands, kept raw until compiled.
    pub commands: Vec<Value>,
    /// Collaborator's one-line summary of the whole batch.
    pub summary: Option<String>,
    /// True when the collaborator wants the user to answer first.
    pub needs_clarification: bool,
    /// The question to surface when clarification is needed.
    pub clarification_prompt: Option<String>,
    /// Unprocessed collaborator output, kept for audit logs.
    pub raw_response: Option<String>,
}

impl ParserOutput {
    /// Parses a full collaborator response.
    ///
    /// Only the envelope has to be well-formed JSON; individual command
    /// elements are judged later, one by one.
    pub fn from_json(input: &str) -> Result<Self, CommandError> {
        serde_json::from_str(input).map_err(CommandError::MalformedBatch)
    }

    /// Parses a bare JSON array of commands, the shape used when the
    /// collaborator replies without an envelope.
    pub fn from_command_array(input: &str) -> Result<Self, CommandError> {
        let commands: Vec<Value> =
            serde_json::from_str(input).map_err(CommandError::MalformedBatch)?;
        Ok(Self {
            commands,
            ..Self::default()
        })
    }
}

/// One command as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommand {
    /// Claimed intent, matched against the known set at compile time.
    pub intent: String,
    /// Claimed target, matched against the known set at compile time.
    pub target: String,
    /// Disambiguation bag, all fields optional.
    #[serde(default)]
    pub location: RawLocation,
    /// Target-specific payload, shape checked at compile time.
    #[serde(default)]
    pub data: Option<Value>,
    /// Human-readable justification, surfaced but never interpreted.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl RawCommand {
    /// Reads one command out of a raw batch element.
    pub fn from_value(value: Value) -> Result<Self, CommandError> {
        serde_json::from_value(value).map_err(CommandError::MalformedCommand)
    }
}

/// The location bag as it appears on the wire. Ids are strings here;
/// they only become typed ids once the target scope is known.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLocation {
    /// Step by id.
    pub step_id: Option<String>,
    /// Hazard by id.
    pub hazard_id: Option<String>,
    /// Control by id.
    pub control_id: Option<String>,
    /// Action by id.
    pub action_id: Option<String>,
    /// Step by position.
    pub step_index: Option<u32>,
    /// Hazard by position within its step.
    pub hazard_index: Option<u32>,
    /// Control by position within its hazard.
    pub control_index: Option<u32>,
    /// Action by position in the document list.
    pub action_index: Option<u32>,
    /// Sibling to insert after.
    pub insert_after: Option<String>,
}

impl RawLocation {
    /// True when no field is populated at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.step_id.is_none()
            && self.hazard_id.is_none()
            && self.control_id.is_none()
            && self.action_id.is_none()
            && self.step_index.is_none()
            && self.hazard_index.is_none()
            && self.control_index.is_none()
            && self.action_index.is_none()
            && self.insert_after.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_unknown_keys_still_parses() {
        let output = ParserOutput::from_json(
            r#"{
                "commands": [{"intent": "ADD", "target": "STEP", "data": {"activity": "x"}}],
                "summary": "add a step",
                "confidence": 0.93
            }"#,
        )
        .unwrap();
        assert_eq!(output.commands.len(), 1);
        assert_eq!(output.summary.as_deref(), Some("add a step"));
        assert!(!output.needs_clarification);
    }

    #[test]
    fn bare_array_parses_without_envelope() {
        let output = ParserOutput::from_command_array(r#"[{"intent":"CLARIFY","target":"STEP"}]"#)
            .unwrap();
        assert_eq!(output.commands.len(), 1);
    }

    #[test]
    fn non_json_batch_is_a_hard_error() {
        assert!(ParserOutput::from_json("add a step please").is_err());
    }

    #[test]
    fn command_with_missing_intent_fails_alone() {
        let value: Value = serde_json::from_str(r#"{"target": "STEP"}"#).unwrap();
        assert!(RawCommand::from_value(value).is_err());
    }

    #[test]
    fn empty_location_detected() {
        assert!(RawLocation::default().is_empty());
        let populated = RawLocation {
            step_index: Some(0),
            ..RawLocation::default()
        };
        assert!(!populated.is_empty());
    }
}
