//! Validation: raw collaborator output in, typed commands out.
//!
//! This stage is a pure filter. A command that fails any check is
//! dropped with a recorded reason and the rest of the batch continues;
//! only a response that is not JSON at all fails the whole parse.
//! Nothing here reads or writes a document.

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use sage_document::{
    ActionPatch, ControlPatch, HazardPatch, Patch, RatingPatch, RatingStage, StepPatch,
};

use crate::command::{AssessmentData, Command, CommandData, Intent, Location, ReorderData, Target};
use crate::error::CommandError;
use crate::raw::{ParserOutput, RawCommand, RawLocation};

/// The outcome of compiling one collaborator response.
#[derive(Debug, Default)]
pub struct CompiledBatch {
    /// Commands that survived validation, in arrival order.
    pub commands: Vec<Command>,
    /// Collaborator's summary, used to tag the undo slot.
    pub summary: Option<String>,
    /// Commands that were dropped, with reasons.
    pub dropped: Vec<DroppedCommand>,
}

impl CompiledBatch {
    /// True when nothing survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The clarification question, when the batch is a clarify round.
    #[must_use]
    pub fn clarification(&self) -> Option<&str> {
        self.commands
            .iter()
            .find_map(Command::clarification_prompt)
    }
}

/// One command that did not survive validation.
#[derive(Debug)]
pub struct DroppedCommand {
    /// Position in the arriving batch.
    pub index: usize,
    /// Why it was dropped.
    pub reason: CommandError,
}

/// Compiles a full collaborator response into typed commands.
///
/// A `needsClarification` response compiles to a single clarify
/// command regardless of what else it claims to contain.
#[must_use]
pub fn compile_batch(output: ParserOutput) -> CompiledBatch {
    if output.needs_clarification {
        return CompiledBatch {
            commands: vec![Command::clarify(output.clarification_prompt)],
            summary: output.summary,
            dropped: Vec::new(),
        };
    }

    let mut commands = Vec::with_capacity(output.commands.len());
    let mut dropped = Vec::new();
    for (index, value) in output.commands.into_iter().enumerate() {
        match RawCommand::from_value(value).and_then(|raw| compile_command(raw, true)) {
            Ok(command) => commands.push(command),
            Err(reason) => dropped.push(DroppedCommand { index, reason }),
        }
    }
    CompiledBatch {
        commands,
        summary: output.summary,
        dropped,
    }
}

/// Compiles one raw command. `allow_multiple` is false for the
/// sub-edits of a MULTIPLE command, which may not nest further.
pub fn compile_command(raw: RawCommand, allow_multiple: bool) -> Result<Command, CommandError> {
    let intent: Intent = raw.intent.parse().map_err(CommandError::UnknownIntent)?;
    let target: Target = raw.target.parse().map_err(CommandError::UnknownTarget)?;

    if intent == Intent::Clarify {
        return Ok(Command {
            intent,
            target,
            location: Location::default(),
            data: CommandData::Clarify {
                prompt: clarify_prompt(raw.data.as_ref(), raw.explanation.as_deref()),
            },
            explanation: raw.explanation,
        });
    }

    if target == Target::Assessment && intent == Intent::Reorder {
        return Err(CommandError::UnsupportedCombination { intent, target });
    }
    if target == Target::Multiple && !allow_multiple {
        return Err(CommandError::NestedMultiple);
    }

    let needs_data = matches!(
        intent,
        Intent::Add | Intent::Modify | Intent::Insert | Intent::Reorder
    ) || target == Target::Multiple;
    if needs_data && raw.data.is_none() {
        return Err(CommandError::MissingData { intent, target });
    }

    let needs_location = matches!(intent, Intent::Modify | Intent::Delete | Intent::Reorder);
    if needs_location && raw.location.is_empty() {
        return Err(CommandError::MissingLocation { intent, target });
    }

    let location = compile_location(raw.location)?;
    let data = compile_data(intent, target, raw.data)?;

    Ok(Command {
        intent,
        target,
        location,
        data,
        explanation: raw.explanation,
    })
}

fn clarify_prompt(data: Option<&Value>, explanation: Option<&str>) -> Option<String> {
    let from_data = data.and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("clarificationPrompt")
            .or_else(|| map.get("prompt"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    });
    from_data.or_else(|| explanation.map(str::to_owned))
}

fn compile_location(raw: RawLocation) -> Result<Location, CommandError> {
    Ok(Location {
        step: parse_id(raw.step_id, "stepId")?,
        hazard: parse_id(raw.hazard_id, "hazardId")?,
        control: parse_id(raw.control_id, "controlId")?,
        action: parse_id(raw.action_id, "actionId")?,
        step_index: raw.step_index,
        hazard_index: raw.hazard_index,
        control_index: raw.control_index,
        action_index: raw.action_index,
        insert_after: parse_id(raw.insert_after, "insertAfter")?,
    })
}

fn parse_id<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<T>, CommandError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    // Collaborators sometimes send "" for "no id"; treat as absent.
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse() {
        Ok(id) => Ok(Some(id)),
        Err(_) => Err(CommandError::InvalidId { field, value: raw }),
    }
}

fn compile_data(
    intent: Intent,
    target: Target,
    data: Option<Value>,
) -> Result<CommandData, CommandError> {
    match (intent, target) {
        (Intent::Delete, Target::Step | Target::Hazard | Target::Control | Target::Action) => {
            Ok(CommandData::None)
        }
        (_, Target::Step) => compile_step_data(intent, data),
        (_, Target::Hazard) => compile_hazard_data(intent, data),
        (_, Target::Control) => compile_control_data(intent, data),
        (_, Target::Action) => compile_action_data(intent, data),
        (_, Target::Assessment) => compile_assessment_data(intent, data),
        (_, Target::Multiple) => compile_multiple_data(data),
    }
}

fn compile_step_data(intent: Intent, data: Option<Value>) -> Result<CommandData, CommandError> {
    if intent == Intent::Reorder {
        return compile_reorder_data(Target::Step, data);
    }
    let mut patch: StepPatch = from_payload(Target::Step, data)?;
    patch.activity = required_text(patch.activity, intent, Target::Step, "activity")?;
    patch.notes = optional_text(patch.notes);
    Ok(CommandData::Step(patch))
}

fn compile_hazard_data(intent: Intent, data: Option<Value>) -> Result<CommandData, CommandError> {
    if intent == Intent::Reorder {
        return compile_reorder_data(Target::Hazard, data);
    }
    let mut patch: HazardPatch = from_payload(Target::Hazard, data)?;
    patch.label = required_text(patch.label, intent, Target::Hazard, "label")?;
    patch.description = optional_text(patch.description);
    patch.category_code = optional_text(patch.category_code);
    Ok(CommandData::Hazard(patch))
}

fn compile_control_data(intent: Intent, data: Option<Value>) -> Result<CommandData, CommandError> {
    if intent == Intent::Reorder {
        return compile_reorder_data(Target::Control, data);
    }
    let mut patch: ControlPatch = from_payload(Target::Control, data)?;
    patch.description = required_text(patch.description, intent, Target::Control, "description")?;
    if patch.existing.is_clear() {
        return Err(CommandError::ClearedRequiredField { field: "existing" });
    }
    Ok(CommandData::Control(patch))
}

fn compile_action_data(intent: Intent, data: Option<Value>) -> Result<CommandData, CommandError> {
    if intent == Intent::Reorder {
        return compile_reorder_data(Target::Action, data);
    }
    let mut patch: ActionPatch = from_payload(Target::Action, data)?;
    patch.description = required_text(patch.description, intent, Target::Action, "description")?;
    patch.owner = optional_text(patch.owner);
    if patch.done.is_clear() {
        return Err(CommandError::ClearedRequiredField { field: "done" });
    }
    Ok(CommandData::Action(patch))
}

/// Wire shape of an assessment payload. Levels arrive as strings and
/// are parsed leniently ("Almost Certain" and "almost_certain" both
/// work), since this field is where collaborator spelling drifts most.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAssessment {
    stage: Option<String>,
    severity: Patch<String>,
    likelihood: Patch<String>,
}

fn compile_assessment_data(
    intent: Intent,
    data: Option<Value>,
) -> Result<CommandData, CommandError> {
    let raw: RawAssessment = from_payload(Target::Assessment, data)?;
    let stage = match raw.stage.as_deref().map(str::trim) {
        None | Some("") => RatingStage::default(),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "initial" => RatingStage::Initial,
            "residual" => RatingStage::Residual,
            other => {
                return Err(assessment_error(format!("unknown rating stage {other:?}")));
            }
        },
    };

    if intent == Intent::Delete {
        // Deleting an assessment clears both halves of the stage.
        return Ok(CommandData::Assessment(AssessmentData {
            stage,
            rating: RatingPatch {
                severity: Patch::Clear,
                likelihood: Patch::Clear,
            },
        }));
    }

    let rating = RatingPatch {
        severity: parse_level(raw.severity, "severity")?,
        likelihood: parse_level(raw.likelihood, "likelihood")?,
    };
    if rating.is_noop() {
        return Err(CommandError::MissingField {
            target: Target::Assessment,
            field: "severity or likelihood",
        });
    }
    Ok(CommandData::Assessment(AssessmentData { stage, rating }))
}

fn parse_level<T: std::str::FromStr>(
    raw: Patch<String>,
    field: &'static str,
) -> Result<Patch<T>, CommandError> {
    match raw {
        Patch::Keep => Ok(Patch::Keep),
        Patch::Clear => Ok(Patch::Clear),
        Patch::Set(text) => text
            .parse()
            .map(Patch::Set)
            .map_err(|_| assessment_error(format!("unknown {field} level {text:?}"))),
    }
}

fn assessment_error(message: String) -> CommandError {
    CommandError::MalformedData {
        target: Target::Assessment,
        source: serde_json::Error::custom(message),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReorder {
    #[serde(alias = "ids", alias = "order")]
    ordered_ids: Vec<String>,
}

fn compile_reorder_data(target: Target, data: Option<Value>) -> Result<CommandData, CommandError> {
    let raw: RawReorder = from_payload(target, data)?;
    if raw.ordered_ids.is_empty() {
        return Err(CommandError::EmptyReorder);
    }
    let mut ordered_ids = Vec::with_capacity(raw.ordered_ids.len());
    for id in raw.ordered_ids {
        match parse_id(Some(id), "orderedIds")? {
            Some(parsed) => ordered_ids.push(parsed),
            // "" entries were treated as absent; a blank slot in an
            // order list is meaningless, reject the command.
            None => return Err(CommandError::EmptyReorder),
        }
    }
    Ok(CommandData::Reorder(ReorderData { ordered_ids }))
}

fn compile_multiple_data(data: Option<Value>) -> Result<CommandData, CommandError> {
    let value = data.ok_or(CommandError::EmptyMultiple)?;
    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut map) => match map.remove("commands") {
            Some(Value::Array(elements)) => elements,
            _ => return Err(CommandError::EmptyMultiple),
        },
        _ => return Err(CommandError::EmptyMultiple),
    };
    if elements.is_empty() {
        return Err(CommandError::EmptyMultiple);
    }

    // Sub-edits apply as one unit, so they validate as one unit: any
    // bad sub-edit drops the whole bundle.
    let mut commands = Vec::with_capacity(elements.len());
    for element in elements {
        let raw = RawCommand::from_value(element)?;
        commands.push(compile_command(raw, false)?);
    }
    Ok(CommandData::Multiple(commands))
}

fn from_payload<T: serde::de::DeserializeOwned>(
    target: Target,
    data: Option<Value>,
) -> Result<T, CommandError> {
    let value = data.unwrap_or(Value::Null);
    // Null stands in for "no fields mentioned" so DELETE-style payloads
    // deserialize into all-Keep patches.
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|source| CommandError::MalformedData { target, source })
}

/// Normalizes a required text field.
///
/// Creates must supply it non-blank; modifies may leave it alone but
/// can never blank it.
fn required_text(
    patch: Patch<String>,
    intent: Intent,
    target: Target,
    field: &'static str,
) -> Result<Patch<String>, CommandError> {
    let creating = matches!(intent, Intent::Add | Intent::Insert);
    match patch {
        Patch::Keep if creating => Err(CommandError::MissingField { target, field }),
        Patch::Keep => Ok(Patch::Keep),
        Patch::Clear => Err(CommandError::ClearedRequiredField { field }),
        Patch::Set(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                if creating {
                    Err(CommandError::MissingField { target, field })
                } else {
                    Err(CommandError::ClearedRequiredField { field })
                }
            } else if trimmed.len() == text.len() {
                Ok(Patch::Set(text))
            } else {
                Ok(Patch::Set(trimmed.to_owned()))
            }
        }
    }
}

/// Normalizes an optional text field: blank strings become Clear.
fn optional_text(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Set(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Patch::Clear
            } else if trimmed.len() == text.len() {
                Patch::Set(text)
            } else {
                Patch::Set(trimmed.to_owned())
            }
        }
        other => other,
    }
}
