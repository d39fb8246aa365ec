//! Why a batch, or one command in it, was rejected.

use thiserror::Error;

use crate::command::{Intent, Target};

/// A structural problem with collaborator output.
///
/// Batch-level variants abort the whole parse; command-level variants
/// drop just the offending command while the batch continues.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The whole response was not valid JSON.
    #[error("batch is not valid json: {0}")]
    MalformedBatch(#[source] serde_json::Error),

    /// One command element was not a command-shaped object.
    #[error("command is not a valid object: {0}")]
    MalformedCommand(#[source] serde_json::Error),

    /// The intent string matches no known member.
    #[error("unknown intent {0:?}")]
    UnknownIntent(String),

    /// The target string matches no known member.
    #[error("unknown target {0:?}")]
    UnknownTarget(String),

    /// The intent and target do not form a supported edit.
    #[error("{intent} is not supported for {target}")]
    UnsupportedCombination {
        /// Claimed intent.
        intent: Intent,
        /// Claimed target.
        target: Target,
    },

    /// A data-carrying intent arrived without data.
    #[error("{intent} {target} requires data")]
    MissingData {
        /// Claimed intent.
        intent: Intent,
        /// Claimed target.
        target: Target,
    },

    /// A location-addressed intent arrived without a location.
    #[error("{intent} {target} requires a location")]
    MissingLocation {
        /// Claimed intent.
        intent: Intent,
        /// Claimed target.
        target: Target,
    },

    /// A location id field did not hold a well-formed id.
    #[error("location field {field} holds invalid id {value:?}")]
    InvalidId {
        /// Which location field.
        field: &'static str,
        /// The unparseable value.
        value: String,
    },

    /// The data payload did not match the target's shape.
    #[error("data for {target} is malformed: {source}")]
    MalformedData {
        /// Claimed target.
        target: Target,
        /// What serde rejected.
        #[source]
        source: serde_json::Error,
    },

    /// A create payload is missing a field the entity cannot exist
    /// without, or supplies it blank.
    #[error("{target} data is missing required field {field:?}")]
    MissingField {
        /// Claimed target.
        target: Target,
        /// The absent field.
        field: &'static str,
    },

    /// A modify payload tried to null out a required field.
    #[error("field {field:?} is required and cannot be cleared")]
    ClearedRequiredField {
        /// The protected field.
        field: &'static str,
    },

    /// A reorder payload listed no sibling ids.
    #[error("reorder data lists no sibling ids")]
    EmptyReorder,

    /// A multiple command nested another multiple command.
    #[error("multiple commands cannot nest")]
    NestedMultiple,

    /// A multiple command ended up with no usable sub-edits.
    #[error("multiple command contains no usable sub-edits")]
    EmptyMultiple,
}

impl CommandError {
    /// True for errors that fail the whole parse rather than one
    /// command.
    #[must_use]
    pub fn is_batch_level(&self) -> bool {
        matches!(self, CommandError::MalformedBatch(_))
    }
}
