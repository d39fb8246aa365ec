//! Errors raised by in-memory document edits.

use thiserror::Error;

use crate::ids::EntityId;

/// A structural edit the document model refuses to make.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A partial update tried to blank a field the document cannot lose.
    #[error("field {field:?} is required and cannot be cleared")]
    RequiredFieldCleared {
        /// Name of the rejected field.
        field: &'static str,
    },

    /// A reorder list named an id that is not a sibling in the scope.
    #[error("reorder list names unknown sibling {id}")]
    UnknownSibling {
        /// The id that matched nothing.
        id: EntityId,
    },

    /// A reorder list named the same sibling twice.
    #[error("reorder list names sibling {id} more than once")]
    DuplicateSibling {
        /// The repeated id.
        id: EntityId,
    },
}
