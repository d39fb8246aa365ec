//! Three-state update cell for partial edits.
//!
//! A modify payload must distinguish "leave this field alone" from
//! "blank this field out". JSON gives us exactly that for free: an
//! absent key is [`Patch::Keep`], an explicit `null` is
//! [`Patch::Clear`], and any other value is [`Patch::Set`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DocumentError;

/// A single field of a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched.
    #[default]
    Keep,
    /// Replace the current value.
    Set(T),
    /// Remove the current value.
    Clear,
}

impl<T> Patch<T> {
    /// True when the field is untouched.
    #[inline]
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// True when the field carries a replacement value.
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    /// True when the field is being blanked out.
    #[inline]
    #[must_use]
    pub fn is_clear(&self) -> bool {
        matches!(self, Patch::Clear)
    }

    /// Returns the replacement value, if any.
    #[must_use]
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Applies the patch to an optional field.
    pub fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = Some(value.clone()),
            Patch::Clear => *slot = None,
        }
    }

    /// Applies the patch to a field the document cannot lose.
    ///
    /// `Clear` is rejected rather than applied; callers surface the
    /// error instead of persisting a hole in a required field.
    pub fn apply_required(&self, slot: &mut T, field: &'static str) -> Result<(), DocumentError> {
        match self {
            Patch::Keep => Ok(()),
            Patch::Set(value) => {
                *slot = value.clone();
                Ok(())
            }
            Patch::Clear => Err(DocumentError::RequiredFieldCleared { field }),
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            // Keep is normally skipped via `skip_serializing_if`; if it
            // does reach the wire it degrades to Clear's encoding, so
            // patch structs must always skip it.
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<T>::deserialize(deserializer)?;
        Ok(match value {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}
