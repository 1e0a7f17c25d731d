//! Type-safe identifiers.
//!
//! Newtype wrappers keep correlation ids from being confused with the
//! arbitrary strings carried in payloads.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CommandId
// ============================================================================

/// Correlation id pairing one outbound command with its reply.
///
/// Serialized as a hyphenated UUID string in the `cmdId` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Generates a fresh random (v4) id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id from its wire form.
    ///
    /// Returns `None` for anything that is not a UUID; such ids can never
    /// match a pending call.
    #[inline]
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CommandId {
    #[inline]
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let a = CommandId::generate();
        let b = CommandId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_display_agree() {
        let id = CommandId::generate();
        let parsed = CommandId::parse(&id.to_string()).expect("valid uuid");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CommandId::parse("").is_none());
        assert!(CommandId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = CommandId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{id}\""));
    }
}
