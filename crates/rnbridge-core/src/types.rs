//! Core types for the bridge
//!
//! Newtype wrappers keep registration tokens distinct from the UUIDs that
//! identify individual requests and events.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BridgeError;

// ----------------------------------------------------------------------------
// Registration Identifier
// ----------------------------------------------------------------------------

/// Opaque token returned when a handler or listener is registered
///
/// Identifiers are allocated by the bridge at registration time, before the
/// transport knows about the registration, and stay valid for the lifetime of
/// the process. The same identifier is handed to the transport when a queued
/// registration is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Allocate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| BridgeError::InvalidIdentifier {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifiers_are_unique() {
        let ids: HashSet<Identifier> = (0..1000).map(|_| Identifier::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_identifier_display_parse() {
        let id = Identifier::new();
        let parsed: Identifier = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let err = "not-a-uuid".parse::<Identifier>().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_identifier_serializes_as_plain_uuid() {
        let uuid = Uuid::new_v4();
        let id = Identifier::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
