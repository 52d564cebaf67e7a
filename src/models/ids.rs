//! Entity ID newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque entity identifier (UUIDv4 under the hood).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create an EntityId from an existing string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a fresh random EntityId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for user IDs
pub type UserId = EntityId;

/// Type alias for project IDs
pub type ProjectId = EntityId;

/// Type alias for sprint IDs
pub type SprintId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let id1 = EntityId::generate();
        let id2 = EntityId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_is_uuid() {
        let id = EntityId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_entity_id_serialization() {
        let id = EntityId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("abc123".to_string());
        assert_eq!(format!("{}", id), "abc123");
    }

    #[test]
    fn test_entity_id_from_str() {
        let id = EntityId::from("some-id");
        assert_eq!(id.as_str(), "some-id");
    }

    #[test]
    fn test_entity_id_equality() {
        let id1 = EntityId::from("same");
        let id2 = EntityId::from("same");
        let id3 = EntityId::from("different");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }
}
