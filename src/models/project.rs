//! Project model and name validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, ProjectId, UserId};

/// Maximum project name length after trimming.
pub const MAX_NAME_LEN: usize = 100;

/// A named project that sprints are recorded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,

    /// Owning user
    pub user_id: UserId,

    /// Display name, 1..=100 chars, unique per user case-insensitively
    pub name: String,

    /// When this project was created
    pub created_at: DateTime<Utc>,

    /// When this project was last renamed
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project. The name must already be validated.
    pub fn new(user_id: UserId, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            user_id,
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate and normalize a project name. Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    Ok(trimmed.to_string())
}

/// Project name validation errors.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Project name cannot be empty")]
    Empty,

    #[error("Project name cannot exceed {MAX_NAME_LEN} characters")]
    TooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = Project::new("user-1".into(), "Design".to_string());
        assert_eq!(project.name, "Design");
        assert_eq!(project.user_id.as_str(), "user-1");
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  Design  ").unwrap(), "Design");
    }

    #[test]
    fn test_validate_name_empty() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("   "), Err(NameError::Empty));
    }

    #[test]
    fn test_validate_name_too_long() {
        let name = "x".repeat(101);
        assert_eq!(validate_name(&name), Err(NameError::TooLong));
    }

    #[test]
    fn test_validate_name_max_length_ok() {
        let name = "x".repeat(100);
        assert!(validate_name(&name).is_ok());
    }

    #[test]
    fn test_project_serialization() {
        let project = Project::new("user-1".into(), "Writing".to_string());
        let json = serde_json::to_string(&project).unwrap();
        let deserialized: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(project.id, deserialized.id);
        assert_eq!(project.name, deserialized.name);
    }
}
