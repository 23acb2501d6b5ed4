//! Project domain model

use super::common::StringUuid;
use super::organization::validate_slug;
use super::roles::ProjectRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Project entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: StringUuid,
    pub organization_id: StringUuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            organization_id: StringUuid::nil(),
            name: String::new(),
            slug: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Project membership row, independent of the organization role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectMember {
    pub id: StringUuid,
    pub project_id: StringUuid,
    pub user_id: StringUuid,
    pub role: ProjectRole,
    pub added_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Input for updating a project
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Input for adding or updating a project member
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProjectMemberInput {
    pub user_id: Uuid,
    pub role: ProjectRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_default() {
        let project = Project::default();
        assert!(!project.id.is_nil());
        assert!(project.organization_id.is_nil());
    }

    #[test]
    fn test_create_project_input_valid() {
        let input = CreateProjectInput {
            name: "Mobile App".to_string(),
            slug: "mobile-app".to_string(),
            description: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_project_input_bad_slug() {
        let input = CreateProjectInput {
            name: "Mobile App".to_string(),
            slug: "Mobile App".to_string(),
            description: None,
        };
        assert!(input.validate().is_err());
    }
}
