//! Organization domain model
//!
//! An organization is the tenant boundary: every project, and through it every
//! test artifact, belongs to exactly one organization.

use super::common::StringUuid;
use super::roles::OrgRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Organization entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: StringUuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Organization {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            slug: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Organization membership row.
///
/// Invariant: every organization keeps at least one `owner` membership; role
/// changes and removals that would break this are rejected before they apply.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationMember {
    pub id: StringUuid,
    pub organization_id: StringUuid,
    pub user_id: StringUuid,
    pub role: OrgRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrganizationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: String,
}

/// Input for updating an organization
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrganizationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Input for adding a member to an organization
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberInput {
    pub user_id: Uuid,
    pub role: OrgRole,
}

/// Input for changing a member's organization role
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRoleInput {
    pub role: OrgRole,
}

/// Validate slug format (e.g., "acme-qa", "team2")
pub(crate) fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_slug"))
    }
}

lazy_static::lazy_static! {
    pub static ref SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_slug_regex() {
        assert!(SLUG_REGEX.is_match("acme"));
        assert!(SLUG_REGEX.is_match("acme-qa"));
        assert!(SLUG_REGEX.is_match("team2-eu-west"));

        assert!(!SLUG_REGEX.is_match("Acme"));
        assert!(!SLUG_REGEX.is_match("acme_qa"));
        assert!(!SLUG_REGEX.is_match("-acme"));
        assert!(!SLUG_REGEX.is_match("acme-"));
        assert!(!SLUG_REGEX.is_match(""));
    }

    #[test]
    fn test_create_organization_input_valid() {
        let input = CreateOrganizationInput {
            name: "Acme QA".to_string(),
            slug: "acme-qa".to_string(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_organization_input_invalid_slug() {
        let input = CreateOrganizationInput {
            name: "Acme QA".to_string(),
            slug: "Acme QA".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_organization_input_empty_name() {
        let input = CreateOrganizationInput {
            name: "".to_string(),
            slug: "acme".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_member_role_deserialization() {
        let input: AddMemberInput = serde_json::from_str(
            r#"{"user_id": "550e8400-e29b-41d4-a716-446655440000", "role": "admin"}"#,
        )
        .unwrap();
        assert_eq!(input.role, OrgRole::Admin);
    }
}
