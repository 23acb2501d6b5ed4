//! Bug domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Bug severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BugSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Bug workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum BugStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// Bug entity; optionally linked to the run item that surfaced it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bug {
    pub id: StringUuid,
    pub project_id: StringUuid,
    pub run_item_id: Option<StringUuid>,
    pub title: String,
    pub description: Option<String>,
    pub severity: BugSeverity,
    pub status: BugStatus,
    pub reported_by: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Bug {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            project_id: StringUuid::nil(),
            run_item_id: None,
            title: String::new(),
            description: None,
            severity: BugSeverity::Medium,
            status: BugStatus::Open,
            reported_by: StringUuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for reporting a bug
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBugInput {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[validate(length(max = 8000))]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: BugSeverity,
    pub run_item_id: Option<Uuid>,
}

/// Input for updating a bug
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBugInput {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[validate(length(max = 8000))]
    pub description: Option<String>,
    pub severity: Option<BugSeverity>,
    pub status: Option<BugStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bug_defaults() {
        let bug = Bug::default();
        assert_eq!(bug.status, BugStatus::Open);
        assert_eq!(bug.severity, BugSeverity::Medium);
        assert!(bug.run_item_id.is_none());
    }

    #[test]
    fn test_bug_status_serialization() {
        assert_eq!(
            serde_json::to_string(&BugStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_create_bug_input_title_required() {
        let input = CreateBugInput {
            title: "".to_string(),
            description: None,
            severity: BugSeverity::High,
            run_item_id: None,
        };
        assert!(input.validate().is_err());
    }
}
