//! Test plan domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Test plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

/// Test plan entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestPlan {
    pub id: StringUuid,
    pub project_id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PlanStatus,
    pub created_by: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TestPlan {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            project_id: StringUuid::nil(),
            name: String::new(),
            description: None,
            status: PlanStatus::Draft,
            created_by: StringUuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a test plan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestPlanInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
}

/// Input for updating a test plan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestPlanInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub status: Option<PlanStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PlanStatus::Active).unwrap(),
            "\"active\""
        );
        let status: PlanStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, PlanStatus::Completed);
    }

    #[test]
    fn test_create_plan_input_empty_name() {
        let input = CreateTestPlanInput {
            name: "".to_string(),
            description: None,
        };
        assert!(input.validate().is_err());
    }
}
