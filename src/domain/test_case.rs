//! Test case domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Test case priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// One manual step of a test case, stored as JSON on the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub action: String,
    pub expected: String,
}

/// Test case entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestCase {
    pub id: StringUuid,
    pub suite_id: StringUuid,
    pub project_id: StringUuid,
    pub title: String,
    /// JSON array of [`TestStep`]
    pub steps: sqlx::types::Json<Vec<TestStep>>,
    pub priority: CasePriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TestCase {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            suite_id: StringUuid::nil(),
            project_id: StringUuid::nil(),
            title: String::new(),
            steps: sqlx::types::Json(vec![]),
            priority: CasePriority::Medium,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a test case
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestCaseInput {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(default)]
    pub priority: CasePriority,
}

/// Input for updating a test case
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestCaseInput {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    pub steps: Option<Vec<TestStep>>,
    pub priority: Option<CasePriority>,
}
