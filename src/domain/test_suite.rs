//! Test suite domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Test suite entity: a named grouping of test cases within a project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestSuite {
    pub id: StringUuid,
    pub project_id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TestSuite {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            project_id: StringUuid::nil(),
            name: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a test suite
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestSuiteInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
}

/// Input for updating a test suite
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestSuiteInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
}
