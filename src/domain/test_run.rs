//! Test run domain model
//!
//! A run snapshots a set of test cases as run items; item statuses feed the
//! run's aggregated metrics.

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Test run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Execution status of one case within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RunItemStatus {
    #[default]
    Untested,
    Passed,
    Failed,
    Blocked,
    Skipped,
}

/// Test run entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestRun {
    pub id: StringUuid,
    pub project_id: StringUuid,
    pub plan_id: Option<StringUuid>,
    pub name: String,
    pub status: RunStatus,
    pub created_by: StringUuid,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for TestRun {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            project_id: StringUuid::nil(),
            plan_id: None,
            name: String::new(),
            status: RunStatus::Pending,
            created_by: StringUuid::nil(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// One case execution within a run
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestRunItem {
    pub id: StringUuid,
    pub run_id: StringUuid,
    pub case_id: StringUuid,
    pub status: RunItemStatus,
    pub assignee_id: Option<StringUuid>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated item counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, FromRow)]
pub struct RunMetrics {
    pub total: i64,
    pub passed: i64,
    pub failed: i64,
    pub blocked: i64,
    pub skipped: i64,
    pub untested: i64,
}

/// Input for creating a test run.
///
/// The run is seeded with one item per selected case; `case_ids` empty means
/// "every case in the project".
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestRunInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub plan_id: Option<Uuid>,
    #[serde(default)]
    pub case_ids: Vec<Uuid>,
}

/// Input for updating a test run
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestRunInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Input for updating a run item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRunItemInput {
    pub status: Option<RunItemStatus>,
    pub assignee_id: Option<Uuid>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}
