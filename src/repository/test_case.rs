//! Test case repository

use crate::domain::{CreateTestCaseInput, TestCase, UpdateTestCaseInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestCaseRepository: Send + Sync {
    async fn create(
        &self,
        suite_id: Uuid,
        project_id: Uuid,
        input: &CreateTestCaseInput,
    ) -> Result<TestCase>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestCase>>;
    async fn list_by_suite(&self, suite_id: Uuid, offset: i64, limit: i64)
        -> Result<Vec<TestCase>>;
    async fn count_by_suite(&self, suite_id: Uuid) -> Result<i64>;
    async fn list_ids_by_project(&self, project_id: Uuid) -> Result<Vec<Uuid>>;
    async fn update(&self, id: Uuid, input: &UpdateTestCaseInput) -> Result<TestCase>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

const CASE_COLUMNS: &str =
    "id, suite_id, project_id, title, steps, priority, created_at, updated_at";

pub struct TestCaseRepositoryImpl {
    pool: MySqlPool,
}

impl TestCaseRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestCaseRepository for TestCaseRepositoryImpl {
    async fn create(
        &self,
        suite_id: Uuid,
        project_id: Uuid,
        input: &CreateTestCaseInput,
    ) -> Result<TestCase> {
        let id = Uuid::new_v4();
        let steps = serde_json::to_string(&input.steps)
            .map_err(|e| AppError::Internal(e.into()))?;

        sqlx::query(
            r#"
            INSERT INTO test_cases (id, suite_id, project_id, title, steps, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(suite_id.to_string())
        .bind(project_id.to_string())
        .bind(&input.title)
        .bind(steps)
        .bind(input.priority)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create test case")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestCase>> {
        let case = sqlx::query_as::<_, TestCase>(&format!(
            "SELECT {} FROM test_cases WHERE id = ?",
            CASE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(case)
    }

    async fn list_by_suite(
        &self,
        suite_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestCase>> {
        let cases = sqlx::query_as::<_, TestCase>(&format!(
            "SELECT {} FROM test_cases WHERE suite_id = ? \
             ORDER BY created_at ASC LIMIT ? OFFSET ?",
            CASE_COLUMNS
        ))
        .bind(suite_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(cases)
    }

    async fn count_by_suite(&self, suite_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM test_cases WHERE suite_id = ?")
                .bind(suite_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn list_ids_by_project(&self, project_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM test_cases WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        ids.into_iter()
            .map(|(id,)| {
                Uuid::parse_str(&id).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
            })
            .collect()
    }

    async fn update(&self, id: Uuid, input: &UpdateTestCaseInput) -> Result<TestCase> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test case {} not found", id)))?;

        let title = input.title.as_ref().unwrap_or(&existing.title);
        let steps = match &input.steps {
            Some(steps) => {
                serde_json::to_string(steps).map_err(|e| AppError::Internal(e.into()))?
            }
            None => serde_json::to_string(&existing.steps.0)
                .map_err(|e| AppError::Internal(e.into()))?,
        };
        let priority = input.priority.unwrap_or(existing.priority);

        sqlx::query(
            "UPDATE test_cases SET title = ?, steps = ?, priority = ?, updated_at = NOW() \
             WHERE id = ?",
        )
        .bind(title)
        .bind(steps)
        .bind(priority)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update test case")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM test_cases WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Test case {} not found", id)));
        }

        Ok(())
    }
}
