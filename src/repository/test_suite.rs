//! Test suite repository

use crate::domain::{CreateTestSuiteInput, TestSuite, UpdateTestSuiteInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestSuiteRepository: Send + Sync {
    async fn create(&self, project_id: Uuid, input: &CreateTestSuiteInput) -> Result<TestSuite>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestSuite>>;
    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestSuite>>;
    async fn count_by_project(&self, project_id: Uuid) -> Result<i64>;
    async fn update(&self, id: Uuid, input: &UpdateTestSuiteInput) -> Result<TestSuite>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

const SUITE_COLUMNS: &str = "id, project_id, name, description, created_at, updated_at";

pub struct TestSuiteRepositoryImpl {
    pool: MySqlPool,
}

impl TestSuiteRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestSuiteRepository for TestSuiteRepositoryImpl {
    async fn create(&self, project_id: Uuid, input: &CreateTestSuiteInput) -> Result<TestSuite> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO test_suites (id, project_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(&input.name)
        .bind(&input.description)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create test suite")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestSuite>> {
        let suite = sqlx::query_as::<_, TestSuite>(&format!(
            "SELECT {} FROM test_suites WHERE id = ?",
            SUITE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(suite)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestSuite>> {
        let suites = sqlx::query_as::<_, TestSuite>(&format!(
            "SELECT {} FROM test_suites WHERE project_id = ? \
             ORDER BY created_at ASC LIMIT ? OFFSET ?",
            SUITE_COLUMNS
        ))
        .bind(project_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(suites)
    }

    async fn count_by_project(&self, project_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM test_suites WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, input: &UpdateTestSuiteInput) -> Result<TestSuite> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().or(existing.description.as_ref());

        sqlx::query(
            "UPDATE test_suites SET name = ?, description = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update test suite")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Cases belonging to the suite go with it
        sqlx::query("DELETE FROM test_cases WHERE suite_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM test_suites WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Test suite {} not found", id)));
        }

        Ok(())
    }
}
