//! Test plan repository

use crate::domain::{CreateTestPlanInput, PlanStatus, TestPlan, UpdateTestPlanInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestPlanRepository: Send + Sync {
    async fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: &CreateTestPlanInput,
    ) -> Result<TestPlan>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestPlan>>;
    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestPlan>>;
    async fn count_by_project(&self, project_id: Uuid) -> Result<i64>;
    async fn update(&self, id: Uuid, input: &UpdateTestPlanInput) -> Result<TestPlan>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

const PLAN_COLUMNS: &str =
    "id, project_id, name, description, status, created_by, created_at, updated_at";

pub struct TestPlanRepositoryImpl {
    pool: MySqlPool,
}

impl TestPlanRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestPlanRepository for TestPlanRepositoryImpl {
    async fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: &CreateTestPlanInput,
    ) -> Result<TestPlan> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO test_plans (id, project_id, name, description, status, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(&input.name)
        .bind(&input.description)
        .bind(PlanStatus::Draft)
        .bind(created_by.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create test plan")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestPlan>> {
        let plan = sqlx::query_as::<_, TestPlan>(&format!(
            "SELECT {} FROM test_plans WHERE id = ?",
            PLAN_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestPlan>> {
        let plans = sqlx::query_as::<_, TestPlan>(&format!(
            "SELECT {} FROM test_plans WHERE project_id = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            PLAN_COLUMNS
        ))
        .bind(project_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    async fn count_by_project(&self, project_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM test_plans WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, input: &UpdateTestPlanInput) -> Result<TestPlan> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test plan {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().or(existing.description.as_ref());
        let status = input.status.unwrap_or(existing.status);

        sqlx::query(
            "UPDATE test_plans SET name = ?, description = ?, status = ?, updated_at = NOW() \
             WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(status)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update test plan")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM test_plans WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Test plan {} not found", id)));
        }

        Ok(())
    }
}
