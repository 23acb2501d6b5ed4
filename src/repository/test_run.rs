//! Test run repository

use crate::domain::{
    RunItemStatus, RunMetrics, RunStatus, TestRun, TestRunItem, UpdateRunItemInput,
    UpdateTestRunInput,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestRunRepository: Send + Sync {
    /// Create a run and seed one untested item per case, in one transaction.
    async fn create(
        &self,
        project_id: Uuid,
        plan_id: Option<Uuid>,
        name: &str,
        created_by: Uuid,
        case_ids: &[Uuid],
    ) -> Result<TestRun>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestRun>>;
    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestRun>>;
    async fn count_by_project(&self, project_id: Uuid) -> Result<i64>;
    async fn update(&self, id: Uuid, input: &UpdateTestRunInput) -> Result<TestRun>;
    async fn set_status(&self, id: Uuid, status: RunStatus) -> Result<TestRun>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    // Run items
    async fn find_item_by_id(&self, id: Uuid) -> Result<Option<TestRunItem>>;
    async fn list_items(&self, run_id: Uuid) -> Result<Vec<TestRunItem>>;
    async fn update_item(&self, id: Uuid, input: &UpdateRunItemInput) -> Result<TestRunItem>;

    // Metrics
    async fn compute_metrics(&self, run_id: Uuid) -> Result<RunMetrics>;
    async fn store_metrics(&self, run_id: Uuid, metrics: &RunMetrics) -> Result<()>;
}

const RUN_COLUMNS: &str =
    "id, project_id, plan_id, name, status, created_by, created_at, completed_at";
const ITEM_COLUMNS: &str = "id, run_id, case_id, status, assignee_id, notes, updated_at";

pub struct TestRunRepositoryImpl {
    pool: MySqlPool,
}

impl TestRunRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestRunRepository for TestRunRepositoryImpl {
    async fn create(
        &self,
        project_id: Uuid,
        plan_id: Option<Uuid>,
        name: &str,
        created_by: Uuid,
        case_ids: &[Uuid],
    ) -> Result<TestRun> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO test_runs (id, project_id, plan_id, name, status, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(plan_id.map(|p| p.to_string()))
        .bind(name)
        .bind(RunStatus::Pending)
        .bind(created_by.to_string())
        .execute(&mut *tx)
        .await?;

        for case_id in case_ids {
            sqlx::query(
                r#"
                INSERT INTO test_run_items (id, run_id, case_id, status, updated_at)
                VALUES (?, ?, ?, ?, NOW())
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id.to_string())
            .bind(case_id.to_string())
            .bind(RunItemStatus::Untested)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create test run")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TestRun>> {
        let run = sqlx::query_as::<_, TestRun>(&format!(
            "SELECT {} FROM test_runs WHERE id = ?",
            RUN_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(run)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TestRun>> {
        let runs = sqlx::query_as::<_, TestRun>(&format!(
            "SELECT {} FROM test_runs WHERE project_id = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            RUN_COLUMNS
        ))
        .bind(project_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(runs)
    }

    async fn count_by_project(&self, project_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM test_runs WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, input: &UpdateTestRunInput) -> Result<TestRun> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test run {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);

        sqlx::query("UPDATE test_runs SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update test run")))
    }

    async fn set_status(&self, id: Uuid, status: RunStatus) -> Result<TestRun> {
        let completed = status == RunStatus::Completed;
        sqlx::query(
            "UPDATE test_runs SET status = ?, \
             completed_at = IF(?, NOW(), completed_at) WHERE id = ?",
        )
        .bind(status)
        .bind(completed)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test run {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM test_run_items WHERE run_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM test_runs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Test run {} not found", id)));
        }

        Ok(())
    }

    async fn find_item_by_id(&self, id: Uuid) -> Result<Option<TestRunItem>> {
        let item = sqlx::query_as::<_, TestRunItem>(&format!(
            "SELECT {} FROM test_run_items WHERE id = ?",
            ITEM_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list_items(&self, run_id: Uuid) -> Result<Vec<TestRunItem>> {
        let items = sqlx::query_as::<_, TestRunItem>(&format!(
            "SELECT {} FROM test_run_items WHERE run_id = ? ORDER BY updated_at ASC",
            ITEM_COLUMNS
        ))
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn update_item(&self, id: Uuid, input: &UpdateRunItemInput) -> Result<TestRunItem> {
        let existing = self
            .find_item_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Run item {} not found", id)))?;

        let status = input.status.unwrap_or(existing.status);
        let assignee_id = input
            .assignee_id
            .map(|a| a.to_string())
            .or_else(|| existing.assignee_id.map(|a| a.to_string()));
        let notes = input.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query(
            "UPDATE test_run_items SET status = ?, assignee_id = ?, notes = ?, \
             updated_at = NOW() WHERE id = ?",
        )
        .bind(status)
        .bind(assignee_id)
        .bind(notes)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_item_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update run item")))
    }

    async fn compute_metrics(&self, run_id: Uuid) -> Result<RunMetrics> {
        let metrics = sqlx::query_as::<_, RunMetrics>(
            r#"
            SELECT
                COUNT(*) AS total,
                CAST(COALESCE(SUM(status = 'passed'), 0) AS SIGNED)   AS passed,
                CAST(COALESCE(SUM(status = 'failed'), 0) AS SIGNED)   AS failed,
                CAST(COALESCE(SUM(status = 'blocked'), 0) AS SIGNED)  AS blocked,
                CAST(COALESCE(SUM(status = 'skipped'), 0) AS SIGNED)  AS skipped,
                CAST(COALESCE(SUM(status = 'untested'), 0) AS SIGNED) AS untested
            FROM test_run_items
            WHERE run_id = ?
            "#,
        )
        .bind(run_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(metrics)
    }

    async fn store_metrics(&self, run_id: Uuid, metrics: &RunMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO test_run_metrics (run_id, total, passed, failed, blocked, skipped, untested, refreshed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW())
            ON DUPLICATE KEY UPDATE
                total = VALUES(total), passed = VALUES(passed), failed = VALUES(failed),
                blocked = VALUES(blocked), skipped = VALUES(skipped),
                untested = VALUES(untested), refreshed_at = NOW()
            "#,
        )
        .bind(run_id.to_string())
        .bind(metrics.total)
        .bind(metrics.passed)
        .bind(metrics.failed)
        .bind(metrics.blocked)
        .bind(metrics.skipped)
        .bind(metrics.untested)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
