//! Bug repository

use crate::domain::{Bug, BugStatus, CreateBugInput, UpdateBugInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BugRepository: Send + Sync {
    async fn create(
        &self,
        project_id: Uuid,
        reported_by: Uuid,
        input: &CreateBugInput,
    ) -> Result<Bug>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bug>>;
    async fn list_by_project(
        &self,
        project_id: Uuid,
        status: Option<BugStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Bug>>;
    async fn count_by_project(&self, project_id: Uuid, status: Option<BugStatus>) -> Result<i64>;
    async fn update(&self, id: Uuid, input: &UpdateBugInput) -> Result<Bug>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

const BUG_COLUMNS: &str = "id, project_id, run_item_id, title, description, severity, status, \
                           reported_by, created_at, updated_at";

pub struct BugRepositoryImpl {
    pool: MySqlPool,
}

impl BugRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BugRepository for BugRepositoryImpl {
    async fn create(
        &self,
        project_id: Uuid,
        reported_by: Uuid,
        input: &CreateBugInput,
    ) -> Result<Bug> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO bugs (id, project_id, run_item_id, title, description, severity, status, reported_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(input.run_item_id.map(|r| r.to_string()))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.severity)
        .bind(BugStatus::Open)
        .bind(reported_by.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create bug")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bug>> {
        let bug = sqlx::query_as::<_, Bug>(&format!(
            "SELECT {} FROM bugs WHERE id = ?",
            BUG_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(bug)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        status: Option<BugStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Bug>> {
        let mut sql = format!(
            "SELECT {} FROM bugs WHERE project_id = ?",
            BUG_COLUMNS
        );
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Bug>(&sql).bind(project_id.to_string());
        if let Some(status) = status {
            query = query.bind(status);
        }

        let bugs = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok(bugs)
    }

    async fn count_by_project(&self, project_id: Uuid, status: Option<BugStatus>) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM bugs WHERE project_id = ?");
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }

        let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(project_id.to_string());
        if let Some(status) = status {
            query = query.bind(status);
        }

        let (count,) = query.fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, input: &UpdateBugInput) -> Result<Bug> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bug {} not found", id)))?;

        let title = input.title.as_ref().unwrap_or(&existing.title);
        let description = input.description.as_ref().or(existing.description.as_ref());
        let severity = input.severity.unwrap_or(existing.severity);
        let status = input.status.unwrap_or(existing.status);

        sqlx::query(
            "UPDATE bugs SET title = ?, description = ?, severity = ?, status = ?, \
             updated_at = NOW() WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(severity)
        .bind(status)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update bug")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM bugs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Bug {} not found", id)));
        }

        Ok(())
    }
}
