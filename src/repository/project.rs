//! Project repository

use crate::domain::{
    CreateProjectInput, Project, ProjectMember, ProjectRole, UpdateProjectInput,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, organization_id: Uuid, input: &CreateProjectInput) -> Result<Project>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>>;
    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<Project>>;
    async fn list_for_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Project>>;
    async fn update(&self, id: Uuid, input: &UpdateProjectInput) -> Result<Project>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    // Memberships
    async fn upsert_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember>;
    async fn find_member(&self, project_id: Uuid, user_id: Uuid)
        -> Result<Option<ProjectMember>>;
    async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>>;
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()>;
}

const PROJECT_COLUMNS: &str =
    "id, organization_id, name, slug, description, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, added_at";

pub struct ProjectRepositoryImpl {
    pool: MySqlPool,
}

impl ProjectRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn create(&self, organization_id: Uuid, input: &CreateProjectInput) -> Result<Project> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO projects (id, organization_id, name, slug, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create project")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = ?",
            PROJECT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE organization_id = ? ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn list_for_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.organization_id, p.name, p.slug, p.description, p.created_at, p.updated_at
            FROM projects p
            INNER JOIN project_members pm ON p.id = pm.project_id
            WHERE p.organization_id = ? AND pm.user_id = ?
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn update(&self, id: Uuid, input: &UpdateProjectInput) -> Result<Project> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().or(existing.description.as_ref());

        sqlx::query(
            "UPDATE projects SET name = ?, description = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update project")))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM project_members WHERE project_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        Ok(())
    }

    async fn upsert_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO project_members (id, project_id, user_id, role, added_at)
            VALUES (?, ?, ?, ?, NOW())
            ON DUPLICATE KEY UPDATE role = VALUES(role)
            "#,
        )
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(user_id.to_string())
        .bind(role)
        .execute(&self.pool)
        .await?;

        self.find_member(project_id, user_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to upsert project member")))
    }

    async fn find_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>> {
        let member = sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE project_id = ? AND user_id = ?",
            MEMBER_COLUMNS
        ))
        .bind(project_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        let members = sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE project_id = ? ORDER BY added_at ASC",
            MEMBER_COLUMNS
        ))
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
                .bind(project_id.to_string())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Project membership not found".to_string(),
            ));
        }

        Ok(())
    }
}
