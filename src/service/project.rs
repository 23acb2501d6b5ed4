//! Project business logic

use crate::domain::{
    CreateProjectInput, Project, ProjectMember, ProjectRole, UpdateProjectInput,
};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::ProjectRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct ProjectService<P: ProjectRepository> {
    repo: Arc<P>,
}

impl<P: ProjectRepository> ProjectService<P> {
    pub fn new(repo: Arc<P>) -> Self {
        Self { repo }
    }

    /// Create a project; the creator becomes its first project admin.
    pub async fn create(
        &self,
        organization_id: Uuid,
        creator_id: Uuid,
        input: CreateProjectInput,
    ) -> Result<Project> {
        input.validate()?;

        let project = self.repo.create(organization_id, &input).await?;
        self.repo
            .upsert_member(*project.id, creator_id, ProjectRole::Admin)
            .await?;

        Ok(project)
    }

    /// Load a project by id, scoped to the active organization. A project in
    /// another organization reads as not found.
    pub async fn get_scoped(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<Project> {
        let project = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        guards::ensure_project_in_organization(&project, active_organization_id)?;

        Ok(project)
    }

    pub async fn list_all_in_organization(&self, organization_id: Uuid) -> Result<Vec<Project>> {
        self.repo.list_by_organization(organization_id).await
    }

    pub async fn list_for_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Project>> {
        self.repo.list_for_member(organization_id, user_id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateProjectInput,
    ) -> Result<Project> {
        input.validate()?;
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.update(id, &input).await
    }

    pub async fn delete(&self, id: Uuid, active_organization_id: Option<Uuid>) -> Result<()> {
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.delete(id).await
    }

    // ==================== Memberships ====================

    pub async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        self.repo.list_members(project_id).await
    }

    pub async fn upsert_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember> {
        self.repo.upsert_member(project_id, user_id, role).await
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        self.repo.remove_member(project_id, user_id).await
    }
}
