//! Bug business logic

use crate::domain::{Bug, BugStatus, CreateBugInput, UpdateBugInput};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::{BugRepository, ProjectRepository};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct BugService<B: BugRepository, P: ProjectRepository> {
    repo: Arc<B>,
    projects: Arc<P>,
}

impl<B: BugRepository, P: ProjectRepository> BugService<B, P> {
    pub fn new(repo: Arc<B>, projects: Arc<P>) -> Self {
        Self { repo, projects }
    }

    pub async fn create(
        &self,
        project_id: Uuid,
        reported_by: Uuid,
        input: CreateBugInput,
    ) -> Result<Bug> {
        input.validate()?;
        self.repo.create(project_id, reported_by, &input).await
    }

    /// Load a bug by id, scoped to the active organization. Bugs of other
    /// tenants read as not found, never as forbidden.
    pub async fn get_scoped(&self, id: Uuid, active_organization_id: Option<Uuid>) -> Result<Bug> {
        let bug = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bug not found".to_string()))?;

        let project = self
            .projects
            .find_by_id(*bug.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bug not found".to_string()))?;

        if guards::ensure_project_in_organization(&project, active_organization_id).is_err() {
            return Err(AppError::NotFound("Bug not found".to_string()));
        }

        Ok(bug)
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        status: Option<BugStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Bug>, i64)> {
        let offset = (page - 1) * per_page;
        let bugs = self
            .repo
            .list_by_project(project_id, status, offset, per_page)
            .await?;
        let total = self.repo.count_by_project(project_id, status).await?;
        Ok((bugs, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateBugInput,
    ) -> Result<Bug> {
        input.validate()?;
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.update(id, &input).await
    }

    pub async fn delete(&self, id: Uuid, active_organization_id: Option<Uuid>) -> Result<()> {
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, StringUuid};
    use crate::repository::bug::MockBugRepository;
    use crate::repository::project::MockProjectRepository;

    #[tokio::test]
    async fn test_cross_tenant_bug_reads_as_not_found() {
        let mut bugs = MockBugRepository::new();
        bugs.expect_find_by_id().returning(|id| {
            Ok(Some(Bug {
                id: id.into(),
                project_id: StringUuid::new_v4(),
                ..Default::default()
            }))
        });
        let mut projects = MockProjectRepository::new();
        projects.expect_find_by_id().returning(|id| {
            Ok(Some(Project {
                id: id.into(),
                organization_id: StringUuid::new_v4(),
                ..Default::default()
            }))
        });

        let service = BugService::new(Arc::new(bugs), Arc::new(projects));
        let result = service
            .get_scoped(Uuid::new_v4(), Some(Uuid::new_v4()))
            .await;

        // Not Forbidden: existence must not leak across tenants.
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_same_tenant_bug_is_returned() {
        let org = Uuid::new_v4();
        let mut bugs = MockBugRepository::new();
        bugs.expect_find_by_id().returning(|id| {
            Ok(Some(Bug {
                id: id.into(),
                project_id: StringUuid::new_v4(),
                ..Default::default()
            }))
        });
        let mut projects = MockProjectRepository::new();
        projects.expect_find_by_id().returning(move |id| {
            Ok(Some(Project {
                id: id.into(),
                organization_id: org.into(),
                ..Default::default()
            }))
        });

        let service = BugService::new(Arc::new(bugs), Arc::new(projects));
        assert!(service.get_scoped(Uuid::new_v4(), Some(org)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_validates_title() {
        let service = BugService::new(
            Arc::new(MockBugRepository::new()),
            Arc::new(MockProjectRepository::new()),
        );

        let result = service
            .create(
                Uuid::new_v4(),
                Uuid::new_v4(),
                CreateBugInput {
                    title: "".to_string(),
                    description: None,
                    severity: Default::default(),
                    run_item_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
