//! Test suite business logic

use crate::domain::{CreateTestSuiteInput, TestSuite, UpdateTestSuiteInput};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::{ProjectRepository, TestSuiteRepository};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TestSuiteService<T: TestSuiteRepository, P: ProjectRepository> {
    repo: Arc<T>,
    projects: Arc<P>,
}

impl<T: TestSuiteRepository, P: ProjectRepository> TestSuiteService<T, P> {
    pub fn new(repo: Arc<T>, projects: Arc<P>) -> Self {
        Self { repo, projects }
    }

    pub async fn create(&self, project_id: Uuid, input: CreateTestSuiteInput) -> Result<TestSuite> {
        input.validate()?;
        self.repo.create(project_id, &input).await
    }

    /// Load a suite by id, scoped to the active organization.
    pub async fn get_scoped(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<TestSuite> {
        let suite = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test suite not found".to_string()))?;

        let project = self
            .projects
            .find_by_id(*suite.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test suite not found".to_string()))?;

        if guards::ensure_project_in_organization(&project, active_organization_id).is_err() {
            return Err(AppError::NotFound("Test suite not found".to_string()));
        }

        Ok(suite)
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<TestSuite>, i64)> {
        let offset = (page - 1) * per_page;
        let suites = self
            .repo
            .list_by_project(project_id, offset, per_page)
            .await?;
        let total = self.repo.count_by_project(project_id).await?;
        Ok((suites, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateTestSuiteInput,
    ) -> Result<TestSuite> {
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
    use crate::repository::project::MockProjectRepository;
    use crate::repository::test_suite::MockTestSuiteRepository;

    #[tokio::test]
    async fn test_get_scoped_cross_tenant_is_not_found() {
        let mut suites = MockTestSuiteRepository::new();
        suites.expect_find_by_id().returning(|id| {
            Ok(Some(TestSuite {
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

        let service = TestSuiteService::new(Arc::new(suites), Arc::new(projects));
        let result = service
            .get_scoped(Uuid::new_v4(), Some(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
