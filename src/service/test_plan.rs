//! Test plan business logic

use crate::domain::{CreateTestPlanInput, TestPlan, UpdateTestPlanInput};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::{ProjectRepository, TestPlanRepository};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TestPlanService<T: TestPlanRepository, P: ProjectRepository> {
    repo: Arc<T>,
    projects: Arc<P>,
}

impl<T: TestPlanRepository, P: ProjectRepository> TestPlanService<T, P> {
    pub fn new(repo: Arc<T>, projects: Arc<P>) -> Self {
        Self { repo, projects }
    }

    pub async fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: CreateTestPlanInput,
    ) -> Result<TestPlan> {
        input.validate()?;
        self.repo.create(project_id, created_by, &input).await
    }

    /// Load a plan by id, scoped to the active organization. Plans of other
    /// tenants read as not found.
    pub async fn get_scoped(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<TestPlan> {
        let plan = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test plan not found".to_string()))?;

        let project = self
            .projects
            .find_by_id(*plan.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test plan not found".to_string()))?;

        if guards::ensure_project_in_organization(&project, active_organization_id).is_err() {
            return Err(AppError::NotFound("Test plan not found".to_string()));
        }

        Ok(plan)
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<TestPlan>, i64)> {
        let offset = (page - 1) * per_page;
        let plans = self.repo.list_by_project(project_id, offset, per_page).await?;
        let total = self.repo.count_by_project(project_id).await?;
        Ok((plans, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateTestPlanInput,
    ) -> Result<TestPlan> {
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
    use crate::repository::test_plan::MockTestPlanRepository;

    #[tokio::test]
    async fn test_get_scoped_cross_tenant_is_not_found() {
        let mut plans = MockTestPlanRepository::new();
        plans.expect_find_by_id().returning(|id| {
            Ok(Some(TestPlan {
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

        let service = TestPlanService::new(Arc::new(plans), Arc::new(projects));
        let result = service
            .get_scoped(Uuid::new_v4(), Some(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_scoped_same_tenant_passes() {
        let org = Uuid::new_v4();
        let mut plans = MockTestPlanRepository::new();
        plans.expect_find_by_id().returning(|id| {
            Ok(Some(TestPlan {
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

        let service = TestPlanService::new(Arc::new(plans), Arc::new(projects));
        assert!(service.get_scoped(Uuid::new_v4(), Some(org)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let plans = MockTestPlanRepository::new();
        let projects = MockProjectRepository::new();
        let service = TestPlanService::new(Arc::new(plans), Arc::new(projects));

        let result = service
            .create(
                Uuid::new_v4(),
                Uuid::new_v4(),
                CreateTestPlanInput {
                    name: "".to_string(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
