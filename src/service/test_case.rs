//! Test case business logic

use crate::domain::{CreateTestCaseInput, TestCase, UpdateTestCaseInput};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::{ProjectRepository, TestCaseRepository, TestSuiteRepository};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TestCaseService<C, S, P>
where
    C: TestCaseRepository,
    S: TestSuiteRepository,
    P: ProjectRepository,
{
    repo: Arc<C>,
    suites: Arc<S>,
    projects: Arc<P>,
}

impl<C, S, P> TestCaseService<C, S, P>
where
    C: TestCaseRepository,
    S: TestSuiteRepository,
    P: ProjectRepository,
{
    pub fn new(repo: Arc<C>, suites: Arc<S>, projects: Arc<P>) -> Self {
        Self {
            repo,
            suites,
            projects,
        }
    }

    /// Create a case in a suite; the case inherits the suite's project.
    pub async fn create(&self, suite_id: Uuid, input: CreateTestCaseInput) -> Result<TestCase> {
        input.validate()?;

        let suite = self
            .suites
            .find_by_id(suite_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test suite not found".to_string()))?;

        self.repo.create(suite_id, *suite.project_id, &input).await
    }

    /// Load a case by id, scoped to the active organization.
    pub async fn get_scoped(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<TestCase> {
        let case = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test case not found".to_string()))?;

        let project = self
            .projects
            .find_by_id(*case.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test case not found".to_string()))?;

        if guards::ensure_project_in_organization(&project, active_organization_id).is_err() {
            return Err(AppError::NotFound("Test case not found".to_string()));
        }

        Ok(case)
    }

    pub async fn list(
        &self,
        suite_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<TestCase>, i64)> {
        let offset = (page - 1) * per_page;
        let cases = self.repo.list_by_suite(suite_id, offset, per_page).await?;
        let total = self.repo.count_by_suite(suite_id).await?;
        Ok((cases, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateTestCaseInput,
    ) -> Result<TestCase> {
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
    use crate::domain::{StringUuid, TestSuite};
    use crate::repository::project::MockProjectRepository;
    use crate::repository::test_case::MockTestCaseRepository;
    use crate::repository::test_suite::MockTestSuiteRepository;

    #[tokio::test]
    async fn test_create_inherits_suite_project() {
        let project_id = StringUuid::new_v4();
        let mut suites = MockTestSuiteRepository::new();
        suites.expect_find_by_id().returning(move |id| {
            Ok(Some(TestSuite {
                id: id.into(),
                project_id,
                ..Default::default()
            }))
        });
        let mut cases = MockTestCaseRepository::new();
        cases
            .expect_create()
            .withf(move |_, project, _| *project == *project_id)
            .returning(|suite, project, input| {
                Ok(TestCase {
                    suite_id: suite.into(),
                    project_id: project.into(),
                    title: input.title.clone(),
                    ..Default::default()
                })
            });

        let service = TestCaseService::new(
            Arc::new(cases),
            Arc::new(suites),
            Arc::new(MockProjectRepository::new()),
        );

        let result = service
            .create(
                Uuid::new_v4(),
                CreateTestCaseInput {
                    title: "Login succeeds".to_string(),
                    steps: vec![],
                    priority: Default::default(),
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_unknown_suite_is_not_found() {
        let mut suites = MockTestSuiteRepository::new();
        suites.expect_find_by_id().returning(|_| Ok(None));

        let service = TestCaseService::new(
            Arc::new(MockTestCaseRepository::new()),
            Arc::new(suites),
            Arc::new(MockProjectRepository::new()),
        );

        let result = service
            .create(
                Uuid::new_v4(),
                CreateTestCaseInput {
                    title: "Login succeeds".to_string(),
                    steps: vec![],
                    priority: Default::default(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
