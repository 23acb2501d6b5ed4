//! Test run business logic

use crate::domain::{
    CreateTestRunInput, RunMetrics, RunStatus, TestRun, TestRunItem, UpdateRunItemInput,
    UpdateTestRunInput,
};
use crate::error::{AppError, Result};
use crate::policy::guards;
use crate::repository::{ProjectRepository, TestCaseRepository, TestRunRepository};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TestRunService<R, C, P>
where
    R: TestRunRepository,
    C: TestCaseRepository,
    P: ProjectRepository,
{
    repo: Arc<R>,
    cases: Arc<C>,
    projects: Arc<P>,
}

impl<R, C, P> TestRunService<R, C, P>
where
    R: TestRunRepository,
    C: TestCaseRepository,
    P: ProjectRepository,
{
    pub fn new(repo: Arc<R>, cases: Arc<C>, projects: Arc<P>) -> Self {
        Self {
            repo,
            cases,
            projects,
        }
    }

    /// Create a run, seeding items from the case selection. An empty
    /// selection means every case in the project.
    pub async fn create(
        &self,
        project_id: Uuid,
        created_by: Uuid,
        input: CreateTestRunInput,
    ) -> Result<TestRun> {
        input.validate()?;

        let case_ids = if input.case_ids.is_empty() {
            self.cases.list_ids_by_project(project_id).await?
        } else {
            input.case_ids.clone()
        };

        self.repo
            .create(project_id, input.plan_id, &input.name, created_by, &case_ids)
            .await
    }

    /// Load a run by id, scoped to the active organization.
    pub async fn get_scoped(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<TestRun> {
        let run = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test run not found".to_string()))?;

        let project = self
            .projects
            .find_by_id(*run.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Test run not found".to_string()))?;

        if guards::ensure_project_in_organization(&project, active_organization_id).is_err() {
            return Err(AppError::NotFound("Test run not found".to_string()));
        }

        Ok(run)
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<TestRun>, i64)> {
        let offset = (page - 1) * per_page;
        let runs = self.repo.list_by_project(project_id, offset, per_page).await?;
        let total = self.repo.count_by_project(project_id).await?;
        Ok((runs, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateTestRunInput,
    ) -> Result<TestRun> {
        input.validate()?;
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.update(id, &input).await
    }

    /// Close a run. Closing twice is rejected.
    pub async fn close(&self, id: Uuid, active_organization_id: Option<Uuid>) -> Result<TestRun> {
        let run = self.get_scoped(id, active_organization_id).await?;

        if run.status == RunStatus::Completed {
            return Err(AppError::Conflict("Test run is already closed".to_string()));
        }

        self.repo.set_status(id, RunStatus::Completed).await
    }

    pub async fn delete(&self, id: Uuid, active_organization_id: Option<Uuid>) -> Result<()> {
        let _ = self.get_scoped(id, active_organization_id).await?;
        self.repo.delete(id).await
    }

    // ==================== Run items ====================

    pub async fn list_items(&self, run_id: Uuid) -> Result<Vec<TestRunItem>> {
        self.repo.list_items(run_id).await
    }

    /// Load a run item with its run, scoped to the active organization. The
    /// run carries the project id the permission check needs.
    pub async fn get_item_scoped(
        &self,
        item_id: Uuid,
        active_organization_id: Option<Uuid>,
    ) -> Result<(TestRunItem, TestRun)> {
        let item = self
            .repo
            .find_item_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Run item not found".to_string()))?;

        let run = self
            .get_scoped(*item.run_id, active_organization_id)
            .await
            .map_err(|_| AppError::NotFound("Run item not found".to_string()))?;

        Ok((item, run))
    }

    /// Record an execution result. Items of a closed run are frozen.
    pub async fn update_item(
        &self,
        item_id: Uuid,
        active_organization_id: Option<Uuid>,
        input: UpdateRunItemInput,
    ) -> Result<TestRunItem> {
        input.validate()?;

        let (_, run) = self.get_item_scoped(item_id, active_organization_id).await?;
        if run.status == RunStatus::Completed {
            return Err(AppError::Conflict(
                "Cannot update items of a closed run".to_string(),
            ));
        }

        // First result moves the run out of pending.
        if run.status == RunStatus::Pending {
            self.repo.set_status(*run.id, RunStatus::InProgress).await?;
        }

        self.repo.update_item(item_id, &input).await
    }

    // ==================== Metrics ====================

    pub async fn metrics(&self, run_id: Uuid) -> Result<RunMetrics> {
        self.repo.compute_metrics(run_id).await
    }

    /// Recompute and persist the run's metrics snapshot.
    pub async fn refresh_metrics(&self, run_id: Uuid) -> Result<RunMetrics> {
        let metrics = self.repo.compute_metrics(run_id).await?;
        self.repo.store_metrics(run_id, &metrics).await?;
        Ok(metrics)
    }
}
