//! Test run API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateTestRunInput, UpdateRunItemInput, UpdateTestRunInput};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::policy::{self, Permission};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Create a test run in a project
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateTestRunInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::TestRunManage,
    )
    .await?;

    let run = state
        .test_run_service
        .create(project_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(run))))
}

/// List a project's test runs
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let project = state
        .project_service
        .get_scoped(project_id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*project.id),
        Permission::TestRunRead,
    )
    .await?;

    let (runs, total) = state
        .test_run_service
        .list(project_id, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(
        runs,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get test run by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunRead,
    )
    .await?;

    Ok(Json(SuccessResponse::new(run)))
}

/// Rename a test run
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTestRunInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunManage,
    )
    .await?;

    let run = state
        .test_run_service
        .update(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(run)))
}

/// Close a test run
pub async fn close(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunManage,
    )
    .await?;

    let run = state
        .test_run_service
        .close(id, auth.active_organization_id)
        .await?;
    Ok(Json(SuccessResponse::new(run)))
}

/// Delete a test run
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunDelete,
    )
    .await?;

    state
        .test_run_service
        .delete(id, auth.active_organization_id)
        .await?;
    Ok(Json(MessageResponse::new("Test run deleted successfully")))
}

/// List the run's items
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunRead,
    )
    .await?;

    let items = state.test_run_service.list_items(id).await?;
    Ok(Json(SuccessResponse::new(items)))
}

/// Record an execution result on a run item
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRunItemInput>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let (_, run) = state
        .test_run_service
        .get_item_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunItemUpdate,
    )
    .await?;

    let item = state
        .test_run_service
        .update_item(id, auth.active_organization_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(item)))
}

/// Current aggregated metrics of a run
pub async fn metrics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunRead,
    )
    .await?;

    let metrics = state.test_run_service.metrics(id).await?;
    Ok(Json(SuccessResponse::new(metrics)))
}

/// Recompute and persist the run's metrics snapshot
pub async fn refresh_metrics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let ctx = policy::authorize(&state, &auth, None).await?;
    let run = state
        .test_run_service
        .get_scoped(id, auth.active_organization_id)
        .await?;

    policy::require(
        &state,
        &ctx.for_project(*run.project_id),
        Permission::TestRunMetricsUpdate,
    )
    .await?;

    let metrics = state.test_run_service.refresh_metrics(id).await?;
    Ok(Json(SuccessResponse::new(metrics)))
}
